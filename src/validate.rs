//! Validation gate run before any parser.

use crate::detect;
use crate::error::{Error, Result};
use crate::model::FileType;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default size ceiling: 50 MB.
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Number of leading bytes read for the signature check.
const SIGNATURE_LEN: usize = 1024;

/// Limits applied by the [`Validator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    /// Maximum accepted file size in bytes
    pub max_size_bytes: u64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }
}

impl ValidationLimits {
    /// Limits with a ceiling given in megabytes.
    pub fn with_max_size_mb(mb: u64) -> Self {
        Self {
            max_size_bytes: mb.saturating_mul(1024 * 1024),
        }
    }
}

/// Rejects files by size, emptiness, extension, and signature.
///
/// Every error returned is attributed to the file name.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: ValidationLimits,
}

impl Validator {
    /// Create a validator with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom limits.
    pub fn with_limits(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Configured limits.
    pub fn limits(&self) -> ValidationLimits {
        self.limits
    }

    /// Validate a file on disk and return its dispatched type.
    pub fn validate_path<P: AsRef<Path>>(&self, path: P) -> Result<FileType> {
        let path = path.as_ref();
        let filename = display_name(path);
        self.check_path(path).map_err(|e| e.in_file(filename))
    }

    fn check_path(&self, path: &Path) -> Result<FileType> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        // Extension first: an unsupported file is never opened.
        detect::dispatch(name, None)?;

        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(Error::UnsupportedFormat("not a regular file".to_string()));
        }
        self.check_size(meta.len())?;

        let mut header = Vec::with_capacity(SIGNATURE_LEN);
        File::open(path)?
            .take(SIGNATURE_LEN as u64)
            .read_to_end(&mut header)?;
        detect::dispatch(name, Some(&header))
    }

    /// Validate an in-memory upload and return its dispatched type.
    pub fn validate_bytes(&self, filename: &str, data: &[u8]) -> Result<FileType> {
        self.check_bytes(filename, data)
            .map_err(|e| e.in_file(filename))
    }

    fn check_bytes(&self, filename: &str, data: &[u8]) -> Result<FileType> {
        detect::dispatch(filename, None)?;
        self.check_size(data.len() as u64)?;
        detect::dispatch(filename, Some(&data[..data.len().min(SIGNATURE_LEN)]))
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size == 0 {
            return Err(Error::EmptyFile);
        }
        if size > self.limits.max_size_bytes {
            return Err(Error::SizeExceeded {
                size,
                limit: self.limits.max_size_bytes,
            });
        }
        Ok(())
    }
}

/// File name used in error messages and the document model.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
