//! Error types for the unfile library.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for unfile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while validating, parsing, or rendering a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file extension or signature is not one of the supported formats.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file exceeds the configured size ceiling.
    #[error("File size {size} bytes exceeds the limit of {limit} bytes")]
    SizeExceeded {
        /// Actual size in bytes
        size: u64,
        /// Configured ceiling in bytes
        limit: u64,
    },

    /// The file has no content.
    #[error("File is empty")]
    EmptyFile,

    /// The document is encrypted and requires a password.
    #[error("Document is password protected")]
    PasswordProtected,

    /// The extraction library could not open the document structure.
    #[error("Corrupt file: {0}")]
    CorruptFile(String),

    /// Any other failure reported by an extraction library.
    #[error("Extraction failed: {0}")]
    DependencyFailure(String),

    /// The requested output format is not one of JSON, Markdown, CSV, or text.
    #[error("Unsupported output format: {0}")]
    UnsupportedOutputFormat(String),

    /// An image reference does not resolve to an image in the source file.
    #[error("Image {image_index} of unit {unit_index} not found")]
    ImageNotFound {
        /// Owning content unit
        unit_index: u32,
        /// Position within the unit
        image_index: u32,
    },

    /// Error during rendering (JSON serialization).
    #[error("Rendering error: {0}")]
    Render(String),

    /// A terminal error attributed to a specific file.
    #[error("{filename}: {source}")]
    InFile {
        /// File name as provided by the caller
        filename: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },
}

/// Error categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    UnsupportedFormat,
    SizeExceeded,
    EmptyFile,
    PasswordProtected,
    CorruptFile,
    DependencyFailure,
    UnsupportedOutputFormat,
    /// Per-image failure of the vision service; never terminal.
    VisionServiceFailure,
    Render,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Io => "IoError",
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::SizeExceeded => "SizeExceeded",
            ErrorKind::EmptyFile => "EmptyFile",
            ErrorKind::PasswordProtected => "PasswordProtected",
            ErrorKind::CorruptFile => "CorruptFile",
            ErrorKind::DependencyFailure => "DependencyFailure",
            ErrorKind::UnsupportedOutputFormat => "UnsupportedOutputFormat",
            ErrorKind::VisionServiceFailure => "VisionServiceFailure",
            ErrorKind::Render => "RenderError",
        };
        f.write_str(name)
    }
}

impl Error {
    /// The category of this error, looking through file attribution.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            Error::EmptyFile => ErrorKind::EmptyFile,
            Error::PasswordProtected => ErrorKind::PasswordProtected,
            Error::CorruptFile(_) => ErrorKind::CorruptFile,
            Error::DependencyFailure(_) => ErrorKind::DependencyFailure,
            Error::UnsupportedOutputFormat(_) => ErrorKind::UnsupportedOutputFormat,
            Error::ImageNotFound { .. } => ErrorKind::VisionServiceFailure,
            Error::Render(_) => ErrorKind::Render,
            Error::InFile { source, .. } => source.kind(),
        }
    }

    /// Attach a file name to this error. Already attributed errors are returned as is.
    pub fn in_file(self, filename: impl Into<String>) -> Self {
        match self {
            Error::InFile { .. } => self,
            other => Error::InFile {
                filename: filename.into(),
                source: Box::new(other),
            },
        }
    }

    /// The file this error is attributed to, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Error::InFile { filename, .. } => Some(filename),
            _ => None,
        }
    }

    /// The underlying error without file attribution.
    pub fn cause(&self) -> &Error {
        match self {
            Error::InFile { source, .. } => source.cause(),
            other => other,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::PasswordProtected,
            _ => Error::DependencyFailure(err.to_string()),
        }
    }
}
