//! Format detection and parser dispatch.
//!
//! The dispatcher maps a file name (and, when available, its leading bytes)
//! to one [`FileType`]. Unknown extensions fail closed with
//! [`Error::UnsupportedFormat`].

use crate::error::{Error, Result};
use crate::model::FileType;
use std::io::Cursor;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
/// Readers accept a PDF header anywhere in the first kilobyte.
const PDF_HEADER_WINDOW: usize = 1024;
/// ZIP local file header: PK\x03\x04 (empty archives start with PK\x05\x06)
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
/// OLE2 compound file binary (legacy Office, encrypted OOXML)
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Physical container family of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// PDF file
    Pdf,
    /// ZIP package (Office Open XML)
    Zip,
    /// Compound file binary (legacy .doc/.xls/.ppt or an encrypted package)
    Cfb,
    /// Unrecognized signature
    Unknown,
}

impl Container {
    /// Whether this container can hold the given file type.
    pub fn can_hold(&self, file_type: FileType) -> bool {
        match file_type {
            FileType::Pdf => *self == Container::Pdf,
            FileType::Word | FileType::Excel | FileType::PowerPoint => {
                matches!(self, Container::Zip | Container::Cfb)
            }
        }
    }
}

/// Identify the container family from the leading bytes of a file.
pub fn detect_container(data: &[u8]) -> Container {
    if data.starts_with(CFB_MAGIC) {
        return Container::Cfb;
    }
    if data.starts_with(ZIP_MAGIC) || data.starts_with(ZIP_EMPTY_MAGIC) {
        return Container::Zip;
    }
    let window = &data[..data.len().min(PDF_HEADER_WINDOW)];
    if window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Container::Pdf;
    }
    Container::Unknown
}

/// Lowercased extension of a file name, without the dot.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Select the parser variant for a file.
///
/// # Arguments
/// * `filename` - File name with extension
/// * `signature` - Optional leading bytes of the file
///
/// # Returns
/// * `Ok(FileType)` for a supported extension whose signature (if given) agrees
/// * `Err(Error::UnsupportedFormat)` otherwise
///
/// # Example
/// ```
/// use unfile::detect::dispatch;
/// use unfile::FileType;
///
/// assert_eq!(dispatch("Budget.XLSX", None).unwrap(), FileType::Excel);
/// assert!(dispatch("notes.txt", None).is_err());
/// ```
pub fn dispatch(filename: &str, signature: Option<&[u8]>) -> Result<FileType> {
    let ext = extension_of(filename).ok_or_else(|| {
        Error::UnsupportedFormat(format!(
            "no file extension (supported: {})",
            supported_extensions().join(", ")
        ))
    })?;

    let file_type = FileType::from_extension(&ext).ok_or_else(|| {
        Error::UnsupportedFormat(format!(
            ".{} (supported: {})",
            ext,
            supported_extensions().join(", ")
        ))
    })?;

    if let Some(sig) = signature {
        let container = detect_container(sig);
        if !container.can_hold(file_type) {
            return Err(Error::UnsupportedFormat(format!(
                "content of .{} file does not match its extension ({:?} signature)",
                ext, container
            )));
        }
    }

    Ok(file_type)
}

/// Detect the file type from content alone.
///
/// PDFs are recognized by their header and OOXML packages by their main part.
/// Legacy compound files cannot be told apart without an extension.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FileType> {
    match detect_container(data) {
        Container::Pdf => Ok(FileType::Pdf),
        Container::Zip => {
            let archive = zip::ZipArchive::new(Cursor::new(data))
                .map_err(|e| Error::UnsupportedFormat(format!("unreadable ZIP package: {}", e)))?;
            let has = |name: &str| archive.index_for_name(name).is_some();
            if has("word/document.xml") {
                Ok(FileType::Word)
            } else if has("xl/workbook.xml") {
                Ok(FileType::Excel)
            } else if has("ppt/presentation.xml") {
                Ok(FileType::PowerPoint)
            } else {
                Err(Error::UnsupportedFormat(
                    "ZIP package is not an Office document".to_string(),
                ))
            }
        }
        Container::Cfb => Err(Error::UnsupportedFormat(
            "compound file type cannot be determined without an extension".to_string(),
        )),
        Container::Unknown => Err(Error::UnsupportedFormat(
            "unrecognized file signature".to_string(),
        )),
    }
}

/// Every accepted file extension, in dispatch-table order.
pub fn supported_extensions() -> Vec<&'static str> {
    FileType::ALL
        .iter()
        .flat_map(|ft| ft.extensions().iter().copied())
        .collect()
}

/// Check whether a file name has a supported extension.
pub fn is_supported(filename: &str) -> bool {
    dispatch(filename, None).is_ok()
}
