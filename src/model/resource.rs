//! Image references and the raw image payloads they resolve to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an image within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageKey {
    /// Owning content unit
    pub unit_index: u32,
    /// 1-based position within the unit
    pub image_index: u32,
}

impl ImageKey {
    pub fn new(unit_index: u32, image_index: u32) -> Self {
        Self {
            unit_index,
            image_index,
        }
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit {} image {}", self.unit_index, self.image_index)
    }
}

/// A reference to an image in the source file.
///
/// The reference holds no image data; bytes are fetched from the source
/// file when a description is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Owning content unit
    pub unit_index: u32,

    /// 1-based position within the unit
    pub image_index: u32,

    /// Natural-language description, absent until requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ImageRef {
    /// Create an undescribed image reference.
    pub fn new(unit_index: u32, image_index: u32) -> Self {
        Self {
            unit_index,
            image_index,
            description: None,
        }
    }

    /// Key of this reference.
    pub fn key(&self) -> ImageKey {
        ImageKey::new(self.unit_index, self.image_index)
    }

    /// Check whether a description is present.
    pub fn is_described(&self) -> bool {
        self.description.is_some()
    }
}

/// Raw image bytes loaded from a source file.
#[derive(Clone)]
pub struct ImageData {
    /// Raw binary data
    pub bytes: Vec<u8>,

    /// Part or object name inside the source file (e.g. "ppt/media/image1.png")
    pub name: String,

    mime_type: Option<&'static str>,
}

impl ImageData {
    /// Wrap image bytes, sniffing the MIME type from magic bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime_type = detect_mime_type(&bytes);
        Self {
            bytes,
            name: name.into(),
            mime_type,
        }
    }

    /// MIME type detected from the data, if recognized.
    pub fn mime_type(&self) -> Option<&'static str> {
        self.mime_type
    }

    /// Check whether the data is a recognized image format.
    pub fn is_image(&self) -> bool {
        self.mime_type.is_some()
    }

    /// Get the size of the data in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the part name suggests a chart rather than a picture.
    pub fn looks_like_chart(&self) -> bool {
        self.name.to_ascii_lowercase().contains("chart")
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Detect an image MIME type from magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // WEBP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return Some("image/tiff");
    }

    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    // Windows metafiles, common in Office packages
    if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
        return Some("image/wmf");
    }
    if data.starts_with(&[0x01, 0x00, 0x00, 0x00]) && data.len() >= 44 && &data[40..44] == b" EMF" {
        return Some("image/emf");
    }

    None
}
