//! Document-level types.

use super::{ImageKey, ImageRef, Table};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Document metadata: property name to value. Absent properties are omitted.
pub type Metadata = BTreeMap<String, String>;

/// Source format of a document, selected by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Portable Document Format
    Pdf,
    /// Word processing (.doc, .docx)
    Word,
    /// Spreadsheet (.xls, .xlsx)
    Excel,
    /// Presentation (.ppt, .pptx)
    PowerPoint,
}

impl FileType {
    /// Every supported file type, in dispatch-table order.
    pub const ALL: [FileType; 4] = [
        FileType::Pdf,
        FileType::Word,
        FileType::Excel,
        FileType::PowerPoint,
    ];

    /// Lowercase name used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Word => "word",
            FileType::Excel => "excel",
            FileType::PowerPoint => "powerpoint",
        }
    }

    /// File extensions handled by this type (without the dot).
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileType::Pdf => &["pdf"],
            FileType::Word => &["doc", "docx"],
            FileType::Excel => &["xls", "xlsx"],
            FileType::PowerPoint => &["ppt", "pptx"],
        }
    }

    /// Look up the file type for an extension (case-insensitive, leading dot allowed).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ft| ft.extensions().contains(&ext.as_str()))
    }

    /// Label prefix for content units of this type.
    pub fn unit_name(&self) -> &'static str {
        match self {
            FileType::Pdf => "page",
            FileType::Word => "section",
            FileType::Excel => "sheet",
            FileType::PowerPoint => "slide",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page, section, slide, or sheet of extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// 1-based position in native document order
    pub unit_index: u32,

    /// Human-readable label (e.g. "Slide 3", "Sheet: Budget")
    pub unit_label: String,

    /// Extracted text, possibly empty
    pub text: String,
}

/// A parsed document in canonical, format-agnostic form.
///
/// Documents are produced by a single parser invocation through
/// [`DocumentBuilder`]. Afterwards the only permitted change is filling in
/// image descriptions via [`Document::describe_image`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    filename: String,
    file_type: FileType,
    parsed_at: DateTime<Utc>,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    content: Vec<ContentUnit>,
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default)]
    images: Vec<ImageRef>,
}

impl Document {
    /// Source file name as provided.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Source format.
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Extraction timestamp.
    pub fn parsed_at(&self) -> DateTime<Utc> {
        self.parsed_at
    }

    /// Document properties.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Content units in native order.
    pub fn content(&self) -> &[ContentUnit] {
        &self.content
    }

    /// Tables in document order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Image references in document order.
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// Get a content unit by index (1-based).
    pub fn unit(&self, unit_index: u32) -> Option<&ContentUnit> {
        if unit_index == 0 {
            return None;
        }
        self.content
            .get((unit_index - 1) as usize)
            .filter(|u| u.unit_index == unit_index)
    }

    /// Tables belonging to a unit.
    pub fn tables_for(&self, unit_index: u32) -> impl Iterator<Item = &Table> {
        self.tables
            .iter()
            .filter(move |t| t.unit_index == unit_index)
    }

    /// Images belonging to a unit.
    pub fn images_for(&self, unit_index: u32) -> impl Iterator<Item = &ImageRef> {
        self.images
            .iter()
            .filter(move |i| i.unit_index == unit_index)
    }

    /// Look up an image reference.
    pub fn image(&self, key: ImageKey) -> Option<&ImageRef> {
        self.images.iter().find(|i| i.key() == key)
    }

    /// Images that have no description yet.
    pub fn pending_images(&self) -> Vec<ImageKey> {
        self.images
            .iter()
            .filter(|i| i.description.is_none())
            .map(ImageRef::key)
            .collect()
    }

    /// Record the description of an image.
    ///
    /// An image is described at most once: if it already carries a
    /// description, that description is kept and returned unchanged.
    pub fn describe_image(&mut self, key: ImageKey, description: impl Into<String>) -> Result<&str> {
        let image = self
            .images
            .iter_mut()
            .find(|i| i.key() == key)
            .ok_or(Error::ImageNotFound {
                unit_index: key.unit_index,
                image_index: key.image_index,
            })?;

        let stored = image.description.get_or_insert_with(|| description.into());
        Ok(stored.as_str())
    }

    /// Text of every unit in order, separated by a blank line.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|u| u.text.trim_end())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of content units.
    pub fn unit_count(&self) -> usize {
        self.content.len()
    }
}

/// Handle to a content unit pushed into a [`DocumentBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitHandle(u32);

impl UnitHandle {
    /// The unit's 1-based index.
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Accumulates the parts of a [`Document`] during a single parse.
///
/// Unit and image indices are assigned in push order, so the ordering
/// invariants of the model hold by construction.
#[derive(Debug)]
pub struct DocumentBuilder {
    filename: String,
    file_type: FileType,
    metadata: Metadata,
    content: Vec<ContentUnit>,
    tables: Vec<Table>,
    images: Vec<ImageRef>,
}

impl DocumentBuilder {
    /// Start a document for the given source file.
    pub fn new(filename: impl Into<String>, file_type: FileType) -> Self {
        Self {
            filename: filename.into(),
            file_type,
            metadata: Metadata::new(),
            content: Vec::new(),
            tables: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Source file name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Source format this builder was created for.
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Append a content unit; it receives the next unit index.
    pub fn push_unit(&mut self, label: impl Into<String>, text: impl Into<String>) -> UnitHandle {
        let unit_index = self.content.len() as u32 + 1;
        self.content.push(ContentUnit {
            unit_index,
            unit_label: label.into(),
            text: text.into(),
        });
        UnitHandle(unit_index)
    }

    /// Attach a table to a unit. Rows are stored exactly as given.
    pub fn push_table(&mut self, unit: UnitHandle, rows: Vec<Vec<String>>) {
        self.tables.push(Table::new(unit.0, rows));
    }

    /// Attach an image reference to a unit and return its image index.
    pub fn push_image(&mut self, unit: UnitHandle) -> u32 {
        let image_index = self.images_for(unit) + 1;
        self.images.push(ImageRef::new(unit.0, image_index));
        image_index
    }

    /// Set a metadata property. Blank values are skipped.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        if !value.is_empty() {
            self.metadata.insert(key.into(), value.to_string());
        }
    }

    /// Whether a metadata property has been set.
    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    /// Number of units pushed so far.
    pub fn unit_count(&self) -> usize {
        self.content.len()
    }

    /// Number of tables pushed so far.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn images_for(&self, unit: UnitHandle) -> u32 {
        self.images.iter().filter(|i| i.unit_index == unit.0).count() as u32
    }

    /// Finish the document, stamping the extraction time.
    pub fn build(self) -> Document {
        Document {
            filename: self.filename,
            file_type: self.file_type,
            parsed_at: Utc::now(),
            metadata: self.metadata,
            content: self.content,
            tables: self.tables,
            images: self.images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut b = DocumentBuilder::new("deck.pptx", FileType::PowerPoint);
        let s1 = b.push_unit("Slide 1", "Intro");
        let s2 = b.push_unit("Slide 2", "");
        b.push_table(s2, vec![vec!["a".into(), "b".into()], vec!["c".into()]]);
        b.push_image(s1);
        b.push_image(s2);
        b.push_image(s2);
        b.set_metadata("slide_count", "2");
        b.build()
    }

    #[test]
    fn test_file_type_extensions() {
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension(".docx"), Some(FileType::Word));
        assert_eq!(FileType::from_extension("xls"), Some(FileType::Excel));
        assert_eq!(FileType::from_extension("ppt"), Some(FileType::PowerPoint));
        assert_eq!(FileType::from_extension("txt"), None);
        assert_eq!(FileType::PowerPoint.to_string(), "powerpoint");
    }

    #[test]
    fn test_builder_assigns_indices() {
        let doc = sample();
        let indices: Vec<u32> = doc.content().iter().map(|u| u.unit_index).collect();
        assert_eq!(indices, vec![1, 2]);

        let images: Vec<(u32, u32)> = doc
            .images()
            .iter()
            .map(|i| (i.unit_index, i.image_index))
            .collect();
        assert_eq!(images, vec![(1, 1), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_builder_skips_blank_metadata() {
        let mut b = DocumentBuilder::new("a.pdf", FileType::Pdf);
        b.set_metadata("title", "  ");
        b.set_metadata("author", " Kim ");
        let doc = b.build();
        assert!(!doc.metadata().contains_key("title"));
        assert_eq!(doc.metadata().get("author").map(String::as_str), Some("Kim"));
    }

    #[test]
    fn test_unit_lookup() {
        let doc = sample();
        assert_eq!(doc.unit(2).map(|u| u.unit_label.as_str()), Some("Slide 2"));
        assert!(doc.unit(0).is_none());
        assert!(doc.unit(3).is_none());
        assert_eq!(doc.tables_for(2).count(), 1);
        assert_eq!(doc.tables_for(1).count(), 0);
        assert_eq!(doc.images_for(2).count(), 2);
    }

    #[test]
    fn test_describe_image_is_idempotent() {
        let mut doc = sample();
        let key = ImageKey::new(2, 1);

        let first = doc.describe_image(key, "a bar chart").unwrap().to_string();
        assert_eq!(first, "a bar chart");

        let second = doc.describe_image(key, "something else").unwrap();
        assert_eq!(second, "a bar chart");
        assert_eq!(doc.pending_images(), vec![ImageKey::new(1, 1), ImageKey::new(2, 2)]);
    }

    #[test]
    fn test_describe_missing_image() {
        let mut doc = sample();
        let err = doc.describe_image(ImageKey::new(5, 1), "x").unwrap_err();
        assert!(matches!(
            err,
            Error::ImageNotFound {
                unit_index: 5,
                image_index: 1
            }
        ));
    }

    #[test]
    fn test_plain_text_skips_empty_units() {
        let doc = sample();
        assert_eq!(doc.plain_text(), "Intro");
    }

    #[test]
    fn test_serde_shape() {
        let doc = sample();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["file_type"], "powerpoint");
        assert_eq!(value["content"][1]["unit_label"], "Slide 2");
        assert!(value["images"][0].get("description").is_none());
        assert_eq!(value["tables"][0]["rows"][1].as_array().unwrap().len(), 1);

        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
