//! Format-specific parsers.
//!
//! The parser set is closed: [`Parser`] is a tagged union over the four
//! variants, selected by [`Parser::for_type`]. Each variant turns raw bytes
//! into a [`Document`] in one pass and never touches it afterwards.

mod excel;
mod ooxml;
mod options;
mod pdf;
mod powerpoint;
mod word;
mod xml;

use std::collections::HashMap;

pub use excel::ExcelParser;
pub use options::ParseOptions;
pub use pdf::PdfParser;
pub use powerpoint::PowerPointParser;
pub use word::WordParser;

use crate::error::{Error, Result};
use crate::model::{Document, DocumentBuilder, FileType, ImageData, ImageKey, UnitHandle};

/// A parser variant with its options.
#[derive(Debug, Clone)]
pub enum Parser {
    Pdf(PdfParser),
    Word(WordParser),
    Excel(ExcelParser),
    PowerPoint(PowerPointParser),
}

impl Parser {
    /// Select the parser variant for a file type.
    pub fn for_type(file_type: FileType, options: ParseOptions) -> Self {
        match file_type {
            FileType::Pdf => Parser::Pdf(PdfParser::new(options)),
            FileType::Word => Parser::Word(WordParser::new(options)),
            FileType::Excel => Parser::Excel(ExcelParser::new(options)),
            FileType::PowerPoint => Parser::PowerPoint(PowerPointParser::new(options)),
        }
    }

    /// The file type this variant handles.
    pub fn file_type(&self) -> FileType {
        match self {
            Parser::Pdf(_) => FileType::Pdf,
            Parser::Word(_) => FileType::Word,
            Parser::Excel(_) => FileType::Excel,
            Parser::PowerPoint(_) => FileType::PowerPoint,
        }
    }

    /// Options this parser runs with.
    pub fn options(&self) -> &ParseOptions {
        match self {
            Parser::Pdf(p) => p.options(),
            Parser::Word(p) => p.options(),
            Parser::Excel(p) => p.options(),
            Parser::PowerPoint(p) => p.options(),
        }
    }

    /// Extract a document from raw bytes.
    ///
    /// Failures are terminal and carry the file name; no partial document
    /// is returned.
    pub fn extract(&self, filename: &str, data: &[u8]) -> Result<Document> {
        Ok(self.run(filename, data)?.builder.build())
    }

    /// Extract a document and keep a handle for loading its images later.
    pub fn extract_with_source<'a>(
        &self,
        filename: &str,
        data: &'a [u8],
    ) -> Result<(Document, SourceFile<'a>)> {
        let extraction = self.run(filename, data)?;
        let source = SourceFile {
            data,
            locations: extraction.locations,
            pdf: None,
        };
        Ok((extraction.builder.build(), source))
    }

    fn run(&self, filename: &str, data: &[u8]) -> Result<Extraction> {
        let mut out = Extraction::new(filename, self.file_type(), self.options());

        let result = match self {
            Parser::Pdf(p) => p.extract(data, &mut out),
            Parser::Word(p) => p.extract(data, &mut out),
            Parser::Excel(p) => p.extract(data, &mut out),
            Parser::PowerPoint(p) => p.extract(data, &mut out),
        };
        result.map_err(|e| e.in_file(filename))?;

        log::info!(
            "Parsed {} as {}: {} units, {} tables, {} images",
            filename,
            self.file_type(),
            out.builder.unit_count(),
            out.builder.table_count(),
            out.locations.len()
        );
        Ok(out)
    }
}

/// Where an image's bytes live in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ImageLocation {
    /// Part name inside an OOXML package
    Part(String),
    /// Image XObject in a PDF
    PdfObject(lopdf::ObjectId),
}

/// Document under construction plus the locations of its images.
pub(crate) struct Extraction {
    pub builder: DocumentBuilder,
    locations: HashMap<ImageKey, ImageLocation>,
    extract_images: bool,
}

impl Extraction {
    fn new(filename: &str, file_type: FileType, options: &ParseOptions) -> Self {
        Self {
            builder: DocumentBuilder::new(filename, file_type),
            locations: HashMap::new(),
            extract_images: options.extract_images,
        }
    }

    /// Record an image reference for a unit.
    pub fn image(&mut self, unit: UnitHandle, location: ImageLocation) {
        if !self.extract_images {
            return;
        }
        let image_index = self.builder.push_image(unit);
        self.locations
            .insert(ImageKey::new(unit.index(), image_index), location);
    }
}

/// Loads the raw bytes behind image references.
pub trait ImageSource {
    /// Load one image.
    fn load(&mut self, key: ImageKey) -> Result<ImageData>;
}

/// The originating file of a document, used to fetch image bytes on demand.
pub struct SourceFile<'a> {
    data: &'a [u8],
    locations: HashMap<ImageKey, ImageLocation>,
    pdf: Option<lopdf::Document>,
}

impl<'a> SourceFile<'a> {
    /// Re-walk a file to index its images.
    ///
    /// The walk follows the same structure as the parser, so keys match the
    /// image references of a document parsed from the same bytes.
    pub fn open(file_type: FileType, filename: &str, data: &'a [u8]) -> Result<Self> {
        let options = ParseOptions::default().sequential();
        Parser::for_type(file_type, options)
            .extract_with_source(filename, data)
            .map(|(_, source)| source)
    }

    /// Number of indexed images.
    pub fn image_count(&self) -> usize {
        self.locations.len()
    }

    /// Check whether an image is indexed.
    pub fn contains(&self, key: ImageKey) -> bool {
        self.locations.contains_key(&key)
    }
}

impl ImageSource for SourceFile<'_> {
    fn load(&mut self, key: ImageKey) -> Result<ImageData> {
        let location = self
            .locations
            .get(&key)
            .cloned()
            .ok_or(Error::ImageNotFound {
                unit_index: key.unit_index,
                image_index: key.image_index,
            })?;

        match location {
            ImageLocation::Part(name) => {
                let bytes = ooxml::Package::open(self.data)?.read_bytes(&name)?;
                Ok(ImageData::new(name, bytes))
            }
            ImageLocation::PdfObject(id) => {
                let doc = match self.pdf.take() {
                    Some(doc) => doc,
                    None => pdf::load(self.data)?,
                };
                let image = pdf::image_bytes(&doc, id);
                self.pdf = Some(doc);
                image
            }
        }
    }
}

impl std::fmt::Debug for SourceFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("size", &self.data.len())
            .field("images", &self.locations.len())
            .finish()
    }
}
