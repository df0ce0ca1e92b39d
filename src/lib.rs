//! # unfile
//!
//! Business document conversion library for Rust.
//!
//! This library turns PDF, Word, Excel and PowerPoint files into one
//! canonical [`Document`] and renders it as JSON, Markdown, CSV or plain text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unfile::{parse_file, render, OutputFormat};
//!
//! fn main() -> unfile::Result<()> {
//!     // Validate, dispatch and parse
//!     let doc = parse_file("slides.pptx")?;
//!
//!     // Render to Markdown
//!     let markdown = render(&doc, OutputFormat::Markdown)?;
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Four source formats**: PDF, DOCX, XLSX/XLS, PPTX
//! - **Four output formats**: JSON, Markdown, CSV, plain text
//! - **Stable order**: pages, sections, slides and sheets keep native order
//! - **Faithful tables**: ragged rows are never padded
//! - **Image descriptions**: optional, concurrent, cancellable enrichment
//!   through a pluggable [`vision::VisionService`]

pub mod convert;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod validate;
pub mod vision;

// Re-export commonly used types
pub use convert::{ConvertResult, Converter};
pub use detect::{detect_format_from_bytes, dispatch, is_supported, supported_extensions};
pub use error::{Error, ErrorKind, Result};
pub use model::{
    ContentUnit, Document, DocumentBuilder, FileType, ImageData, ImageKey, ImageRef, Metadata,
    Table,
};
pub use parser::{ImageSource, ParseOptions, Parser, SourceFile};
pub use render::{render, JsonFormat, OutputFormat, RenderOptions};
pub use validate::{ValidationLimits, Validator};

use std::path::Path;

/// Parse a file and return its canonical document.
///
/// The file is validated (extension, size, signature) before any parser
/// runs.
///
/// # Example
///
/// ```no_run
/// use unfile::parse_file;
///
/// let doc = parse_file("report.docx").unwrap();
/// println!("Sections: {}", doc.unit_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    Converter::new().parse_file(path)
}

/// Parse an in-memory file. The name drives format dispatch.
///
/// # Example
///
/// ```no_run
/// use unfile::parse_bytes;
///
/// let data = std::fs::read("budget.xlsx").unwrap();
/// let doc = parse_bytes("budget.xlsx", &data).unwrap();
/// ```
pub fn parse_bytes(filename: &str, data: &[u8]) -> Result<Document> {
    Converter::new().parse_bytes(filename, data)
}

/// Extract plain text from a file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Converter::new().extract_text(path)
}

/// Convert a file to Markdown.
///
/// # Example
///
/// ```no_run
/// use unfile::to_markdown;
///
/// let markdown = to_markdown("deck.pptx").unwrap();
/// std::fs::write("deck.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    convert_path(path, OutputFormat::Markdown)
}

/// Convert a file to JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let converter =
        Converter::new().with_render_options(RenderOptions::new().with_json_format(format));
    Ok(converter.convert_file(path, OutputFormat::Json)?.content)
}

/// Convert a file's tables to CSV.
pub fn to_csv<P: AsRef<Path>>(path: P) -> Result<String> {
    convert_path(path, OutputFormat::Csv)
}

/// Convert a file to plain text.
pub fn to_text<P: AsRef<Path>>(path: P) -> Result<String> {
    convert_path(path, OutputFormat::Text)
}

fn convert_path<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<String> {
    Ok(Converter::new().convert_file(path, format)?.content)
}

/// Builder for parsing and converting documents.
///
/// # Example
///
/// ```no_run
/// use unfile::Unfile;
///
/// let markdown = Unfile::new()
///     .with_frontmatter()
///     .with_max_size_mb(20)
///     .parse("report.pdf")?
///     .to_markdown()?;
/// # Ok::<(), unfile::Error>(())
/// ```
pub struct Unfile {
    limits: ValidationLimits,
    parse_options: ParseOptions,
    render_options: RenderOptions,
}

impl Unfile {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            limits: ValidationLimits::default(),
            parse_options: ParseOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parse_options = self.parse_options.sequential();
        self
    }

    /// Set the size ceiling in megabytes.
    pub fn with_max_size_mb(mut self, mb: u64) -> Self {
        self.limits = ValidationLimits::with_max_size_mb(mb);
        self
    }

    /// Enable or disable image reference extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.parse_options = self.parse_options.with_images(extract);
        self
    }

    /// Enable frontmatter in Markdown output.
    pub fn with_frontmatter(mut self) -> Self {
        self.render_options = self.render_options.with_frontmatter(true);
        self
    }

    /// Render JSON without indentation.
    pub fn compact_json(mut self) -> Self {
        self.render_options = self.render_options.with_json_format(JsonFormat::Compact);
        self
    }

    fn converter(&self) -> Converter {
        Converter::new()
            .with_limits(self.limits)
            .with_parse_options(self.parse_options.clone())
            .with_render_options(self.render_options.clone())
    }

    /// Parse a file and return a result wrapper.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<UnfileResult> {
        let converter = self.converter();
        let document = converter.parse_file(path)?;
        Ok(UnfileResult {
            document,
            converter,
        })
    }

    /// Parse an in-memory file.
    pub fn parse_bytes(self, filename: &str, data: &[u8]) -> Result<UnfileResult> {
        let converter = self.converter();
        let document = converter.parse_bytes(filename, data)?;
        Ok(UnfileResult {
            document,
            converter,
        })
    }
}

impl Default for Unfile {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed document with the render settings chosen on the builder.
pub struct UnfileResult {
    /// The parsed document
    pub document: Document,
    converter: Converter,
}

impl UnfileResult {
    /// Render to any output format.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        self.converter.render(&self.document, format)
    }

    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        self.render(OutputFormat::Markdown)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        self.render(OutputFormat::Text)
    }

    /// Convert to JSON.
    pub fn to_json(&self) -> Result<String> {
        self.render(OutputFormat::Json)
    }

    /// Convert tables to CSV.
    pub fn to_csv(&self) -> Result<String> {
        self.render(OutputFormat::Csv)
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
