//! Conversion pipeline: validate, dispatch, parse, optionally enrich, render.
//!
//! # Example
//!
//! ```no_run
//! use unfile::convert::Converter;
//! use unfile::OutputFormat;
//!
//! fn main() -> unfile::Result<()> {
//!     let converter = Converter::new();
//!     let result = converter.convert_file("budget.xlsx", OutputFormat::Csv)?;
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Document, FileType, ImageKey, Metadata, Table};
use crate::parser::{ParseOptions, Parser};
use crate::render::{self, OutputFormat, RenderOptions};
use crate::validate::{display_name, ValidationLimits, Validator};
use crate::vision::{self, VisionConfig, VisionService};

/// Result of document conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertResult {
    /// Rendered content
    pub content: String,

    /// Format the content was rendered to
    pub format: OutputFormat,

    /// MIME type of the content
    pub mime_type: &'static str,

    /// Type of the source file
    pub file_type: FileType,

    /// Images left without a description by the vision step
    pub failed_images: Vec<ImageKey>,

    /// Non-fatal problems, such as partial image description failures
    pub warnings: Vec<String>,
}

impl ConvertResult {
    fn new(content: String, format: OutputFormat, file_type: FileType) -> Self {
        Self {
            content,
            format,
            mime_type: format.mime_type(),
            file_type,
            failed_images: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Get content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Whether any warning was raised.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Document converter.
///
/// Holds no per-document state; one converter can serve any number of
/// independent requests.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    validator: Validator,
    parse_options: ParseOptions,
    render_options: RenderOptions,
    vision: VisionConfig,
}

impl Converter {
    /// Create a converter with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set validation limits.
    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.validator = Validator::with_limits(limits);
        self
    }

    /// Set parsing options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Set the image description settings.
    pub fn with_vision_config(mut self, config: VisionConfig) -> Self {
        self.vision = config;
        self
    }

    /// Validation limits in effect.
    pub fn limits(&self) -> ValidationLimits {
        self.validator.limits()
    }

    /// Parsing options in effect.
    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    /// Rendering options in effect.
    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    /// Parse a file on disk.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        let file_type = self.validator.validate_path(path)?;
        let filename = display_name(path);
        let data = std::fs::read(path).map_err(|e| Error::from(e).in_file(&filename))?;
        self.parser(file_type).extract(&filename, &data)
    }

    /// Parse an in-memory file.
    pub fn parse_bytes(&self, filename: &str, data: &[u8]) -> Result<Document> {
        let file_type = self.validator.validate_bytes(filename, data)?;
        self.parser(file_type).extract(filename, data)
    }

    /// Convert a file on disk.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P, format: OutputFormat) -> Result<ConvertResult> {
        let path = path.as_ref();
        let doc = self.parse_file(path)?;
        self.finish(&doc, format)
    }

    /// Convert a file on disk to a format given by name.
    ///
    /// The name is resolved before the file is read.
    pub fn convert_file_as<P: AsRef<Path>>(&self, path: P, format: &str) -> Result<ConvertResult> {
        let path = path.as_ref();
        let format: OutputFormat = format
            .parse()
            .map_err(|e: Error| e.in_file(display_name(path)))?;
        self.convert_file(path, format)
    }

    /// Convert an in-memory file.
    pub fn convert_bytes(
        &self,
        filename: &str,
        data: &[u8],
        format: OutputFormat,
    ) -> Result<ConvertResult> {
        let doc = self.parse_bytes(filename, data)?;
        self.finish(&doc, format)
    }

    /// Convert an in-memory file, describing its images first.
    ///
    /// Image description failures do not fail the conversion: affected
    /// images render with the placeholder and are listed in
    /// [`ConvertResult::failed_images`].
    pub async fn convert_bytes_with_vision<S>(
        &self,
        filename: &str,
        data: &[u8],
        format: OutputFormat,
        service: &S,
    ) -> Result<ConvertResult>
    where
        S: VisionService + ?Sized,
    {
        self.convert_bytes_with_vision_until(
            filename,
            data,
            format,
            service,
            std::future::pending::<()>(),
        )
        .await
    }

    /// Like [`Converter::convert_bytes_with_vision`], abandoning outstanding
    /// description calls when `cancel` completes.
    pub async fn convert_bytes_with_vision_until<S, C>(
        &self,
        filename: &str,
        data: &[u8],
        format: OutputFormat,
        service: &S,
        cancel: C,
    ) -> Result<ConvertResult>
    where
        S: VisionService + ?Sized,
        C: Future<Output = ()>,
    {
        let file_type = self.validator.validate_bytes(filename, data)?;
        let (mut doc, mut source) = self.parser(file_type).extract_with_source(filename, data)?;

        let report =
            vision::describe_images_until(&mut doc, &mut source, service, &self.vision, cancel)
                .await;

        let mut result = self.finish(&doc, format)?;
        result.failed_images = report.undescribed();
        if let Some(warning) = report.warning() {
            result.warnings.push(format!("{}: {}", filename, warning));
        }
        Ok(result)
    }

    /// Extract plain text from a file.
    pub fn extract_text<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let doc = self.parse_file(path)?;
        Ok(render::to_text(&doc))
    }

    /// Extract every table of a file.
    pub fn extract_tables<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Table>> {
        let doc = self.parse_file(path)?;
        Ok(doc.tables().to_vec())
    }

    /// Extract document properties of a file.
    pub fn extract_metadata<P: AsRef<Path>>(&self, path: P) -> Result<Metadata> {
        let doc = self.parse_file(path)?;
        Ok(doc.metadata().clone())
    }

    /// Render an already parsed document.
    pub fn render(&self, doc: &Document, format: OutputFormat) -> Result<String> {
        render::render_with_options(doc, format, &self.render_options)
            .map_err(|e| e.in_file(doc.filename()))
    }

    fn parser(&self, file_type: FileType) -> Parser {
        Parser::for_type(file_type, self.parse_options.clone())
    }

    fn finish(&self, doc: &Document, format: OutputFormat) -> Result<ConvertResult> {
        let content = self.render(doc, format)?;
        log::debug!(
            "Rendered {} as {} ({} bytes)",
            doc.filename(),
            format,
            content.len()
        );
        Ok(ConvertResult::new(content, format, doc.file_type()))
    }
}
