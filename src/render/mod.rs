//! Rendering module for converting documents to output formats.
//!
//! Every formatter is a pure function of the document's current state:
//! rendering the same document twice yields byte-identical output.

mod csv;
mod json;
mod markdown;
mod options;
mod text;

use std::fmt;
use std::str::FromStr;

pub use self::csv::to_csv;
pub use json::{to_json, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer, NO_DESCRIPTION};
pub use options::RenderOptions;
pub use text::to_text;

use crate::error::{Error, Result};
use crate::model::Document;

/// Output format for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Structural serialization of the document model
    Json,

    /// Markdown
    #[default]
    Markdown,

    /// Tables only, as comma-separated values
    Csv,

    /// Plain text
    Text,
}

impl OutputFormat {
    /// Every output format.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Json,
        OutputFormat::Markdown,
        OutputFormat::Csv,
        OutputFormat::Text,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "text",
        }
    }

    /// File extension for rendered output.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }

    /// MIME type of rendered output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Markdown => "text/markdown",
            OutputFormat::Csv => "text/csv",
            OutputFormat::Text => "text/plain",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            "text" | "txt" | "plain" => Ok(OutputFormat::Text),
            _ => Err(Error::UnsupportedOutputFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a document with default options.
pub fn render(doc: &Document, format: OutputFormat) -> Result<String> {
    render_with_options(doc, format, &RenderOptions::default())
}

/// Render a document.
pub fn render_with_options(
    doc: &Document,
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(doc, options.json_format),
        OutputFormat::Markdown => to_markdown(doc, options),
        OutputFormat::Csv => Ok(to_csv(doc)),
        OutputFormat::Text => Ok(to_text(doc)),
    }
}
