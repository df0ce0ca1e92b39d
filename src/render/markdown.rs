//! Markdown rendering.

use crate::error::Result;
use crate::model::{ContentUnit, Document, ImageRef, Table};

use super::RenderOptions;

/// Placeholder for images without a description.
pub const NO_DESCRIPTION: &str = "no description available";

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(doc)
}

/// Markdown renderer.
///
/// Layout: optional frontmatter, `# <filename>`, then for every unit a
/// `## <label>` heading followed by its tables, its text and its images.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a document to Markdown.
    pub fn render(&self, doc: &Document) -> Result<String> {
        let mut output = String::new();

        if self.options.include_frontmatter {
            self.render_frontmatter(&mut output, doc);
        }

        output.push_str(&format!("# {}\n\n", heading_text(doc.filename())));

        for unit in doc.content() {
            self.render_unit(&mut output, doc, unit);
        }

        Ok(output.trim().to_string())
    }

    fn render_frontmatter(&self, output: &mut String, doc: &Document) {
        output.push_str("---\n");
        output.push_str(&format!("filename: \"{}\"\n", escape_yaml(doc.filename())));
        output.push_str(&format!("file_type: {}\n", doc.file_type()));
        output.push_str(&format!(
            "parsed_at: \"{}\"\n",
            doc.parsed_at().to_rfc3339()
        ));
        for (key, value) in doc.metadata() {
            output.push_str(&format!("{}: \"{}\"\n", key, escape_yaml(value)));
        }
        output.push_str("---\n\n");
    }

    fn render_unit(&self, output: &mut String, doc: &Document, unit: &ContentUnit) {
        output.push_str(&format!("## {}\n\n", heading_text(&unit.unit_label)));

        for table in doc.tables_for(unit.unit_index) {
            self.render_table(output, table);
        }

        let text = unit.text.trim();
        if !text.is_empty() {
            output.push_str(text);
            output.push_str("\n\n");
        }

        for image in doc.images_for(unit.unit_index) {
            self.render_image(output, image);
        }
    }

    fn render_table(&self, output: &mut String, table: &Table) {
        let col_count = table.column_count();
        let Some((header, body)) = table.rows.split_first() else {
            return;
        };
        if col_count == 0 {
            return;
        }

        // The header spans the widest row so that every body cell has a column.
        output.push('|');
        for i in 0..col_count {
            let cell = header.get(i).map(String::as_str).unwrap_or("");
            output.push_str(&format!(" {} |", escape_cell(cell)));
        }
        output.push('\n');

        output.push('|');
        for _ in 0..col_count {
            output.push_str(" --- |");
        }
        output.push('\n');

        for row in body {
            output.push('|');
            for cell in row {
                output.push_str(&format!(" {} |", escape_cell(cell)));
            }
            output.push('\n');
        }

        output.push('\n');
    }

    fn render_image(&self, output: &mut String, image: &ImageRef) {
        let description = image
            .description
            .as_deref()
            .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|d| !d.is_empty());
        output.push_str(&format!(
            "[Image: {}]\n\n",
            description.as_deref().unwrap_or(NO_DESCRIPTION)
        ));
    }
}

/// Heading text on a single line.
fn heading_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Table cell content: pipes escaped, line breaks folded.
fn escape_cell(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.trim().chars() {
        match c {
            '|' => result.push_str("\\|"),
            '\r' => {}
            '\n' => result.push(' '),
            _ => result.push(c),
        }
    }
    result
}

fn escape_yaml(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
