//! Plain text rendering.

use crate::model::Document;

/// Convert a document to plain text.
///
/// Unit texts in order, separated by a blank line. Tables and images are
/// not rendered.
pub fn to_text(doc: &Document) -> String {
    doc.plain_text().trim().to_string()
}
