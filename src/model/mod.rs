//! Canonical document model.
//!
//! Every parser produces a [`Document`] and every renderer consumes one.
//! The model is format-agnostic: pages, sections, slides, and sheets all
//! become [`ContentUnit`]s in native order.

mod document;
mod resource;
mod table;

pub use document::{ContentUnit, Document, DocumentBuilder, FileType, Metadata, UnitHandle};
pub use resource::{detect_mime_type, ImageData, ImageKey, ImageRef};
pub use table::Table;
