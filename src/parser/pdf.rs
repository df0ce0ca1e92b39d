//! PDF parser using lopdf.
//!
//! One content unit per page, labelled `Page N`. lopdf reports no
//! structured tabular regions, so PDF documents carry no tables.

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use rayon::prelude::*;

use super::options::ParseOptions;
use super::{Extraction, ImageLocation};
use crate::error::{Error, Result};
use crate::model::{DocumentBuilder, ImageData};

/// Parent chain depth limit when looking up inherited page resources.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// PDF document parser.
#[derive(Debug, Clone, Default)]
pub struct PdfParser {
    options: ParseOptions,
}

impl PdfParser {
    /// Create a parser with the given options.
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub(crate) fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub(crate) fn extract(&self, data: &[u8], out: &mut Extraction) -> Result<()> {
        let doc = load(data)?;
        if doc.is_encrypted() {
            return Err(Error::PasswordProtected);
        }

        extract_metadata(&doc, &mut out.builder);

        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        out.builder
            .set_metadata("page_count", pages.len().to_string());

        let raw: Vec<String> = pages
            .iter()
            .map(|(page_num, _)| page_text(&doc, *page_num))
            .collect::<Result<_>>()?;

        let texts: Vec<String> = if self.options.parallel {
            raw.par_iter().map(|t| self.options.clean_text(t.trim())).collect()
        } else {
            raw.iter().map(|t| self.options.clean_text(t.trim())).collect()
        };

        for ((page_num, page_id), text) in pages.iter().zip(texts) {
            let unit = out.builder.push_unit(format!("Page {}", page_num), text);
            for image_id in page_images(&doc, *page_id) {
                out.image(unit, ImageLocation::PdfObject(image_id));
            }
        }

        log::debug!("PDF {}: {} pages", doc.version, pages.len());
        Ok(())
    }
}

/// Load a PDF, mapping lopdf failures to the error taxonomy.
pub(crate) fn load(data: &[u8]) -> Result<LopdfDocument> {
    LopdfDocument::load_mem(data).map_err(|e| match e {
        lopdf::Error::Decryption(_) => Error::PasswordProtected,
        other => Error::CorruptFile(other.to_string()),
    })
}

fn page_text(doc: &LopdfDocument, page_num: u32) -> Result<String> {
    doc.extract_text(&[page_num])
        .map_err(|e| Error::DependencyFailure(format!("page {}: {}", page_num, e)))
}

/// Copy the Info dictionary into document metadata.
fn extract_metadata(doc: &LopdfDocument, builder: &mut DocumentBuilder) {
    builder.set_metadata("pdf_version", doc.version.as_str());

    let Some(info) = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return;
    };

    for (key, name) in [
        (&b"Title"[..], "title"),
        (b"Author", "author"),
        (b"Subject", "subject"),
        (b"Keywords", "keywords"),
        (b"Creator", "creator"),
        (b"Producer", "producer"),
    ] {
        if let Some(value) = get_string_from_dict(info, key) {
            builder.set_metadata(name, value);
        }
    }

    for (key, name) in [(&b"CreationDate"[..], "created"), (b"ModDate", "modified")] {
        if let Some(date) = get_string_from_dict(info, key).and_then(|s| parse_pdf_date(&s)) {
            builder.set_metadata(name, date.to_rfc3339());
        }
    }
}

/// Follow a reference to a dictionary, or take an inline dictionary.
fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(r) => doc.get_dictionary(*r).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

/// Resources of a page, inherited through the page tree when absent.
fn page_resources(doc: &LopdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Some(res) = node.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r)) {
            return Some(res);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Image XObjects referenced by a page, in resource order.
fn page_images(doc: &LopdfDocument, page_id: ObjectId) -> Vec<ObjectId> {
    let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|x| resolve_dict(doc, x))
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| obj.as_reference().ok())
        .filter(|id| is_image_xobject(doc, *id))
        .collect()
}

fn is_image_xobject(doc: &LopdfDocument, id: ObjectId) -> bool {
    match doc.get_object(id) {
        Ok(Object::Stream(stream)) => stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name_str().ok())
            == Some("Image"),
        _ => false,
    }
}

/// Raw bytes of an image XObject.
///
/// JPEG and JPEG 2000 streams are returned as stored; other filters are
/// decompressed to raw samples.
pub(crate) fn image_bytes(doc: &LopdfDocument, id: ObjectId) -> Result<ImageData> {
    let stream = match doc.get_object(id) {
        Ok(Object::Stream(stream)) => stream,
        _ => {
            return Err(Error::DependencyFailure(format!(
                "object {} {} is not an image stream",
                id.0, id.1
            )))
        }
    };

    let filter = match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
        Ok(Object::Array(filters)) => filters
            .last()
            .and_then(|f| f.as_name_str().ok())
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };

    let bytes = match filter.as_str() {
        "DCTDecode" | "JPXDecode" => stream.content.clone(),
        _ => stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
    };

    Ok(ImageData::new(format!("{} {} R", id.0, id.1), bytes))
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            // UTF-16BE with BOM is the PDF text string encoding for Unicode
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                String::from_utf8(bytes.clone())
                    .ok()
                    .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
            }
        }
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
