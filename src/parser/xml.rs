//! Small helpers over quick-xml events shared by the OOXML parsers.

use quick_xml::events::{BytesEnd, BytesRef, BytesStart, BytesText};
use quick_xml::reader::Reader;

use crate::error::Error;

/// Create a reader that keeps whitespace; `xml:space="preserve"` runs matter.
pub(crate) fn reader(xml: &str) -> Reader<&[u8]> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    reader
}

/// Wrap a quick-xml error with the part it occurred in.
pub(crate) fn xml_error(part: &str, err: quick_xml::Error) -> Error {
    Error::DependencyFailure(format!("XML error in {}: {}", part, err))
}

/// Element name without its namespace prefix.
pub(crate) fn local<'a>(e: &'a BytesStart<'_>) -> &'a [u8] {
    e.local_name().into_inner()
}

/// Closing element name without its namespace prefix.
pub(crate) fn local_end<'a>(e: &'a BytesEnd<'_>) -> &'a [u8] {
    e.local_name().into_inner()
}

/// Attribute value by local name, ignoring any prefix.
pub(crate) fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Prefixed attribute by local name, e.g. `r:id` or `r:embed`.
///
/// Relationship ids always carry a prefix; an unprefixed `id` on the same
/// element (as on `p:sldId`) is a different attribute.
pub(crate) fn rel_attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Raw text content of a text event.
pub(crate) fn text(e: &BytesText<'_>) -> String {
    String::from_utf8_lossy(e.as_ref()).into_owned()
}

/// Resolve an entity or character reference (`&amp;`, `&#169;`, `&#xA9;`).
pub(crate) fn entity(e: &BytesRef<'_>) -> String {
    let name = String::from_utf8_lossy(e);
    match name.as_ref() {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        other => {
            let code = if let Some(hex) = other.strip_prefix("#x").or_else(|| other.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = other.strip_prefix('#') {
                dec.parse().ok()
            } else {
                None
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        }
    }
}
