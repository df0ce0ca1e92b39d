//! PowerPoint (.pptx) parser.
//!
//! One content unit per slide in presentation order, labelled `Slide N`.

use quick_xml::events::{BytesStart, Event};

use super::ooxml::{Package, Relationships};
use super::options::ParseOptions;
use super::{xml, Extraction, ImageLocation};
use crate::error::{Error, Result};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// PowerPoint presentation parser.
#[derive(Debug, Clone, Default)]
pub struct PowerPointParser {
    options: ParseOptions,
}

impl PowerPointParser {
    /// Create a parser with the given options.
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub(crate) fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub(crate) fn extract(&self, data: &[u8], out: &mut Extraction) -> Result<()> {
        let mut package = Package::open_office(out.builder.filename(), data)?;
        if !package.has_part(PRESENTATION_PART) {
            return Err(Error::CorruptFile(format!("missing part {}", PRESENTATION_PART)));
        }
        package.core_properties(&mut out.builder)?;

        let slides = slide_parts(&mut package)?;
        for (i, part) in slides.iter().enumerate() {
            let xml = package.read_string(part)?;
            let rels = package.relationships(part)?;
            let slide = SlideWalker::new(&rels, &self.options).walk(part, &xml)?;

            let unit = out
                .builder
                .push_unit(format!("Slide {}", i + 1), slide.shapes.join("\n"));
            for rows in slide.tables {
                out.builder.push_table(unit, rows);
            }
            for image in slide.images {
                out.image(unit, ImageLocation::Part(image));
            }
        }

        out.builder
            .set_metadata("slide_count", slides.len().to_string());
        Ok(())
    }
}

/// Slide part names in presentation order.
///
/// The order comes from `p:sldIdLst`; packages without one fall back to
/// the numeric suffix of `ppt/slides/slideN.xml`.
fn slide_parts(package: &mut Package<'_>) -> Result<Vec<String>> {
    let xml = package.read_string(PRESENTATION_PART)?;
    let rels = package.relationships(PRESENTATION_PART)?;

    let mut parts = Vec::new();
    let mut reader = xml::reader(&xml);
    loop {
        match reader
            .read_event()
            .map_err(|e| xml::xml_error(PRESENTATION_PART, e))?
        {
            Event::Start(e) | Event::Empty(e) if xml::local(&e) == b"sldId" => {
                let target = xml::rel_attr(&e, b"id").and_then(|id| rels.target(&id).map(str::to_string));
                match target {
                    Some(part) if package.has_part(&part) => parts.push(part),
                    _ => log::warn!("Skipping unresolved slide reference in {}", PRESENTATION_PART),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if parts.is_empty() {
        let mut numbered: Vec<(u32, String)> = package
            .part_names()
            .into_iter()
            .filter_map(|name| {
                let n = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?.parse().ok()?;
                Some((n, name))
            })
            .collect();
        numbered.sort();
        parts = numbered.into_iter().map(|(_, name)| name).collect();
    }

    Ok(parts)
}

/// Content of one slide.
#[derive(Debug, Default)]
struct Slide {
    shapes: Vec<String>,
    tables: Vec<Vec<Vec<String>>>,
    images: Vec<String>,
}

/// State machine over the events of a slide part.
struct SlideWalker<'a> {
    rels: &'a Relationships,
    options: &'a ParseOptions,
    slide: Slide,

    shape_depth: usize,
    shape: Vec<String>,
    para: String,
    in_text: bool,

    table_depth: usize,
    table: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Vec<String>,

    pic_depth: usize,
    skip_depth: usize,
}

impl<'a> SlideWalker<'a> {
    fn new(rels: &'a Relationships, options: &'a ParseOptions) -> Self {
        Self {
            rels,
            options,
            slide: Slide::default(),
            shape_depth: 0,
            shape: Vec::new(),
            para: String::new(),
            in_text: false,
            table_depth: 0,
            table: Vec::new(),
            row: Vec::new(),
            cell: Vec::new(),
            pic_depth: 0,
            skip_depth: 0,
        }
    }

    fn walk(mut self, part: &str, xml: &str) -> Result<Slide> {
        let mut reader = xml::reader(xml);

        loop {
            let event = reader.read_event().map_err(|e| xml::xml_error(part, e))?;

            if self.skip_depth > 0 {
                match event {
                    Event::Start(_) => self.skip_depth += 1,
                    Event::End(_) => self.skip_depth -= 1,
                    Event::Eof => break,
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(e) => self.start(&e, false),
                Event::Empty(e) => self.start(&e, true),
                Event::End(e) => self.end(xml::local_end(&e)),
                Event::Text(e) if self.in_text => self.para.push_str(&xml::text(&e)),
                Event::GeneralRef(e) if self.in_text => self.para.push_str(&xml::entity(&e)),
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(self.slide)
    }

    fn start(&mut self, e: &BytesStart<'_>, empty: bool) {
        match xml::local(e) {
            b"Fallback" if !empty => self.skip_depth = 1,
            b"sp" if !empty => {
                self.shape_depth += 1;
                if self.shape_depth == 1 {
                    self.shape.clear();
                }
            }
            b"tbl" if !empty => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table.clear();
                }
            }
            b"tr" if self.table_depth == 1 => {
                self.row.clear();
                if empty {
                    self.table.push(Vec::new());
                }
            }
            b"tc" if self.table_depth == 1 => {
                self.cell.clear();
                if empty {
                    self.row.push(String::new());
                }
            }
            b"p" => {
                self.para.clear();
                if empty {
                    self.end(b"p");
                }
            }
            b"t" if !empty => self.in_text = true,
            b"br" => self.para.push('\n'),
            b"pic" if !empty => self.pic_depth += 1,
            b"blip" if self.pic_depth > 0 => {
                if let Some(id) = xml::rel_attr(e, b"embed") {
                    match self.rels.target(&id) {
                        Some(part) => self.slide.images.push(part.to_string()),
                        None => log::debug!("Unresolved image relationship {}", id),
                    }
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_text = false,
            b"p" => {
                let text = self.options.clean_text(self.para.trim());
                self.para.clear();
                if text.is_empty() {
                    return;
                }
                if self.table_depth > 0 {
                    self.cell.push(text);
                } else if self.shape_depth > 0 {
                    self.shape.push(text);
                }
            }
            b"tc" if self.table_depth == 1 => {
                let cell = std::mem::take(&mut self.cell).join("\n");
                self.row.push(cell);
            }
            b"tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                self.table.push(row);
            }
            b"tbl" => {
                if self.table_depth == 1 {
                    let table = std::mem::take(&mut self.table);
                    if !table.is_empty() {
                        self.slide.tables.push(table);
                    }
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            b"sp" => {
                self.shape_depth = self.shape_depth.saturating_sub(1);
                if self.shape_depth == 0 && !self.shape.is_empty() {
                    let text = std::mem::take(&mut self.shape).join("\n");
                    self.slide.shapes.push(text);
                }
            }
            b"pic" => self.pic_depth = self.pic_depth.saturating_sub(1),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(xml: &str) -> Slide {
        let rels = Relationships::default();
        let options = ParseOptions::default();
        SlideWalker::new(&rels, &options)
            .walk("ppt/slides/slide1.xml", xml)
            .unwrap()
    }

    fn shape(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p))
            .collect();
        format!("<p:sp><p:txBody>{}</p:txBody></p:sp>", body)
    }

    #[test]
    fn test_shapes_in_tree_order() {
        let xml = format!(
            "<p:sld><p:cSld><p:spTree>{}<p:grpSp>{}</p:grpSp>{}</p:spTree></p:cSld></p:sld>",
            shape(&["Title"]),
            shape(&["Grouped"]),
            shape(&["Line 1", "Line 2"]),
        );
        let slide = walk(&xml);
        assert_eq!(slide.shapes, vec!["Title", "Grouped", "Line 1\nLine 2"]);
    }

    #[test]
    fn test_empty_shapes_skipped() {
        let xml = format!(
            "<p:spTree>{}<p:sp><p:txBody><a:p/><a:p><a:endParaRPr/></a:p></p:txBody></p:sp></p:spTree>",
            shape(&["Only"])
        );
        assert_eq!(walk(&xml).shapes, vec!["Only"]);
    }

    #[test]
    fn test_table_cells_stay_out_of_text() {
        let xml = r#"<p:spTree><p:graphicFrame><a:graphic><a:graphicData><a:tbl>
<a:tr><a:tc><a:txBody><a:p><a:r><a:t>Q</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:p><a:r><a:t>Total</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
<a:tr><a:tc><a:txBody><a:p><a:r><a:t>Q1</a:t></a:r></a:p></a:txBody></a:tc><a:tc/></a:tr>
</a:tbl></a:graphicData></a:graphic></p:graphicFrame></p:spTree>"#;
        let slide = walk(xml);
        assert!(slide.shapes.is_empty());
        assert_eq!(slide.tables.len(), 1);
        assert_eq!(slide.tables[0], vec![vec!["Q", "Total"], vec!["Q1", ""]]);
    }

    #[test]
    fn test_line_break_and_entities() {
        let xml = "<p:sp><p:txBody><a:p><a:r><a:t>R&amp;D</a:t></a:r><a:br/><a:r><a:t>plan</a:t></a:r></a:p></p:txBody></p:sp>";
        assert_eq!(walk(xml).shapes, vec!["R&D\nplan"]);
    }
}
