//! Word (.docx) parser.
//!
//! Word files store no page boundaries, so content units are logical
//! sections: each heading paragraph starts a new unit labelled with the
//! heading text. Content before the first heading forms an untitled
//! section labelled `Section N`.

use std::collections::HashSet;
use std::sync::OnceLock;

use quick_xml::events::{BytesStart, Event};
use regex::Regex;

use super::ooxml::{Package, Relationships};
use super::options::ParseOptions;
use super::{xml, Extraction, ImageLocation};
use crate::error::Result;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

/// Outline levels 0-8 are headings; 9 is body text.
const BODY_OUTLINE_LEVEL: u32 = 9;

fn heading_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^(heading\s?\d|title)$").ok())
        .as_ref()
}

fn is_heading_style_name(name: &str) -> bool {
    heading_pattern().is_some_and(|re| re.is_match(name.trim()))
}

/// Word document parser.
#[derive(Debug, Clone, Default)]
pub struct WordParser {
    options: ParseOptions,
}

impl WordParser {
    /// Create a parser with the given options.
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub(crate) fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub(crate) fn extract(&self, data: &[u8], out: &mut Extraction) -> Result<()> {
        let mut package = Package::open_office(out.builder.filename(), data)?;
        package.core_properties(&mut out.builder)?;

        let headings = match package.read_optional_string(STYLES_PART)? {
            Some(styles) => heading_styles(&styles)?,
            None => HashSet::new(),
        };
        let rels = package.relationships(DOCUMENT_PART)?;
        let body = package.read_string(DOCUMENT_PART)?;

        let walker = BodyWalker::new(&headings, &rels, &self.options);
        let (sections, paragraph_count) = walker.walk(&body)?;

        for section in sections {
            let label = section
                .label
                .unwrap_or_else(|| format!("Section {}", out.builder.unit_count() + 1));
            let unit = out.builder.push_unit(label, section.paragraphs.join("\n"));
            for rows in section.tables {
                out.builder.push_table(unit, rows);
            }
            for part in section.images {
                out.image(unit, ImageLocation::Part(part));
            }
        }

        out.builder
            .set_metadata("paragraph_count", paragraph_count.to_string());
        out.builder
            .set_metadata("table_count", out.builder.table_count().to_string());
        out.builder
            .set_metadata("section_count", out.builder.unit_count().to_string());
        Ok(())
    }
}

/// Style ids whose name is a heading or that carry an outline level.
fn heading_styles(styles: &str) -> Result<HashSet<String>> {
    let mut reader = xml::reader(styles);
    let mut ids = HashSet::new();
    let mut current: Option<(String, bool)> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| xml::xml_error(STYLES_PART, e))?
        {
            Event::Start(e) | Event::Empty(e) => match xml::local(&e) {
                b"style" => {
                    current = xml::attr(&e, b"styleId").map(|id| {
                        let heading = is_heading_style_name(&id);
                        (id, heading)
                    });
                }
                b"name" => {
                    if let (Some((_, heading)), Some(name)) = (current.as_mut(), xml::attr(&e, b"val")) {
                        *heading |= is_heading_style_name(&name);
                    }
                }
                b"outlineLvl" => {
                    if let Some((_, heading)) = current.as_mut() {
                        *heading |= is_outline_heading(&e);
                    }
                }
                _ => {}
            },
            Event::End(e) if xml::local_end(&e) == b"style" => {
                if let Some((id, true)) = current.take() {
                    ids.insert(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

fn is_outline_heading(e: &BytesStart<'_>) -> bool {
    xml::attr(e, b"val")
        .and_then(|v| v.parse::<u32>().ok())
        .is_some_and(|lvl| lvl < BODY_OUTLINE_LEVEL)
}

/// A run of content between headings.
#[derive(Debug, Default)]
struct Section {
    label: Option<String>,
    paragraphs: Vec<String>,
    tables: Vec<Vec<Vec<String>>>,
    images: Vec<String>,
}

impl Section {
    fn is_blank(&self) -> bool {
        self.label.is_none()
            && self.paragraphs.is_empty()
            && self.tables.is_empty()
            && self.images.is_empty()
    }
}

/// State machine over the events of `word/document.xml`.
struct BodyWalker<'a> {
    headings: &'a HashSet<String>,
    rels: &'a Relationships,
    options: &'a ParseOptions,

    sections: Vec<Section>,
    current: Section,
    paragraph_count: usize,

    // paragraph state
    para: String,
    para_depth: usize,
    para_heading: bool,
    run_depth: usize,
    in_text: bool,

    // table state; only the outermost table is kept as a table
    table_depth: usize,
    table: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Vec<String>,

    // mc:Fallback duplicates mc:Choice content
    skip_depth: usize,
}

impl<'a> BodyWalker<'a> {
    fn new(headings: &'a HashSet<String>, rels: &'a Relationships, options: &'a ParseOptions) -> Self {
        Self {
            headings,
            rels,
            options,
            sections: Vec::new(),
            current: Section::default(),
            paragraph_count: 0,
            para: String::new(),
            para_depth: 0,
            para_heading: false,
            run_depth: 0,
            in_text: false,
            table_depth: 0,
            table: Vec::new(),
            row: Vec::new(),
            cell: Vec::new(),
            skip_depth: 0,
        }
    }

    fn walk(mut self, body: &str) -> Result<(Vec<Section>, usize)> {
        let mut reader = xml::reader(body);

        loop {
            let event = reader
                .read_event()
                .map_err(|e| xml::xml_error(DOCUMENT_PART, e))?;

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

        let last = std::mem::take(&mut self.current);
        if !last.is_blank() {
            self.sections.push(last);
        }
        Ok((self.sections, self.paragraph_count))
    }

    fn start(&mut self, e: &BytesStart<'_>, empty: bool) {
        match xml::local(e) {
            b"Fallback" if !empty => self.skip_depth = 1,
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
                self.para_depth += 1;
                if self.para_depth == 1 {
                    self.para.clear();
                    self.para_heading = false;
                }
                if empty {
                    self.end(b"p");
                }
            }
            b"pStyle" if self.para_depth == 1 => {
                if let Some(id) = xml::attr(e, b"val") {
                    self.para_heading |= self.headings.contains(&id) || is_heading_style_name(&id);
                }
            }
            b"outlineLvl" if self.para_depth == 1 => {
                self.para_heading |= is_outline_heading(e);
            }
            b"r" if !empty => self.run_depth += 1,
            b"t" if !empty && self.run_depth > 0 => self.in_text = true,
            b"tab" if self.run_depth > 0 => self.para.push('\t'),
            b"br" | b"cr" if self.run_depth > 0 => self.para.push('\n'),
            b"blip" => {
                if let Some(id) = xml::rel_attr(e, b"embed") {
                    self.image(&id);
                }
            }
            b"imagedata" => {
                if let Some(id) = xml::rel_attr(e, b"id") {
                    self.image(&id);
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_text = false,
            b"r" => self.run_depth = self.run_depth.saturating_sub(1),
            b"p" => {
                self.para_depth = self.para_depth.saturating_sub(1);
                if self.para_depth == 0 {
                    self.finish_paragraph();
                } else {
                    // text box paragraph inside a paragraph
                    self.para.push('\n');
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
                        self.current.tables.push(table);
                    }
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn finish_paragraph(&mut self) {
        let text = self.options.clean_text(self.para.trim());
        self.para.clear();

        if self.table_depth > 0 {
            if !text.is_empty() {
                self.cell.push(text);
            }
            return;
        }
        if text.is_empty() {
            return;
        }
        self.paragraph_count += 1;

        if self.para_heading {
            let previous = std::mem::take(&mut self.current);
            if !previous.is_blank() {
                self.sections.push(previous);
            }
            self.current.label = Some(text.replace('\n', " "));
        } else {
            self.current.paragraphs.push(text);
        }
    }

    fn image(&mut self, rel_id: &str) {
        match self.rels.target(rel_id) {
            Some(part) => self.current.images.push(part.to_string()),
            None => log::debug!("Unresolved image relationship {}", rel_id),
        }
    }
}
