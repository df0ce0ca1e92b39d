//! Fixture builders shared by the integration tests.
//!
//! Office packages are assembled with `zip` from minimal but well-formed
//! parts; PDFs are assembled with `lopdf`.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Smallest byte sequence recognised as a PNG.
pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Zip the given parts in order.
pub fn zip_package(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in parts {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn part(name: &str, data: impl Into<Vec<u8>>) -> (String, Vec<u8>) {
    (name.to_string(), data.into())
}

fn relationships(rels: &[(String, &str, String)]) -> String {
    let body: String = rels
        .iter()
        .map(|(id, rel_type, target)| {
            format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id, rel_type, target
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">{}</Relationships>"#,
        PKG_REL_NS, body
    )
}

fn core_properties(title: &str, author: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>{}</dc:creator></cp:coreProperties>"#,
        title, author
    )
}

fn content_types() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/></Types>"#
}

// ---------------------------------------------------------------------------
// Word

/// A paragraph with plain text.
pub fn para(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        text
    )
}

/// A heading paragraph (`Heading1`, `Heading2`, ...).
pub fn heading(text: &str, level: u32) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading{}"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
        level, text
    )
}

/// A table with one paragraph per cell.
pub fn word_table(rows: &[&[&str]]) -> String {
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|c| format!("<w:tc>{}</w:tc>", para(c)))
                .collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    format!("<w:tbl>{}</w:tbl>", body)
}

/// An inline picture referring to the relationship `rId` of `image(n)`.
pub fn word_image(n: usize) -> String {
    format!(
        r#"<w:p><w:r><w:drawing><wp:inline><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="rIdImg{}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        n
    )
}

/// A .docx package with the given body and `images` embedded pictures.
pub fn docx(body: &str, images: usize) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="{}" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        REL_NS, body
    );

    let rels: Vec<(String, &str, String)> = (1..=images)
        .map(|n| (format!("rIdImg{}", n), IMAGE_REL, format!("media/image{}.png", n)))
        .collect();

    let mut parts = vec![
        part("[Content_Types].xml", content_types()),
        part(
            "_rels/.rels",
            relationships(&[(
                "rId1".to_string(),
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
                "word/document.xml".to_string(),
            )]),
        ),
        part("docProps/core.xml", core_properties("Project Plan", "Lee")),
        part("word/document.xml", document),
        part("word/_rels/document.xml.rels", relationships(&rels)),
    ];
    for n in 1..=images {
        parts.push(part(&format!("word/media/image{}.png", n), PNG));
    }
    zip_package(&parts)
}

// ---------------------------------------------------------------------------
// PowerPoint

/// Content of one synthetic slide.
#[derive(Debug, Clone, Default)]
pub struct SlideSpec {
    /// One text shape per entry
    pub texts: Vec<String>,
    /// Optional native table
    pub table: Option<Vec<Vec<String>>>,
    /// Number of picture shapes
    pub images: usize,
}

impl SlideSpec {
    pub fn text(text: &str) -> Self {
        Self {
            texts: vec![text.to_string()],
            ..Default::default()
        }
    }

    pub fn with_table(mut self, rows: &[&[&str]]) -> Self {
        self.table = Some(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        );
        self
    }

    pub fn with_images(mut self, count: usize) -> Self {
        self.images = count;
        self
    }
}

fn slide_xml(spec: &SlideSpec) -> String {
    let mut tree = String::new();
    for text in &spec.texts {
        tree.push_str(&format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Text\"/></p:nvSpPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>",
            text
        ));
    }
    if let Some(rows) = &spec.table {
        let body: String = rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|c| {
                        format!(
                            "<a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody></a:tc>",
                            c
                        )
                    })
                    .collect();
                format!("<a:tr h=\"370840\">{}</a:tr>", cells)
            })
            .collect();
        tree.push_str(&format!(
            "<p:graphicFrame><a:graphic><a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/table\"><a:tbl>{}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>",
            body
        ));
    }
    for n in 1..=spec.images {
        tree.push_str(&format!(
            "<p:pic><p:nvPicPr><p:cNvPr id=\"{}\" name=\"Picture\"/></p:nvPicPr><p:blipFill><a:blip r:embed=\"rIdImg{}\"/></p:blipFill></p:pic>",
            10 + n,
            n
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
        REL_NS, tree
    )
}

/// A .pptx package with slides in the given order.
pub fn pptx(slides: &[SlideSpec]) -> Vec<u8> {
    let order: Vec<usize> = (0..slides.len()).collect();
    pptx_ordered(slides, &order)
}

/// A .pptx package whose `p:sldIdLst` lists `slides[order[0]]` first, and so on.
///
/// Slide parts are numbered by their position in `slides`.
pub fn pptx_ordered(slides: &[SlideSpec], order: &[usize]) -> Vec<u8> {
    let ids: String = order
        .iter()
        .enumerate()
        .map(|(i, &slide)| format!(r#"<p:sldId id="{}" r:id="rIdSlide{}"/>"#, 256 + i, slide + 1))
        .collect();
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#,
        REL_NS, ids
    );
    let presentation_rels: Vec<(String, &str, String)> = (1..=slides.len())
        .map(|n| {
            (
                format!("rIdSlide{}", n),
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide",
                format!("slides/slide{}.xml", n),
            )
        })
        .collect();

    let mut parts = vec![
        part("[Content_Types].xml", content_types()),
        part(
            "_rels/.rels",
            relationships(&[(
                "rId1".to_string(),
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
                "ppt/presentation.xml".to_string(),
            )]),
        ),
        part("docProps/core.xml", core_properties("Quarterly Review", "Park")),
        part("ppt/presentation.xml", presentation),
        part(
            "ppt/_rels/presentation.xml.rels",
            relationships(&presentation_rels),
        ),
    ];

    let mut media = 0;
    for (i, spec) in slides.iter().enumerate() {
        let n = i + 1;
        parts.push(part(&format!("ppt/slides/slide{}.xml", n), slide_xml(spec)));
        let rels: Vec<(String, &str, String)> = (1..=spec.images)
            .map(|k| {
                media += 1;
                (
                    format!("rIdImg{}", k),
                    IMAGE_REL,
                    format!("../media/image{}.png", media),
                )
            })
            .collect();
        parts.push(part(
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            relationships(&rels),
        ));
    }
    for m in 1..=media {
        parts.push(part(&format!("ppt/media/image{}.png", m), PNG));
    }
    zip_package(&parts)
}

// ---------------------------------------------------------------------------
// Excel

fn column_name(mut index: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name
}

fn sheet_xml(rows: &[Vec<String>]) -> String {
    let mut data = String::new();
    for (r, row) in rows.iter().enumerate() {
        let mut cells = String::new();
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let reference = format!("{}{}", column_name(c), r + 1);
            if value.parse::<f64>().is_ok() {
                cells.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value));
            } else {
                cells.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    reference, value
                ));
            }
        }
        data.push_str(&format!(r#"<row r="{}">{}</row>"#, r + 1, cells));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        data
    )
}

/// A .xlsx workbook with the given sheets. Empty strings leave the cell unset.
pub fn xlsx(sheets: &[(&str, Vec<Vec<String>>)]) -> Vec<u8> {
    let entries: String = sheets
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                name,
                i + 1,
                i + 1
            )
        })
        .collect();
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{}"><sheets>{}</sheets></workbook>"#,
        REL_NS, entries
    );
    let workbook_rels: Vec<(String, &str, String)> = (1..=sheets.len())
        .map(|n| {
            (
                format!("rId{}", n),
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
                format!("worksheets/sheet{}.xml", n),
            )
        })
        .collect();

    let mut parts = vec![
        part("[Content_Types].xml", content_types()),
        part(
            "_rels/.rels",
            relationships(&[(
                "rId1".to_string(),
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
                "xl/workbook.xml".to_string(),
            )]),
        ),
        part("docProps/core.xml", core_properties("Budget", "Choi")),
        part("xl/workbook.xml", workbook),
        part("xl/_rels/workbook.xml.rels", relationships(&workbook_rels)),
    ];
    for (i, (_, rows)) in sheets.iter().enumerate() {
        parts.push(part(
            &format!("xl/worksheets/sheet{}.xml", i + 1),
            sheet_xml(rows),
        ));
    }
    zip_package(&parts)
}

/// A `rows` x `cols` grid: a header row of `Col N` followed by numbered values.
pub fn grid(rows: usize, cols: usize) -> Vec<Vec<String>> {
    (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| {
                    if r == 0 {
                        format!("Col {}", c + 1)
                    } else {
                        (r * 10 + c).to_string()
                    }
                })
                .collect()
        })
        .collect()
}

/// Convert a literal table to owned rows.
pub fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
    cells
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// PDF

/// A PDF with one page per entry, each showing its text in Helvetica.
pub fn pdf(pages: &[&str]) -> Vec<u8> {
    build_pdf(pages, false)
}

/// Like [`pdf`], with a 1x1 grayscale image XObject on every page.
pub fn pdf_with_images(pages: &[&str]) -> Vec<u8> {
    build_pdf(pages, true)
}

fn build_pdf(pages: &[&str], images: bool) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0x80],
    ));
    let resources_id = if images {
        doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Im1" => image_id },
        })
    } else {
        doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        })
    };

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Annual Report"),
        "Author" => Object::string_literal("Jung"),
        "CreationDate" => Object::string_literal("D:20240115093000Z"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
