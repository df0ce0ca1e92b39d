//! CSV rendering of a document's tables.

use crate::model::Document;

/// Convert a document's tables to CSV.
///
/// A single table is written as-is. With several tables, each is preceded by
/// a one-field label row naming its unit. A document without tables renders
/// to an empty string. Rows keep their own field count.
pub fn to_csv(doc: &Document) -> String {
    let tables = doc.tables();
    let labelled = tables.len() > 1;
    let mut output = String::new();

    for table in tables {
        if labelled {
            let label = match doc.unit(table.unit_index) {
                Some(unit) => format!("{} (unit {})", unit.unit_label, table.unit_index),
                None => format!("unit {}", table.unit_index),
            };
            push_record(&mut output, std::slice::from_ref(&label));
        }
        for row in &table.rows {
            push_record(&mut output, row);
        }
    }

    output
}

fn push_record(output: &mut String, fields: &[String]) {
    let record: Vec<String> = fields.iter().map(|f| quote_field(f)).collect();
    output.push_str(&record.join(","));
    output.push('\n');
}

/// Quote a field when it contains a delimiter, quote, or line break.
fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentBuilder, FileType};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("plain"), "plain");
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_no_tables_is_empty() {
        let mut b = DocumentBuilder::new("memo.docx", FileType::Word);
        b.push_unit("Section 1", "Only prose");
        assert_eq!(to_csv(&b.build()), "");
    }

    #[test]
    fn test_single_table_unlabelled() {
        let mut b = DocumentBuilder::new("book.xlsx", FileType::Excel);
        let sheet = b.push_unit("Sheet: Data", "");
        b.push_table(sheet, vec![row(&["a", "b"]), row(&["1"]), vec![], row(&["x", "y", "z"])]);

        assert_eq!(to_csv(&b.build()), "a,b\n1\n\nx,y,z\n");
    }

    #[test]
    fn test_multiple_tables_labelled() {
        let mut b = DocumentBuilder::new("deck.pptx", FileType::PowerPoint);
        let first = b.push_unit("Slide 1", "");
        let second = b.push_unit("Slide 2", "");
        b.push_table(first, vec![row(&["a"])]);
        b.push_table(second, vec![row(&["b", "c"])]);

        assert_eq!(
            to_csv(&b.build()),
            "Slide 1 (unit 1)\na\nSlide 2 (unit 2)\nb,c\n"
        );
    }
}
