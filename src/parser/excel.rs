//! Excel (.xlsx, .xls) parser using calamine.
//!
//! One content unit per worksheet, labelled `Sheet: <name>`, whose used
//! range becomes a single table. Unit text stays empty: cell values live in
//! the table.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::ooxml::Package;
use super::options::ParseOptions;
use super::Extraction;
use crate::detect::{detect_container, Container};
use crate::error::{Error, Result};

/// Excel workbook parser.
#[derive(Debug, Clone, Default)]
pub struct ExcelParser {
    options: ParseOptions,
}

impl ExcelParser {
    /// Create a parser with the given options.
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub(crate) fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub(crate) fn extract(&self, data: &[u8], out: &mut Extraction) -> Result<()> {
        match detect_container(data) {
            Container::Zip => {
                // calamine does not expose document properties
                let mut package = Package::open(data)?;
                package.core_properties(&mut out.builder)?;
            }
            Container::Cfb if out.builder.filename().to_ascii_lowercase().ends_with(".xlsx") => {
                return Err(Error::PasswordProtected);
            }
            Container::Cfb => {}
            _ => {
                return Err(Error::CorruptFile(
                    "not a spreadsheet container".to_string(),
                ))
            }
        }

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data)).map_err(|e| {
            let message = e.to_string();
            if message.to_ascii_lowercase().contains("password") {
                Error::PasswordProtected
            } else {
                Error::CorruptFile(message)
            }
        })?;

        let names: Vec<String> = workbook.sheet_names().to_vec();
        for name in &names {
            let range = workbook
                .worksheet_range(name)
                .map_err(|e| Error::DependencyFailure(format!("sheet {}: {}", name, e)))?;

            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| self.format_row(row))
                .collect();

            let unit = out.builder.push_unit(format!("Sheet: {}", name), "");
            if rows.iter().any(|r| !r.is_empty()) {
                out.builder.push_table(unit, rows);
            } else {
                log::debug!("Sheet {} is empty; no table emitted", name);
            }
        }

        out.builder
            .set_metadata("sheet_count", names.len().to_string());
        out.builder.set_metadata("sheet_names", names.join(", "));
        Ok(())
    }

    /// Format a row, dropping trailing empty cells. Interior blanks stay.
    fn format_row(&self, row: &[Data]) -> Vec<String> {
        let mut cells: Vec<String> = row.iter().map(|c| self.format_cell(c)).collect();
        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        cells
    }

    fn format_cell(&self, cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => self.options.clean_text(s),
            Data::Float(f) => format_float(*f),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            Data::Error(e) => e.to_string(),
            Data::DateTime(dt) => dt.to_string(),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
        }
    }
}

/// Plain-text number: integral values print without a fractional part.
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
