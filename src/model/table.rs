//! Table types.

use serde::{Deserialize, Serialize};

/// A table attached to a content unit.
///
/// Rows may have different lengths. A row that omits trailing empty cells
/// keeps its shorter length; nothing pads or truncates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Owning content unit
    pub unit_index: u32,

    /// Cell values, row by row
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table for a unit.
    pub fn new(unit_index: u32, rows: Vec<Vec<String>>) -> Self {
        Self { unit_index, rows }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether any row is shorter than the widest one.
    pub fn is_ragged(&self) -> bool {
        let width = self.column_count();
        self.rows.iter().any(|r| r.len() != width)
    }

    /// Get plain text representation of the table (tab-separated).
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
