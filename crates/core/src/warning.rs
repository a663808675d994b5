use serde::{Deserialize, Serialize};
use std::fmt;
use tradedoc_sheet::CellValue;

/// What went wrong in a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Text where a number was expected; the cell counted as 0.
    NonNumeric,
    /// A ratio hit a zero divisor; the cell was left empty.
    DivisionByZero,
    /// A menu-list key had no match in the reference sheet; the cell was
    /// left empty.
    UnresolvedLookup,
}

/// A recoverable, per-cell problem recorded during processing.
///
/// `row` is the 0-based index of the data row; the `Display` form shows it
/// 1-based, the way users count spreadsheet rows below the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub row: usize,
    pub column: String,
    pub message: String,
}

impl Warning {
    pub fn non_numeric(row: usize, column: &str, value: &CellValue) -> Self {
        Warning {
            kind: WarningKind::NonNumeric,
            row,
            column: column.to_string(),
            message: format!("'{value}' is not a number, counted as 0"),
        }
    }

    pub fn division_by_zero(row: usize, column: &str) -> Self {
        Warning {
            kind: WarningKind::DivisionByZero,
            row,
            column: column.to_string(),
            message: "division by zero, left empty".to_string(),
        }
    }

    pub fn unresolved_lookup(row: usize, column: &str, key: &str, sheet: &str) -> Self {
        Warning {
            kind: WarningKind::UnresolvedLookup,
            row,
            column: column.to_string(),
            message: format!("key '{key}' not found in reference sheet '{sheet}', left empty"),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}, column '{}': {}",
            self.row + 1,
            self.column,
            self.message
        )
    }
}
