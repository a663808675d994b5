//! Table model for tradedoc
//!
//! Provides the in-memory representation of an uploaded spreadsheet: ordered,
//! unique column names and rows of loosely-typed cells, plus loaders for the
//! container formats users upload and writers for generated output.
//!
//! # Examples
//!
//! ## Parsing CSV text
//!
//! ```
//! use tradedoc_sheet::{CellValue, TableModel};
//!
//! let table = TableModel::from_csv_str("item,qty\nA,2\nB,3").unwrap();
//!
//! assert_eq!(table.columns(), ["item", "qty"]);
//! assert_eq!(table.get(1, "qty"), Some(&CellValue::Number(3.0)));
//! ```
//!
//! ## Explicit numeric coercion
//!
//! ```
//! use tradedoc_sheet::{CellValue, Coerced};
//!
//! assert_eq!(CellValue::from(" 12 ").coerce_number(), Coerced::Number(12.0));
//! assert_eq!(CellValue::from("n/a").coerce_number().or_zero(), 0.0);
//! ```
//!
//! ## Loading from disk
//!
//! ```no_run
//! use tradedoc_sheet::TableModel;
//!
//! let table = TableModel::from_path("packing.xlsx").unwrap();
//! ```

mod cell;
mod csv;
mod error;
mod json;
mod load;
mod table;
mod xlsx;

/// Re-export cell value types.
pub use cell::{CellValue, Coerced};
/// Re-export CSV options.
pub use csv::CsvOptions;
/// Re-export error types.
pub use error::{Result, SheetError};
/// Re-export format detection.
pub use load::TableFormat;
/// Re-export table types.
pub use table::{Record, TableModel};
/// Re-export workbook helpers.
pub use xlsx::{read_headers, XlsxWriteOptions};
