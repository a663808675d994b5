use crate::csv::CsvOptions;
use crate::error::{Result, SheetError};
use crate::table::TableModel;
use std::path::Path;

/// Container formats a table can be loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Json,
    Workbook,
}

impl TableFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "tsv" => Ok(TableFormat::Tsv),
            "json" => Ok(TableFormat::Json),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(TableFormat::Workbook),
            other => Err(SheetError::Parse(format!(
                "Unsupported file extension '{other}' for {}",
                path.as_ref().display()
            ))),
        }
    }
}

impl TableModel {
    /// Load a table, picking the loader from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match TableFormat::from_path(path)? {
            TableFormat::Csv => TableModel::from_csv_path(path),
            TableFormat::Tsv => TableModel::from_csv_path_with_options(path, CsvOptions::tsv()),
            TableFormat::Json => TableModel::from_json_path(path),
            TableFormat::Workbook => TableModel::from_xlsx(path),
        }
    }
}
