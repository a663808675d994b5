use thiserror::Error;

/// Errors that can occur while building, loading or writing tables
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("Duplicate column name: {name}")]
    DuplicateColumnName { name: String },

    #[error("Row {row} has {actual} values, table has {expected} columns")]
    LengthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Column '{name}' has {actual} values, table has {expected} rows")]
    ColumnLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("No header row found")]
    MissingHeaderRow,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
