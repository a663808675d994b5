use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single row keyed by column name, in column order.
pub type Record = IndexMap<String, CellValue>;

/// An uploaded table: unique, ordered column names and ordered rows.
///
/// Rows are stored row-major and always hold exactly one value per column,
/// so every row has an entry (possibly [`CellValue::Empty`]) for every
/// declared column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "TableRecords", into = "TableRecords")]
pub struct TableModel {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

/// Serialized form of a table: column list plus one object per row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableRecords {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Record>,
}

impl TryFrom<TableRecords> for TableModel {
    type Error = SheetError;

    fn try_from(value: TableRecords) -> Result<Self> {
        if value.columns.is_empty() {
            return TableModel::from_records(value.rows);
        }
        let mut table = TableModel::new(value.columns)?;
        for record in value.rows {
            table.push_record(record)?;
        }
        Ok(table)
    }
}

impl From<TableModel> for TableRecords {
    fn from(table: TableModel) -> Self {
        TableRecords {
            rows: table.to_records(),
            columns: table.columns,
        }
    }
}

impl TableModel {
    /// Create an empty table with the given columns
    ///
    /// # Errors
    ///
    /// Returns `SheetError::DuplicateColumnName` if a name appears twice.
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut column_index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if column_index.insert(name.clone(), i).is_some() {
                return Err(SheetError::DuplicateColumnName { name: name.clone() });
            }
        }
        Ok(TableModel {
            columns,
            column_index,
            rows: Vec::new(),
        })
    }

    /// Create a table from column names and positional rows
    pub fn from_rows<S, T>(columns: Vec<S>, rows: Vec<Vec<T>>) -> Result<Self>
    where
        S: Into<String>,
        T: Into<CellValue>,
    {
        let mut table = TableModel::new(columns)?;
        for row in rows {
            table.push_row(row.into_iter().map(Into::into).collect())?;
        }
        Ok(table)
    }

    /// Create a table from a list of records.
    ///
    /// Columns are taken in first-seen order across all records; keys missing
    /// from a record are filled with `Empty`.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = TableModel::new(columns)?;
        for record in records {
            table.push_record(record)?;
        }
        Ok(table)
    }

    /// Create a table from a raw grid whose first non-blank row holds the
    /// headers.
    ///
    /// Header cells are trimmed and blank header cells drop their column.
    /// Short rows are padded with `Empty`, cells past the last header are
    /// ignored, and rows with no data in any kept column are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::MissingHeaderRow` when the grid has no non-blank
    /// row or the header row has no non-blank cell.
    pub fn from_grid(grid: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut rows = grid
            .into_iter()
            .skip_while(|row| row.iter().all(CellValue::is_empty));
        let header = rows.next().ok_or(SheetError::MissingHeaderRow)?;

        let kept: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .map(|(i, cell)| (i, cell.to_string().trim().to_string()))
            .filter(|(_, name)| !name.is_empty())
            .collect();
        if kept.is_empty() {
            return Err(SheetError::MissingHeaderRow);
        }

        let mut table = TableModel::new(kept.iter().map(|(_, name)| name.clone()).collect())?;
        for mut row in rows {
            let values: Vec<CellValue> = kept
                .iter()
                .map(|(i, _)| row.get_mut(*i).map(std::mem::take).unwrap_or_default())
                .collect();
            if values.iter().all(CellValue::is_empty) {
                continue;
            }
            table.push_row(values)?;
        }
        Ok(table)
    }

    /// Column names in display order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    /// Position of a column in display order
    #[must_use]
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.column_position(name)
            .ok_or_else(|| SheetError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    /// Append a positional row
    ///
    /// # Errors
    ///
    /// Returns `SheetError::LengthMismatch` if the row width differs from the
    /// column count.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SheetError::LengthMismatch {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a record, filling missing columns with `Empty`
    ///
    /// # Errors
    ///
    /// Returns `SheetError::ColumnNotFound` if the record names a column the
    /// table does not declare.
    pub fn push_record(&mut self, record: Record) -> Result<()> {
        let mut row = vec![CellValue::Empty; self.columns.len()];
        for (key, value) in record {
            let idx = self.require_column(&key)?;
            row[idx] = value;
        }
        self.rows.push(row);
        Ok(())
    }

    /// Get a row by index
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Iterate over rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Get a cell by row index and column name
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_position(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Get all values of a column
    pub fn column(&self, name: &str) -> Result<Vec<&CellValue>> {
        let col = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[col]).collect())
    }

    /// Append a new column at the end
    ///
    /// # Errors
    ///
    /// Fails if the name already exists or the value count differs from the
    /// row count.
    pub fn append_column(&mut self, name: &str, values: Vec<CellValue>) -> Result<()> {
        if self.has_column(name) {
            return Err(SheetError::DuplicateColumnName {
                name: name.to_string(),
            });
        }
        if values.len() != self.rows.len() {
            return Err(SheetError::ColumnLengthMismatch {
                name: name.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }

        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        self.column_index.insert(name.to_string(), self.columns.len());
        self.columns.push(name.to_string());
        Ok(())
    }

    /// Remove the specified columns, keeping the order of the rest
    pub fn remove_columns(&mut self, names: &[&str]) -> Result<()> {
        let mut remove = vec![false; self.columns.len()];
        for name in names {
            remove[self.require_column(name)?] = true;
        }

        for row in &mut self.rows {
            let mut idx = 0;
            row.retain(|_| {
                let keep = !remove[idx];
                idx += 1;
                keep
            });
        }

        let mut idx = 0;
        self.columns.retain(|_| {
            let keep = !remove[idx];
            idx += 1;
            keep
        });
        self.rebuild_column_index();
        Ok(())
    }

    /// Convert to a list of records (list of dictionaries)
    ///
    /// Column order is preserved in each record.
    #[must_use]
    pub fn to_records(&self) -> Vec<Record> {
        self.rows.iter().map(|row| self.to_record(row)).collect()
    }

    fn to_record(&self, row: &[CellValue]) -> Record {
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }

    fn rebuild_column_index(&mut self) {
        self.column_index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
    }
}
