//! JSON support for tables
//!
//! Reads the array-of-objects layout produced by spreadsheet web clients:
//! `[{"ITEM": "CABLE", "CTNS": 10}, ...]`

use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::table::{Record, TableModel};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

impl TableModel {
    /// Load a table from a JSON file containing an array of objects
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SheetError::Parse(format!("Invalid JSON: {e}")))?;
        Self::from_json_value(&value)
    }

    /// Load a table from a JSON string containing an array of objects
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| SheetError::Parse(format!("Invalid JSON: {e}")))?;
        Self::from_json_value(&value)
    }

    /// Build a table from an already parsed JSON array of objects.
    ///
    /// Column order follows first appearance across the objects.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| SheetError::Parse("JSON must be an array of objects".to_string()))?;

        let mut records: Vec<Record> = Vec::with_capacity(array.len());
        for (idx, item) in array.iter().enumerate() {
            let obj = item.as_object().ok_or_else(|| {
                SheetError::Parse(format!("Element at index {idx} must be an object"))
            })?;
            records.push(
                obj.iter()
                    .map(|(k, v)| (k.trim().to_string(), json_value_to_cell(v)))
                    .collect(),
            );
        }

        TableModel::from_records(records)
    }
}

/// Convert a JSON value to a cell
fn json_value_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::String(b.to_string()),
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| CellValue::String(n.to_string()), CellValue::Number),
        Value::String(s) => CellValue::String(s.clone()),
        Value::Array(_) | Value::Object(_) => CellValue::String(value.to_string()),
    }
}
