use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::table::TableModel;
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

/// Options for writing Excel files
#[derive(Debug, Clone, Default)]
pub struct XlsxWriteOptions {
    /// Worksheet name (defaults to the writer's own default)
    pub sheet_name: Option<String>,
    /// Data row indices written in bold, e.g. subtotal and total rows
    pub emphasized_rows: Vec<usize>,
}

impl XlsxWriteOptions {
    /// Set the worksheet name
    #[must_use]
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = Some(name.to_string());
        self
    }

    /// Set the rows written in bold
    #[must_use]
    pub fn with_emphasized_rows(mut self, rows: Vec<usize>) -> Self {
        self.emphasized_rows = rows;
        self
    }
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Bool(b) => CellValue::String(b.to_string()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Excel serial date (days since 1899-12-30)
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

fn workbook_error(e: impl std::fmt::Display) -> SheetError {
    SheetError::Workbook(e.to_string())
}

fn read_grid<P: AsRef<Path>>(path: P, sheet_name: Option<&str>) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook = open_workbook_auto(path.as_ref()).map_err(workbook_error)?;

    let name = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(SheetError::MissingHeaderRow)?,
    };
    if !workbook.sheet_names().contains(&name) {
        return Err(SheetError::SheetNotFound { name });
    }

    let range = workbook.worksheet_range(&name).map_err(workbook_error)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(data_to_cell_value).collect())
        .collect())
}

/// Read only the header row of the first worksheet of a workbook.
pub fn read_headers<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let mut grid = read_grid(path, None)?;
    // Keep the header row only
    if let Some(first) = grid.iter().position(|row| !row.iter().all(CellValue::is_empty)) {
        grid.truncate(first + 1);
    }
    Ok(TableModel::from_grid(grid)?.columns().to_vec())
}

impl TableModel {
    /// Load the first worksheet of a workbook (xlsx, xlsm, xls, xlsb, ods)
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or read, or has no header row.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        TableModel::from_grid(read_grid(path, None)?)
    }

    /// Load a specific worksheet of a workbook by name
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened, sheet not found, or read fails.
    pub fn from_xlsx_sheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Self> {
        TableModel::from_grid(read_grid(path, Some(sheet_name))?)
    }

    /// Save the table to an Excel file with a bold header row
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or written.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_as_xlsx_with_options(path, &XlsxWriteOptions::default())
    }

    /// Save the table to an Excel file with options
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or written.
    pub fn save_as_xlsx_with_options<P: AsRef<Path>>(
        &self,
        path: P,
        options: &XlsxWriteOptions,
    ) -> Result<()> {
        let mut workbook = Workbook::new();
        self.write_worksheet(&mut workbook, options)
            .map_err(workbook_error)?;
        workbook.save(path.as_ref()).map_err(workbook_error)?;
        Ok(())
    }

    fn write_worksheet(
        &self,
        workbook: &mut Workbook,
        options: &XlsxWriteOptions,
    ) -> std::result::Result<(), XlsxError> {
        let bold = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        if let Some(name) = &options.sheet_name {
            worksheet.set_name(name)?;
        }

        for (col_idx, name) in self.columns().iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, name, &bold)?;
        }

        for (row_idx, row) in self.rows().enumerate() {
            let row_num = (row_idx + 1) as u32;
            let emphasized = options.emphasized_rows.contains(&row_idx);
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num = col_idx as u16;
                match (cell, emphasized) {
                    (CellValue::Empty, _) => {}
                    (CellValue::Number(n), false) => {
                        worksheet.write_number(row_num, col_num, *n)?;
                    }
                    (CellValue::Number(n), true) => {
                        worksheet.write_number_with_format(row_num, col_num, *n, &bold)?;
                    }
                    (CellValue::String(s), false) => {
                        worksheet.write_string(row_num, col_num, s)?;
                    }
                    (CellValue::String(s), true) => {
                        worksheet.write_string_with_format(row_num, col_num, s, &bold)?;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_xlsx_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.xlsx");

        let table = TableModel::from_csv_str("ITEM,CTNS\nCABLE,10\nADAPTER,4").unwrap();
        table.save_as_xlsx(&path).unwrap();

        let loaded = TableModel::from_xlsx(&path).unwrap();
        assert_eq!(loaded.columns(), ["ITEM", "CTNS"]);
        assert_eq!(loaded.row_count(), 2);
        assert_eq!(loaded.get(1, "CTNS"), Some(&CellValue::Number(4.0)));
    }

    #[test]
    fn test_read_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("headers.xlsx");

        let table = TableModel::from_csv_str("ITEM,MODEL,QTY/CTN\nCABLE,USB,100").unwrap();
        table.save_as_xlsx(&path).unwrap();

        assert_eq!(read_headers(&path).unwrap(), ["ITEM", "MODEL", "QTY/CTN"]);
    }

    #[test]
    fn test_named_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("named.xlsx");

        let table = TableModel::from_csv_str("code,name\nP1,Port").unwrap();
        let options = XlsxWriteOptions::default()
            .with_sheet_name("Ports")
            .with_emphasized_rows(vec![0]);
        table.save_as_xlsx_with_options(&path, &options).unwrap();

        let loaded = TableModel::from_xlsx_sheet(&path, "Ports").unwrap();
        assert_eq!(loaded, table);

        let missing = TableModel::from_xlsx_sheet(&path, "Nope");
        assert!(matches!(missing, Err(SheetError::SheetNotFound { .. })));
    }
}
