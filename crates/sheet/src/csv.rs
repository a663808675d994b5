use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::table::TableModel;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// CSV reader/writer options
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Whether to use type inference when reading
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            quote: b'"',
            infer_types: true,
        }
    }
}

impl CsvOptions {
    /// Create options for TSV (tab-separated values)
    #[must_use]
    pub fn tsv() -> Self {
        CsvOptions {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether to infer types
    #[must_use]
    pub fn with_type_inference(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }
}

impl TableModel {
    /// Load a table from a CSV file whose first record is the header row
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_csv_path_with_options(path, CsvOptions::default())
    }

    /// Load a table from a CSV file with custom options
    pub fn from_csv_path_with_options<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(BufReader::new(file), options)
    }

    /// Load a table from a CSV string
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes(), CsvOptions::default())
    }

    /// Load a table from a reader
    pub fn from_csv_reader<R: Read>(reader: R, options: CsvOptions) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false) // We handle headers ourselves
            .flexible(true)
            .from_reader(reader);

        let mut grid: Vec<Vec<CellValue>> = Vec::new();
        let mut header_seen = false;

        for result in csv_reader.records() {
            let record = result?;
            let row: Vec<CellValue> = record
                .iter()
                .map(|field| {
                    // Header names are never numbers
                    if options.infer_types && header_seen {
                        CellValue::parse(field)
                    } else if field.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::String(field.to_string())
                    }
                })
                .collect();
            if !header_seen && row.iter().any(|cell| !cell.is_empty()) {
                header_seen = true;
            }
            grid.push(row);
        }

        TableModel::from_grid(grid)
    }

    /// Save the table to a CSV file, header row first
    pub fn save_as_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file), &CsvOptions::default())
    }

    /// Write the table to a writer as CSV
    pub fn write_csv<W: Write>(&self, writer: W, options: &CsvOptions) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .from_writer(writer);

        csv_writer.write_record(self.columns())?;
        for row in self.rows() {
            let record: Vec<String> = row.iter().map(ToString::to_string).collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Convert the table to a CSV string
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer, &CsvOptions::default())?;
        String::from_utf8(buffer).map_err(|e| SheetError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_csv_str() {
        let csv = "item,qty,price\nA,2,10\nB,1,5";
        let table = TableModel::from_csv_str(csv).unwrap();

        assert_eq!(table.columns(), ["item", "qty", "price"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, "item"), Some(&CellValue::from("A")));
        assert_eq!(table.get(1, "price"), Some(&CellValue::Number(5.0)));
    }

    #[test]
    fn test_numeric_headers_stay_text() {
        let table = TableModel::from_csv_str("2024,name\n1,x").unwrap();
        assert_eq!(table.columns(), ["2024", "name"]);
    }

    #[test]
    fn test_trims_headers_and_skips_blank_rows() {
        let csv = " ITEM , CTNS \nCABLE,10\n,\nADAPTER,4\n";
        let table = TableModel::from_csv_str(csv).unwrap();

        assert_eq!(table.columns(), ["ITEM", "CTNS"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_without_type_inference() {
        let options = CsvOptions::default().with_type_inference(false);
        let table = TableModel::from_csv_reader("code\n007".as_bytes(), options).unwrap();
        assert_eq!(table.get(0, "code"), Some(&CellValue::from("007")));
    }

    #[test]
    fn test_identifier_text_is_kept() {
        let table = TableModel::from_csv_str("HS Code,PI Number,CTNS\n0101.21,00123,12\n").unwrap();

        assert_eq!(table.get(0, "HS Code"), Some(&CellValue::from("0101.21")));
        assert_eq!(table.get(0, "PI Number"), Some(&CellValue::from("00123")));
        assert_eq!(table.get(0, "CTNS"), Some(&CellValue::Number(12.0)));
        assert_eq!(
            table.to_csv_string().unwrap(),
            "HS Code,PI Number,CTNS\n0101.21,00123,12\n"
        );
    }

    #[test]
    fn test_save_and_load_csv_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.csv");

        let table = TableModel::from_csv_str("a,b\n1,x\n2,y").unwrap();
        table.save_as_csv(&file_path).unwrap();

        let loaded = TableModel::from_csv_path(&file_path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_to_csv_string() {
        let table = TableModel::from_csv_str("name,total\nA,50").unwrap();
        assert_eq!(table.to_csv_string().unwrap(), "name,total\nA,50\n");
    }
}
