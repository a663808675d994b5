use crate::aggregate::{SummaryKind, SummaryRow};
use crate::error::EngineResult;
use serde::{Deserialize, Serialize};
use tradedoc_sheet::{CellValue, TableModel};

/// Processed data rows with their summary rows kept as a separate sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTable {
    pub data: TableModel,
    pub summary_rows: Vec<SummaryRow>,
    /// Set once the table has been bound to a document type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type_id: Option<String>,
}

/// Presentation grid with summary rows interleaved after their groups.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTable {
    pub table: TableModel,
    /// Row indices in `table` that hold summary rows.
    pub summary_positions: Vec<usize>,
}

impl RenderedTable {
    #[must_use]
    pub fn is_summary(&self, row: usize) -> bool {
        self.summary_positions.binary_search(&row).is_ok()
    }
}

impl OutputTable {
    #[must_use]
    pub fn new(data: TableModel, summary_rows: Vec<SummaryRow>) -> Self {
        OutputTable {
            data,
            summary_rows,
            document_type_id: None,
        }
    }

    /// Column names in display order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.data.columns()
    }

    /// Get the number of data rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.row_count()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.data.has_column(name)
    }

    #[must_use]
    pub fn grand_total(&self) -> Option<&SummaryRow> {
        self.summary_rows.iter().find(|s| s.is_grand_total())
    }

    pub fn subtotals(&self) -> impl Iterator<Item = &SummaryRow> {
        self.summary_rows
            .iter()
            .filter(|s| s.kind == SummaryKind::Subtotal)
    }

    /// Interleave summary rows with data rows for display or export.
    ///
    /// Each subtotal follows the last row of its group, labeled
    /// `"<group> Subtotal"`; the grand total comes last, labeled
    /// `"Grand Total"`. Labels go in the first column that carries no totals.
    pub fn render(&self) -> EngineResult<RenderedTable> {
        let columns = self.data.columns();
        let label_column = columns.iter().position(|name| {
            !self
                .summary_rows
                .iter()
                .any(|s| s.values.contains_key(name))
        });

        let mut table = TableModel::new(columns.to_vec())?;
        let mut summary_positions = Vec::with_capacity(self.summary_rows.len());
        let mut subtotals = self.subtotals().peekable();

        for (idx, row) in self.data.rows().enumerate() {
            table.push_row(row.to_vec())?;
            while let Some(summary) = subtotals.next_if(|s| s.end_row() == idx + 1) {
                summary_positions.push(table.row_count());
                table.push_row(summary_cells(columns, summary, label_column))?;
            }
        }
        // Ranges that do not end on a data row.
        for summary in subtotals {
            summary_positions.push(table.row_count());
            table.push_row(summary_cells(columns, summary, label_column))?;
        }

        if let Some(grand) = self.grand_total() {
            summary_positions.push(table.row_count());
            table.push_row(summary_cells(columns, grand, label_column))?;
        }

        Ok(RenderedTable {
            table,
            summary_positions,
        })
    }
}

fn summary_cells(columns: &[String], summary: &SummaryRow, label_column: Option<usize>) -> Vec<CellValue> {
    let mut cells: Vec<CellValue> = columns
        .iter()
        .map(|name| {
            summary
                .values
                .get(name)
                .map_or(CellValue::Empty, |n| CellValue::Number(*n))
        })
        .collect();

    if let Some(pos) = label_column {
        cells[pos] = CellValue::String(match (&summary.kind, &summary.group_value) {
            (SummaryKind::Subtotal, Some(group)) => format!("{group} Subtotal"),
            (SummaryKind::Subtotal, None) => "Subtotal".to_string(),
            (SummaryKind::GrandTotal, _) => "Grand Total".to_string(),
        });
    }
    cells
}
