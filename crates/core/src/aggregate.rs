//! Subtotal and grand-total computation.
//!
//! Groups are contiguous runs of rows sharing the same discriminator values,
//! detected by value change in row order. Rows are never regrouped, so the
//! same item appearing twice apart yields two subtotal rows.

use crate::error::{EngineError, EngineResult};
use crate::header::AggregationSpec;
use crate::warning::Warning;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tradedoc_sheet::TableModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    Subtotal,
    GrandTotal,
}

/// A derived row holding the totals of a range of data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub kind: SummaryKind,
    /// Display form of the discriminator values; `None` for the grand total.
    pub group_value: Option<String>,
    /// Totals keyed by column, in table column order.
    pub values: IndexMap<String, f64>,
    /// First data row covered.
    pub start_row: usize,
    /// Number of data rows covered.
    pub row_count: usize,
}

impl SummaryRow {
    #[must_use]
    pub fn is_grand_total(&self) -> bool {
        self.kind == SummaryKind::GrandTotal
    }

    /// Index one past the last data row covered.
    #[must_use]
    pub fn end_row(&self) -> usize {
        self.start_row + self.row_count
    }
}

/// Summary rows in emission order plus coercion warnings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregation {
    pub summary_rows: Vec<SummaryRow>,
    pub warnings: Vec<Warning>,
}

/// Stateless aggregation over a filtered table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationEngine;

struct Run {
    key: Vec<String>,
    label: String,
    start: usize,
    totals: Vec<f64>,
}

impl AggregationEngine {
    #[must_use]
    pub fn new() -> Self {
        AggregationEngine
    }

    /// Compute subtotal rows followed by the grand-total row.
    ///
    /// Blank and non-numeric cells contribute 0; each non-numeric cell
    /// raises one warning.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownColumn` if the spec names a column the
    /// table does not have.
    pub fn aggregate(&self, table: &TableModel, spec: &AggregationSpec) -> EngineResult<Aggregation> {
        for name in spec
            .sum_columns
            .iter()
            .chain(&spec.subtotal_columns)
            .chain(&spec.grand_total_columns)
            .chain(&spec.group_keys)
        {
            if !table.has_column(name) {
                return Err(EngineError::UnknownColumn {
                    column: name.clone(),
                });
            }
        }

        if spec.is_empty() {
            return Ok(Aggregation::default());
        }

        // Aggregated columns in table order, with their positions.
        let grand: Vec<(usize, &String)> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| spec.in_grand_total(name))
            .collect();
        let subtotal: Vec<usize> = (0..grand.len())
            .filter(|&i| spec.in_subtotal(grand[i].1))
            .collect();
        let key_positions: Vec<usize> = spec
            .group_keys
            .iter()
            .filter_map(|k| table.column_position(k))
            .collect();

        let mut aggregation = Aggregation::default();
        let mut grand_totals = vec![0.0; grand.len()];
        let mut run: Option<Run> = None;

        for (idx, row) in table.rows().enumerate() {
            let amounts: Vec<f64> = grand
                .iter()
                .map(|&(pos, name)| {
                    let coerced = row[pos].coerce_number();
                    if coerced.is_not_numeric() {
                        aggregation
                            .warnings
                            .push(Warning::non_numeric(idx, name, &row[pos]));
                    }
                    coerced.or_zero()
                })
                .collect();

            for (total, amount) in grand_totals.iter_mut().zip(&amounts) {
                *total += amount;
            }

            if !spec.has_subtotals() {
                continue;
            }

            let key: Vec<String> = key_positions.iter().map(|&p| row[p].key()).collect();
            if run.as_ref().is_some_and(|r| r.key != key) {
                if let Some(done) = run.take() {
                    aggregation
                        .summary_rows
                        .push(close_run(done, idx, &grand, &subtotal));
                }
            }
            let current = run.get_or_insert_with(|| Run {
                label: key_positions
                    .iter()
                    .map(|&p| row[p].to_string().trim().to_string())
                    .collect::<Vec<_>>()
                    .join(" / "),
                key,
                start: idx,
                totals: vec![0.0; subtotal.len()],
            });
            for (total, &i) in current.totals.iter_mut().zip(&subtotal) {
                *total += amounts[i];
            }
        }

        if let Some(done) = run.take() {
            aggregation
                .summary_rows
                .push(close_run(done, table.row_count(), &grand, &subtotal));
        }

        aggregation.summary_rows.push(SummaryRow {
            kind: SummaryKind::GrandTotal,
            group_value: None,
            values: grand
                .iter()
                .map(|(_, name)| (*name).clone())
                .zip(grand_totals)
                .collect(),
            start_row: 0,
            row_count: table.row_count(),
        });

        Ok(aggregation)
    }
}

fn close_run(run: Run, end: usize, grand: &[(usize, &String)], subtotal: &[usize]) -> SummaryRow {
    SummaryRow {
        kind: SummaryKind::Subtotal,
        group_value: Some(run.label),
        values: subtotal
            .iter()
            .map(|&i| grand[i].1.clone())
            .zip(run.totals)
            .collect(),
        start_row: run.start,
        row_count: end - run.start,
    }
}

/// Distinct group keys in a table, useful to contrast with run counts.
#[must_use]
pub fn distinct_groups(table: &TableModel, group_keys: &[String]) -> usize {
    let positions: Vec<usize> = group_keys
        .iter()
        .filter_map(|k| table.column_position(k))
        .collect();
    table
        .rows()
        .map(|row| positions.iter().map(|&p| row[p].key()).collect::<Vec<_>>())
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradedoc_sheet::CellValue;

    fn spec(subtotal: &[&str], sum: &[&str], grand: &[&str], keys: &[&str]) -> AggregationSpec {
        let owned = |xs: &[&str]| xs.iter().map(ToString::to_string).collect();
        AggregationSpec {
            sum_columns: owned(sum),
            subtotal_columns: owned(subtotal),
            grand_total_columns: owned(grand),
            group_keys: owned(keys),
        }
    }

    fn shipments() -> TableModel {
        TableModel::from_rows(
            vec!["item", "ctns", "nw", "value"],
            vec![
                vec![CellValue::from("A"), CellValue::from(2), CellValue::from(1.5), CellValue::from(100)],
                vec![CellValue::from("A"), CellValue::from(3), CellValue::from(2), CellValue::from(50)],
                vec![CellValue::from("B"), CellValue::from(1), CellValue::Empty, CellValue::from(10)],
                vec![CellValue::from("A"), CellValue::from("x"), CellValue::from(1), CellValue::from(5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_runs_follow_row_order() {
        let result = AggregationEngine::new()
            .aggregate(&shipments(), &spec(&["ctns"], &["nw"], &["value"], &["item"]))
            .unwrap();

        let rows = &result.summary_rows;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].group_value.as_deref(), Some("A"));
        assert_eq!(rows[0].values["ctns"], 5.0);
        assert_eq!(rows[0].values["nw"], 3.5);
        assert!(!rows[0].values.contains_key("value"));
        assert_eq!((rows[0].start_row, rows[0].row_count), (0, 2));
        assert_eq!(rows[1].group_value.as_deref(), Some("B"));
        assert_eq!(rows[2].group_value.as_deref(), Some("A"));
        assert_eq!(rows[2].values["ctns"], 0.0);

        let grand = &rows[3];
        assert!(grand.is_grand_total());
        assert_eq!(grand.values["ctns"], 6.0);
        assert_eq!(grand.values["value"], 165.0);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].row, 3);
    }

    #[test]
    fn test_sum_without_subtotal_only_grand_total() {
        let result = AggregationEngine::new()
            .aggregate(&shipments(), &spec(&[], &["nw"], &[], &[]))
            .unwrap();
        assert_eq!(result.summary_rows.len(), 1);
        assert_eq!(result.summary_rows[0].values["nw"], 4.5);
    }

    #[test]
    fn test_no_aggregated_columns() {
        let result = AggregationEngine::new()
            .aggregate(&shipments(), &AggregationSpec::default())
            .unwrap();
        assert!(result.summary_rows.is_empty());
    }

    #[test]
    fn test_empty_table_still_has_grand_total() {
        let table = TableModel::new(vec!["item", "ctns"]).unwrap();
        let result = AggregationEngine::new()
            .aggregate(&table, &spec(&["ctns"], &[], &[], &["item"]))
            .unwrap();
        assert_eq!(result.summary_rows.len(), 1);
        assert_eq!(result.summary_rows[0].values["ctns"], 0.0);
    }

    #[test]
    fn test_unknown_column() {
        let err = AggregationEngine::new()
            .aggregate(&shipments(), &spec(&["gw"], &[], &[], &["item"]))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownColumn { .. }));
    }

    #[test]
    fn test_distinct_groups() {
        assert_eq!(distinct_groups(&shipments(), &["item".to_string()]), 2);
    }
}
