//! The linear processing run: validate, insert, filter, aggregate, bind.

use crate::aggregate::AggregationEngine;
use crate::compute::ColumnComputer;
use crate::document::{BoundDocument, DocumentTypeBinder};
use crate::error::EngineResult;
use crate::header::{ColumnSource, HeaderSet};
use crate::output::OutputTable;
use crate::reference::ReferenceSnapshot;
use crate::warning::Warning;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};
use tradedoc_sheet::TableModel;

/// Where a run currently is. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Raw,
    ColumnsInserted,
    ColumnsFiltered,
    Aggregated,
    Bound,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Raw => "raw",
            Stage::ColumnsInserted => "columns_inserted",
            Stage::ColumnsFiltered => "columns_filtered",
            Stage::Aggregated => "aggregated",
            Stage::Bound => "bound",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of an unbound run.
///
/// Warning rows index the data rows of `output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTable {
    pub output: OutputTable,
    pub warnings: Vec<Warning>,
}

/// One processing run over one uploaded table.
///
/// The pipeline borrows the header set and owns a reference snapshot; every
/// table it builds is fresh, so independent runs can execute concurrently.
#[derive(Debug)]
pub struct TransformPipeline<'a> {
    headers: &'a HeaderSet,
    references: ReferenceSnapshot,
    stage: Stage,
}

impl<'a> TransformPipeline<'a> {
    #[must_use]
    pub fn new(headers: &'a HeaderSet, references: ReferenceSnapshot) -> Self {
        TransformPipeline {
            headers,
            references,
            stage: Stage::Raw,
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stage {next} does not follow {}", self.stage);
        debug!(from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
    }

    /// Run every stage up to aggregation.
    ///
    /// # Errors
    ///
    /// Fails before touching any row if the header set does not fit the
    /// table or the reference snapshot.
    pub fn process(mut self, table: TableModel) -> EngineResult<ProcessedTable> {
        let processed = self.run(table)?;
        self.advance(Stage::Done);
        Ok(processed)
    }

    /// Run every stage and bind the result to a document type.
    ///
    /// Nothing is returned on failure; a missing required field discards the
    /// processed table.
    pub fn process_and_bind(
        mut self,
        table: TableModel,
        binder: &DocumentTypeBinder,
        document_type_id: &str,
    ) -> EngineResult<BoundDocument> {
        let processed = self.run(table)?;
        let bound = binder.bind(processed, document_type_id)?;
        self.advance(Stage::Bound);
        self.advance(Stage::Done);
        Ok(bound)
    }

    fn run(&mut self, mut table: TableModel) -> EngineResult<ProcessedTable> {
        let headers = self.headers;
        headers.validate(table.columns(), &self.references)?;
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            headers = headers.headers.len(),
            "processing table"
        );

        let mut warnings = Vec::new();
        let computer = ColumnComputer::new(&self.references);
        for header in &headers.headers {
            if let ColumnSource::Inserted(rule) = &header.source {
                let computed = computer.compute(&header.name, rule, &table)?;
                warnings.extend(computed.warnings);
                table.append_column(&header.name, computed.values)?;
            }
        }
        self.advance(Stage::ColumnsInserted);

        let deleted: Vec<&str> = headers.deleted_columns().collect();
        if !deleted.is_empty() {
            table.remove_columns(&deleted)?;
        }
        self.advance(Stage::ColumnsFiltered);

        let spec = headers.aggregation_spec();
        if headers.sort_by_group && !spec.group_keys.is_empty() {
            table = sort_by_group(&table, &spec.group_keys, &mut warnings)?;
        }
        let aggregation = AggregationEngine::new().aggregate(&table, &spec)?;
        warnings.extend(aggregation.warnings);
        // A cell read by both a calculation and a total reports once.
        let mut seen = HashSet::new();
        warnings.retain(|w| seen.insert((w.row, w.column.clone(), w.kind)));
        self.advance(Stage::Aggregated);

        if !warnings.is_empty() {
            warn!(count = warnings.len(), "processing finished with warnings");
        }
        info!(
            rows = table.row_count(),
            summary_rows = aggregation.summary_rows.len(),
            "table processed"
        );

        Ok(ProcessedTable {
            output: OutputTable::new(table, aggregation.summary_rows),
            warnings,
        })
    }
}

/// Stable sort by the group key tuple; warning rows follow their rows.
fn sort_by_group(
    table: &TableModel,
    group_keys: &[String],
    warnings: &mut [Warning],
) -> EngineResult<TableModel> {
    let positions: Vec<usize> = group_keys
        .iter()
        .filter_map(|k| table.column_position(k))
        .collect();
    let keys: Vec<Vec<String>> = table
        .rows()
        .map(|row| positions.iter().map(|&p| row[p].key()).collect())
        .collect();

    let mut order: Vec<usize> = (0..table.row_count()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut sorted = TableModel::new(table.columns().to_vec())?;
    let mut new_position = vec![0; order.len()];
    for (new, &old) in order.iter().enumerate() {
        new_position[old] = new;
        if let Some(row) = table.row(old) {
            sorted.push_row(row.to_vec())?;
        }
    }
    for warning in warnings.iter_mut() {
        if let Some(&row) = new_position.get(warning.row) {
            warning.row = row;
        }
    }
    Ok(sorted)
}
