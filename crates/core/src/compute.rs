//! Materialization of inserted columns.

use crate::error::{EngineError, EngineResult};
use crate::header::{CalcOperator, InsertionRule};
use crate::pattern::NumberPattern;
use crate::reference::ReferenceSnapshot;
use crate::warning::Warning;
use std::collections::HashMap;
use tradedoc_sheet::{CellValue, TableModel};

/// Values of one inserted column plus the soft warnings raised while
/// computing them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Computed {
    pub values: Vec<CellValue>,
    pub warnings: Vec<Warning>,
}

/// Evaluates insertion rules against a table.
///
/// Menu-list rules read from the reference snapshot the computer was built
/// with; nothing else is consulted.
#[derive(Debug, Clone, Copy)]
pub struct ColumnComputer<'a> {
    references: &'a ReferenceSnapshot,
}

impl<'a> ColumnComputer<'a> {
    #[must_use]
    pub fn new(references: &'a ReferenceSnapshot) -> Self {
        ColumnComputer { references }
    }

    /// Check a rule without touching any row.
    ///
    /// `is_available` answers whether a column exists at this point of the
    /// header order.
    pub fn check<F>(&self, column: &str, rule: &InsertionRule, is_available: F) -> EngineResult<()>
    where
        F: Fn(&str) -> bool,
    {
        match rule {
            InsertionRule::TextLiteral { .. } => Ok(()),
            InsertionRule::AutoNumber { format, .. } => NumberPattern::parse(format)
                .map(|_| ())
                .map_err(|reason| EngineError::invalid_rule(column, reason)),
            InsertionRule::Calculation { sources, .. } => {
                if sources.is_empty() {
                    return Err(EngineError::invalid_rule(
                        column,
                        "calculation needs at least one source column",
                    ));
                }
                match sources.iter().find(|s| !is_available(s.as_str())) {
                    Some(missing) => Err(EngineError::invalid_rule(
                        column,
                        format!("source column '{missing}' does not exist"),
                    )),
                    None => Ok(()),
                }
            }
            InsertionRule::MenuList {
                sheet,
                key_column,
                lookup_column,
                result_column,
            } => {
                if !is_available(key_column) {
                    return Err(EngineError::invalid_rule(
                        column,
                        format!("key column '{key_column}' does not exist"),
                    ));
                }
                let reference = self.references.get(sheet).ok_or_else(|| {
                    EngineError::invalid_rule(column, format!("reference sheet '{sheet}' is not loaded"))
                })?;
                let lookup = lookup_column.as_deref().unwrap_or(key_column);
                for needed in [lookup, result_column.as_str()] {
                    if !reference.has_column(needed) {
                        return Err(EngineError::invalid_rule(
                            column,
                            format!("reference sheet '{sheet}' has no column '{needed}'"),
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    /// Compute one value per row of `table`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInsertionRule` if the rule references a
    /// column or sheet that does not exist, or its pattern is malformed.
    pub fn compute(
        &self,
        column: &str,
        rule: &InsertionRule,
        table: &TableModel,
    ) -> EngineResult<Computed> {
        self.check(column, rule, |name| table.has_column(name))?;

        match rule {
            InsertionRule::TextLiteral { value } => Ok(Computed {
                values: vec![CellValue::String(value.clone()); table.row_count()],
                warnings: Vec::new(),
            }),
            InsertionRule::AutoNumber { format, start } => {
                let pattern = NumberPattern::parse(format)
                    .map_err(|reason| EngineError::invalid_rule(column, reason))?;
                let values = (0..table.row_count())
                    .map(|i| {
                        let offset = i64::try_from(i).unwrap_or(i64::MAX);
                        CellValue::String(pattern.render(start.saturating_add(offset)))
                    })
                    .collect();
                Ok(Computed {
                    values,
                    warnings: Vec::new(),
                })
            }
            InsertionRule::Calculation { sources, operator } => {
                Ok(calculate(column, sources, *operator, table))
            }
            InsertionRule::MenuList {
                sheet,
                key_column,
                lookup_column,
                result_column,
            } => {
                let reference = self.references.get(sheet).ok_or_else(|| {
                    EngineError::invalid_rule(column, format!("reference sheet '{sheet}' is not loaded"))
                })?;
                let lookup = lookup_column.as_deref().unwrap_or(key_column);
                lookup_values(column, sheet, table, key_column, reference, lookup, result_column)
            }
        }
    }
}

fn calculate(
    column: &str,
    sources: &[String],
    operator: CalcOperator,
    table: &TableModel,
) -> Computed {
    let positions: Vec<usize> = sources
        .iter()
        .filter_map(|s| table.column_position(s))
        .collect();

    let mut computed = Computed::default();
    let mut operands = Vec::with_capacity(positions.len());

    for (idx, row) in table.rows().enumerate() {
        operands.clear();
        for &pos in &positions {
            let cell = &row[pos];
            let coerced = cell.coerce_number();
            if coerced.is_not_numeric() {
                computed
                    .warnings
                    .push(Warning::non_numeric(idx, &table.columns()[pos], cell));
            }
            operands.push(coerced.or_zero());
        }

        let value = match operator.apply(&operands) {
            Some(n) => CellValue::Number(n),
            None => {
                computed.warnings.push(Warning::division_by_zero(idx, column));
                CellValue::Empty
            }
        };
        computed.values.push(value);
    }

    computed
}

fn lookup_values(
    column: &str,
    sheet: &str,
    table: &TableModel,
    key_column: &str,
    reference: &TableModel,
    lookup_column: &str,
    result_column: &str,
) -> EngineResult<Computed> {
    let lookup = reference.column(lookup_column)?;
    let results = reference.column(result_column)?;

    // First match wins, so later duplicates never overwrite.
    let mut index: HashMap<String, &CellValue> = HashMap::with_capacity(lookup.len());
    for (key, result) in lookup.into_iter().zip(results) {
        index.entry(key.key()).or_insert(result);
    }

    let mut computed = Computed::default();
    for (idx, cell) in table.column(key_column)?.into_iter().enumerate() {
        if cell.is_empty() {
            computed.values.push(CellValue::Empty);
            continue;
        }
        let key = cell.key();
        match index.get(&key) {
            Some(found) => computed.values.push((*found).clone()),
            None => {
                computed
                    .warnings
                    .push(Warning::unresolved_lookup(idx, column, &key, sheet));
                computed.values.push(CellValue::Empty);
            }
        }
    }
    Ok(computed)
}
