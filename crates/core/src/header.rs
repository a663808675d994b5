//! Header configuration: how each output column is produced and aggregated.
//!
//! A [`HeaderSet`] is what a user authors for a processing session. It is
//! read-only during a run and serializes to JSON or YAML:
//!
//! ```yaml
//! grouping: positional
//! headers:
//!   - name: item
//!     action: keep
//!   - name: total
//!     action: subtotal
//!     insert:
//!       type: calculation
//!       sources: [qty, price]
//!       operator: "*"
//! ```

use crate::compute::ColumnComputer;
use crate::error::{EngineError, EngineResult};
use crate::reference::ReferenceSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// What happens to a column during processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderAction {
    /// Retain the column unchanged.
    #[default]
    Keep,
    /// Include in the grand total, and in subtotals when the set has any.
    Sum,
    /// Include in each group's subtotal and in the grand total.
    Subtotal,
    /// Include in the grand total only.
    GrandTotal,
    /// Drop the column from the output.
    Delete,
}

impl HeaderAction {
    /// Whether the column contributes to summary rows.
    #[must_use]
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            HeaderAction::Sum | HeaderAction::Subtotal | HeaderAction::GrandTotal
        )
    }
}

/// Numeric operator of a calculation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcOperator {
    #[serde(alias = "+", alias = "add")]
    Sum,
    #[serde(alias = "-", alias = "subtract")]
    Difference,
    #[serde(alias = "*", alias = "multiply")]
    Product,
    #[serde(alias = "/", alias = "divide")]
    Ratio,
}

impl CalcOperator {
    /// Apply the operator left to right over the operands.
    ///
    /// Returns `None` for an empty operand list or a zero divisor.
    #[must_use]
    pub fn apply(self, operands: &[f64]) -> Option<f64> {
        let (first, rest) = operands.split_first()?;
        match self {
            CalcOperator::Sum => Some(operands.iter().sum()),
            CalcOperator::Product => Some(operands.iter().product()),
            CalcOperator::Difference => Some(rest.iter().fold(*first, |acc, x| acc - x)),
            CalcOperator::Ratio => rest
                .iter()
                .try_fold(*first, |acc, &x| (x != 0.0).then(|| acc / x)),
        }
    }
}

fn default_start() -> i64 {
    1
}

/// How an inserted column gets its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsertionRule {
    /// The same text on every row.
    TextLiteral { value: String },
    /// `start, start + 1, ...` rendered through a printf-style pattern.
    AutoNumber {
        format: String,
        #[serde(default = "default_start")]
        start: i64,
    },
    /// A numeric operator applied across source columns, left to right.
    Calculation {
        sources: Vec<String>,
        operator: CalcOperator,
    },
    /// Copy `result_column` from the first reference row whose
    /// `lookup_column` (defaults to `key_column`) matches this row's
    /// `key_column`.
    MenuList {
        sheet: String,
        key_column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lookup_column: Option<String>,
        result_column: String,
    },
}

/// Where a column comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    /// A column of the uploaded table.
    Kept,
    /// A new column computed during processing.
    Inserted(InsertionRule),
}

/// Configuration of one output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HeaderConfigRepr", into = "HeaderConfigRepr")]
pub struct HeaderConfig {
    pub name: String,
    pub source: ColumnSource,
    pub action: HeaderAction,
    /// Explicit subtotal discriminator flag; `None` defers to the
    /// [`GroupingPolicy`].
    pub group_key: Option<bool>,
}

/// On-disk shape: the source is implied by the presence of `insert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HeaderConfigRepr {
    name: String,
    #[serde(default)]
    action: HeaderAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    insert: Option<InsertionRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_key: Option<bool>,
}

impl From<HeaderConfigRepr> for HeaderConfig {
    fn from(repr: HeaderConfigRepr) -> Self {
        HeaderConfig {
            name: repr.name,
            source: repr.insert.map_or(ColumnSource::Kept, ColumnSource::Inserted),
            action: repr.action,
            group_key: repr.group_key,
        }
    }
}

impl From<HeaderConfig> for HeaderConfigRepr {
    fn from(header: HeaderConfig) -> Self {
        HeaderConfigRepr {
            name: header.name,
            action: header.action,
            insert: match header.source {
                ColumnSource::Kept => None,
                ColumnSource::Inserted(rule) => Some(rule),
            },
            group_key: header.group_key,
        }
    }
}

impl HeaderConfig {
    /// Configure an existing column.
    pub fn kept(name: &str, action: HeaderAction) -> Self {
        HeaderConfig {
            name: name.to_string(),
            source: ColumnSource::Kept,
            action,
            group_key: None,
        }
    }

    /// Configure a new column computed by `rule`.
    pub fn inserted(name: &str, rule: InsertionRule, action: HeaderAction) -> Self {
        HeaderConfig {
            name: name.to_string(),
            source: ColumnSource::Inserted(rule),
            action,
            group_key: None,
        }
    }

    /// Mark or unmark the column as a subtotal discriminator.
    #[must_use]
    pub fn with_group_key(mut self, group_key: bool) -> Self {
        self.group_key = Some(group_key);
        self
    }

    #[must_use]
    pub fn insertion(&self) -> Option<&InsertionRule> {
        match &self.source {
            ColumnSource::Kept => None,
            ColumnSource::Inserted(rule) => Some(rule),
        }
    }

    #[must_use]
    pub fn is_inserted(&self) -> bool {
        matches!(self.source, ColumnSource::Inserted(_))
    }
}

/// Which kept columns split rows into subtotal groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// Kept headers declared before the first subtotal header, unless they
    /// opt out with `group_key: false`. Later kept headers may opt in with
    /// `group_key: true`.
    #[default]
    Positional,
    /// Exactly the kept headers marked `group_key: true`.
    Explicit,
}

/// Columns that feed each kind of summary row, derived from a [`HeaderSet`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregationSpec {
    pub sum_columns: Vec<String>,
    pub subtotal_columns: Vec<String>,
    pub grand_total_columns: Vec<String>,
    /// Ordered discriminator columns for subtotal groups.
    pub group_keys: Vec<String>,
}

impl AggregationSpec {
    #[must_use]
    pub fn has_subtotals(&self) -> bool {
        !self.subtotal_columns.is_empty()
    }

    /// Whether the column appears in subtotal rows.
    #[must_use]
    pub fn in_subtotal(&self, column: &str) -> bool {
        self.has_subtotals()
            && (self.subtotal_columns.iter().any(|c| c == column)
                || self.sum_columns.iter().any(|c| c == column))
    }

    /// Whether the column appears in the grand-total row.
    #[must_use]
    pub fn in_grand_total(&self, column: &str) -> bool {
        self.sum_columns
            .iter()
            .chain(&self.subtotal_columns)
            .chain(&self.grand_total_columns)
            .any(|c| c == column)
    }

    /// Whether no column is aggregated at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sum_columns.is_empty()
            && self.subtotal_columns.is_empty()
            && self.grand_total_columns.is_empty()
    }
}

/// The ordered header configuration of a processing session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderSet {
    pub headers: Vec<HeaderConfig>,
    #[serde(default)]
    pub grouping: GroupingPolicy,
    /// Stable-sort data rows by the group keys before subtotalling.
    #[serde(default)]
    pub sort_by_group: bool,
}

impl HeaderSet {
    #[must_use]
    pub fn new(headers: Vec<HeaderConfig>) -> Self {
        HeaderSet {
            headers,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_grouping(mut self, grouping: GroupingPolicy) -> Self {
        self.grouping = grouping;
        self
    }

    #[must_use]
    pub fn with_sort_by_group(mut self, sort_by_group: bool) -> Self {
        self.sort_by_group = sort_by_group;
        self
    }

    /// Parse a header set from JSON: either a full object or a bare list of
    /// headers.
    pub fn from_json_str(content: &str) -> EngineResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| EngineError::Config(format!("Invalid header JSON: {e}")))?;
        let parsed = if value.is_array() {
            serde_json::from_value(value).map(HeaderSet::new)
        } else {
            serde_json::from_value(value)
        };
        parsed.map_err(|e| EngineError::Config(format!("Invalid header configuration: {e}")))
    }

    /// Parse a header set from YAML: either a full mapping or a bare list of
    /// headers.
    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Invalid header YAML: {e}")))?;
        let parsed = if value.is_sequence() {
            serde_yaml::from_value(value).map(HeaderSet::new)
        } else {
            serde_yaml::from_value(value)
        };
        parsed.map_err(|e| EngineError::Config(format!("Invalid header configuration: {e}")))
    }

    /// Load a header set, choosing YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn from_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        if is_yaml(path) {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HeaderConfig> {
        self.headers.iter().find(|h| h.name == name)
    }

    /// Action of a column; columns without a header are kept.
    #[must_use]
    pub fn action_of(&self, name: &str) -> HeaderAction {
        self.get(name).map_or(HeaderAction::Keep, |h| h.action)
    }

    /// Headers whose column is dropped from the output.
    pub fn deleted_columns(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .filter(|h| h.action == HeaderAction::Delete)
            .map(|h| h.name.as_str())
    }

    /// Subtotal discriminator columns under the configured policy.
    #[must_use]
    pub fn group_keys(&self) -> Vec<&str> {
        let first_subtotal = self
            .headers
            .iter()
            .position(|h| h.action == HeaderAction::Subtotal);

        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.action == HeaderAction::Keep)
            .filter(|(idx, h)| match (self.grouping, h.group_key) {
                (_, Some(flag)) => flag,
                (GroupingPolicy::Explicit, None) => false,
                (GroupingPolicy::Positional, None) => first_subtotal.is_some_and(|first| *idx < first),
            })
            .map(|(_, h)| h.name.as_str())
            .collect()
    }

    /// Derive the aggregation columns.
    #[must_use]
    pub fn aggregation_spec(&self) -> AggregationSpec {
        let named = |action: HeaderAction| -> Vec<String> {
            self.headers
                .iter()
                .filter(|h| h.action == action)
                .map(|h| h.name.clone())
                .collect()
        };

        AggregationSpec {
            sum_columns: named(HeaderAction::Sum),
            subtotal_columns: named(HeaderAction::Subtotal),
            grand_total_columns: named(HeaderAction::GrandTotal),
            group_keys: self.group_keys().into_iter().map(String::from).collect(),
        }
    }

    /// Check the set against the columns of an uploaded table before any row
    /// is processed.
    ///
    /// Inserted columns become available to later headers in declaration
    /// order, so a calculation may use a column inserted above it.
    pub fn validate(
        &self,
        raw_columns: &[String],
        references: &ReferenceSnapshot,
    ) -> EngineResult<()> {
        let mut available: HashSet<&str> = raw_columns.iter().map(String::as_str).collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let computer = ColumnComputer::new(references);

        for header in &self.headers {
            let name = header.name.as_str();
            if name.trim().is_empty() {
                return Err(EngineError::invalid_header(name, "header name is empty"));
            }
            if !seen.insert(name) {
                return Err(EngineError::invalid_header(name, "header is declared twice"));
            }

            match &header.source {
                ColumnSource::Kept => {
                    if !available.contains(name) {
                        return Err(EngineError::UnknownColumn {
                            column: name.to_string(),
                        });
                    }
                }
                ColumnSource::Inserted(rule) => {
                    if available.contains(name) {
                        return Err(EngineError::invalid_header(
                            name,
                            "inserted column collides with an existing column",
                        ));
                    }
                    computer.check(name, rule, |column| available.contains(column))?;
                    available.insert(name);
                }
            }

            if header.group_key == Some(true) && header.action != HeaderAction::Keep {
                return Err(EngineError::invalid_header(
                    name,
                    "only kept columns can be group keys",
                ));
            }
        }

        if let Some(first) = self
            .headers
            .iter()
            .find(|h| h.action == HeaderAction::Subtotal)
        {
            if self.group_keys().is_empty() {
                return Err(EngineError::invalid_header(
                    &first.name,
                    "subtotal needs at least one group key column",
                ));
            }
        }

        Ok(())
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}
