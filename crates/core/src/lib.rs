//! # tradedoc-core
//!
//! Header-driven processing of uploaded trade tables.
//!
//! This crate provides:
//! - Header configuration (keep, sum, subtotal, grand total, delete, inserted columns)
//! - Column insertion rules (text, auto-number, calculation, menu-list lookup)
//! - Subtotal and grand-total aggregation
//! - The processing pipeline and document-type binding
//!
//! ```
//! use tradedoc_core::{
//!     CalcOperator, HeaderAction, HeaderConfig, HeaderSet, InsertionRule, ReferenceSnapshot,
//!     TransformPipeline,
//! };
//! use tradedoc_sheet::TableModel;
//!
//! let table = TableModel::from_rows(
//!     vec!["item", "qty", "price"],
//!     vec![vec!["A", "2", "10"], vec!["A", "3", "10"], vec!["B", "1", "5"]],
//! )
//! .unwrap();
//!
//! let headers = HeaderSet::new(vec![
//!     HeaderConfig::kept("item", HeaderAction::Keep),
//!     HeaderConfig::inserted(
//!         "total",
//!         InsertionRule::Calculation {
//!             sources: vec!["qty".into(), "price".into()],
//!             operator: CalcOperator::Product,
//!         },
//!         HeaderAction::Subtotal,
//!     ),
//! ]);
//!
//! let processed = TransformPipeline::new(&headers, ReferenceSnapshot::new())
//!     .process(table)
//!     .unwrap();
//! let grand = processed.output.grand_total().unwrap();
//! assert_eq!(grand.values["total"], 55.0);
//! ```

/// Subtotal and grand-total computation.
pub mod aggregate;
/// Inserted-column evaluation.
pub mod compute;
/// Document types, binding and persistence handoff.
pub mod document;
/// Error types and result aliases.
pub mod error;
/// Header configuration model.
pub mod header;
/// Processed output tables.
pub mod output;
mod pattern;
/// The processing pipeline.
pub mod pipeline;
pub mod presets;
/// Shared reference sheets and per-run snapshots.
pub mod reference;
mod warning;

pub use aggregate::{Aggregation, AggregationEngine, SummaryKind, SummaryRow};
pub use compute::{ColumnComputer, Computed};
pub use document::{
    BoundDocument, DocumentSink, DocumentTypeBinder, DocumentTypeDefinition,
    DocumentTypeRegistry, DocumentTypeSchema, FieldList, JsonFileSink,
};
pub use error::{EngineError, EngineResult};
pub use header::{
    AggregationSpec, CalcOperator, ColumnSource, GroupingPolicy, HeaderAction, HeaderConfig,
    HeaderSet, InsertionRule,
};
pub use output::{OutputTable, RenderedTable};
pub use pattern::NumberPattern;
pub use pipeline::{ProcessedTable, Stage, TransformPipeline};
pub use reference::{ReferenceLibrary, ReferenceSnapshot};
pub use warning::{Warning, WarningKind};
