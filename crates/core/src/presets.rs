//! Ready-made header sets and sample data.

use crate::header::{CalcOperator, HeaderAction, HeaderConfig, HeaderSet, InsertionRule};
use tradedoc_sheet::{CellValue, TableModel};

fn product(left: &str, right: &str) -> InsertionRule {
    InsertionRule::Calculation {
        sources: vec![left.to_string(), right.to_string()],
        operator: CalcOperator::Product,
    }
}

/// Packing list over `ITEM, MODEL, QTY/CTN, CTNS, NW, GW`.
///
/// Rows are sorted and subtotalled by `ITEM`; `TOTAL`, `TOTAL NW` and
/// `TOTAL GW` are the per-row carton products.
#[must_use]
pub fn packing_list() -> HeaderSet {
    HeaderSet::new(vec![
        HeaderConfig::kept("ITEM", HeaderAction::Keep),
        HeaderConfig::kept("MODEL", HeaderAction::Keep).with_group_key(false),
        HeaderConfig::kept("QTY/CTN", HeaderAction::Sum),
        HeaderConfig::kept("CTNS", HeaderAction::Subtotal),
        HeaderConfig::kept("NW", HeaderAction::Sum),
        HeaderConfig::kept("GW", HeaderAction::Sum),
        HeaderConfig::inserted("TOTAL", product("QTY/CTN", "CTNS"), HeaderAction::Subtotal),
        HeaderConfig::inserted("TOTAL NW", product("CTNS", "NW"), HeaderAction::Subtotal),
        HeaderConfig::inserted("TOTAL GW", product("CTNS", "GW"), HeaderAction::Subtotal),
    ])
    .with_sort_by_group(true)
}

/// Five rows of packing data matching [`packing_list`].
#[must_use]
pub fn sample_table() -> TableModel {
    let row = |item: &str, model: &str, qty: f64, ctns: f64, nw: f64, gw: f64| -> Vec<CellValue> {
        vec![
            item.into(),
            model.into(),
            qty.into(),
            ctns.into(),
            nw.into(),
            gw.into(),
        ]
    };

    TableModel::from_rows(
        vec!["ITEM", "MODEL", "QTY/CTN", "CTNS", "NW", "GW"],
        vec![
            row("POWER SUPPLY", "Power supply", 10.0, 5.0, 18.0, 20.0),
            row("POWER SUPPLY", "12V400W", 10.0, 3.0, 18.0, 20.0),
            row("CABLE", "HDMI Cable", 50.0, 10.0, 0.5, 0.6),
            row("CABLE", "USB Cable", 100.0, 7.0, 0.2, 0.25),
            row("ADAPTER", "AC Adapter", 20.0, 4.0, 2.5, 3.0),
        ],
    )
    .unwrap_or_default()
}
