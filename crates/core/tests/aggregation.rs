use tradedoc_core::aggregate::distinct_groups;
use tradedoc_core::{AggregationEngine, AggregationSpec, HeaderAction, HeaderConfig, HeaderSet};
use tradedoc_sheet::{CellValue, TableModel};

fn items(sequence: &[&str]) -> TableModel {
    let rows = sequence
        .iter()
        .enumerate()
        .map(|(i, item)| vec![CellValue::from(*item), CellValue::from(i as f64 + 1.0)])
        .collect();
    TableModel::from_rows(vec!["item", "ctns"], rows).unwrap()
}

fn subtotal_by_item() -> AggregationSpec {
    HeaderSet::new(vec![
        HeaderConfig::kept("item", HeaderAction::Keep),
        HeaderConfig::kept("ctns", HeaderAction::Subtotal),
    ])
    .aggregation_spec()
}

#[test]
fn test_one_subtotal_per_contiguous_run() {
    let cases: [(&[&str], usize); 5] = [
        (&["A", "A", "B"], 2),
        (&["A", "B", "A"], 3),
        (&["A", "A", "A"], 1),
        (&["A", "B", "B", "C", "A", "A"], 4),
        (&[], 0),
    ];

    for (sequence, runs) in cases {
        let table = items(sequence);
        let result = AggregationEngine::new()
            .aggregate(&table, &subtotal_by_item())
            .unwrap();
        let subtotals = result
            .summary_rows
            .iter()
            .filter(|s| !s.is_grand_total())
            .count();
        assert_eq!(subtotals, runs, "sequence {sequence:?}");
    }
}

#[test]
fn test_runs_differ_from_distinct_values() {
    let table = items(&["A", "B", "A"]);
    assert_eq!(distinct_groups(&table, &["item".to_string()]), 2);

    let result = AggregationEngine::new()
        .aggregate(&table, &subtotal_by_item())
        .unwrap();
    assert_eq!(result.summary_rows.len(), 4);
}

#[test]
fn test_grand_total_equals_coerced_sum() {
    let table = TableModel::from_rows(
        vec!["item", "nw"],
        vec![
            vec![CellValue::from("A"), CellValue::from(1.25)],
            vec![CellValue::from("A"), CellValue::from("2.75")],
            vec![CellValue::from("B"), CellValue::from("heavy")],
            vec![CellValue::from("B"), CellValue::Empty],
            vec![CellValue::from("C"), CellValue::from(-1)],
        ],
    )
    .unwrap();
    let spec = HeaderSet::new(vec![HeaderConfig::kept("nw", HeaderAction::Sum)]).aggregation_spec();

    let result = AggregationEngine::new().aggregate(&table, &spec).unwrap();

    assert_eq!(result.summary_rows.len(), 1);
    let grand = &result.summary_rows[0];
    assert!(grand.is_grand_total());
    assert_eq!(grand.values["nw"], 3.0);
    assert_eq!(grand.row_count, 5);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].row, 2);
}

#[test]
fn test_multi_column_group_keys() {
    let table = TableModel::from_rows(
        vec!["item", "port", "ctns"],
        vec![
            vec![CellValue::from("A"), CellValue::from("CGP"), CellValue::from(1)],
            vec![CellValue::from("A"), CellValue::from("CGP"), CellValue::from(2)],
            vec![CellValue::from("A"), CellValue::from("DAC"), CellValue::from(4)],
        ],
    )
    .unwrap();
    let spec = HeaderSet::new(vec![
        HeaderConfig::kept("item", HeaderAction::Keep),
        HeaderConfig::kept("port", HeaderAction::Keep),
        HeaderConfig::kept("ctns", HeaderAction::Subtotal),
    ])
    .aggregation_spec();

    let result = AggregationEngine::new().aggregate(&table, &spec).unwrap();
    let labels: Vec<&str> = result
        .summary_rows
        .iter()
        .filter_map(|s| s.group_value.as_deref())
        .collect();
    assert_eq!(labels, ["A / CGP", "A / DAC"]);
    assert_eq!(result.summary_rows[0].values["ctns"], 3.0);
    assert_eq!(result.summary_rows[1].start_row, 2);
}

#[test]
fn test_long_numeric_identifiers_stay_separate_groups() {
    let table = TableModel::from_rows(
        vec!["container", "ctns"],
        vec![
            vec![CellValue::from("12345678901234567891"), CellValue::from(1)],
            vec![CellValue::from("12345678901234567892"), CellValue::from(2)],
        ],
    )
    .unwrap();
    let spec = HeaderSet::new(vec![
        HeaderConfig::kept("container", HeaderAction::Keep),
        HeaderConfig::kept("ctns", HeaderAction::Subtotal),
    ])
    .aggregation_spec();

    let result = AggregationEngine::new().aggregate(&table, &spec).unwrap();
    let subtotals: Vec<(Option<&str>, f64)> = result
        .summary_rows
        .iter()
        .filter(|s| !s.is_grand_total())
        .map(|s| (s.group_value.as_deref(), s.values["ctns"]))
        .collect();
    assert_eq!(
        subtotals,
        [
            (Some("12345678901234567891"), 1.0),
            (Some("12345678901234567892"), 2.0),
        ]
    );
    assert_eq!(distinct_groups(&table, &["container".to_string()]), 2);
}

#[test]
fn test_leading_zero_codes_are_not_merged_with_numbers() {
    let table = TableModel::from_rows(
        vec!["pi", "ctns"],
        vec![
            vec![CellValue::from("00123"), CellValue::from(1)],
            vec![CellValue::from(123), CellValue::from(2)],
            vec![CellValue::from("123.0"), CellValue::from(4)],
        ],
    )
    .unwrap();
    let spec = HeaderSet::new(vec![
        HeaderConfig::kept("pi", HeaderAction::Keep),
        HeaderConfig::kept("ctns", HeaderAction::Subtotal),
    ])
    .aggregation_spec();

    let result = AggregationEngine::new().aggregate(&table, &spec).unwrap();
    let totals: Vec<f64> = result
        .summary_rows
        .iter()
        .filter(|s| !s.is_grand_total())
        .map(|s| s.values["ctns"])
        .collect();
    assert_eq!(totals, [1.0, 6.0]);
}
