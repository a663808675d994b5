use tradedoc_core::{
    CalcOperator, ColumnSource, EngineError, GroupingPolicy, HeaderAction, HeaderSet,
    InsertionRule, ReferenceSnapshot,
};
use tradedoc_sheet::TableModel;

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[test]
fn test_parse_full_json() {
    let set = HeaderSet::from_json_str(
        r#"{
            "grouping": "explicit",
            "sort_by_group": true,
            "headers": [
                {"name": "item", "group_key": true},
                {"name": "ctns", "action": "subtotal"},
                {"name": "total", "action": "subtotal",
                 "insert": {"type": "calculation", "sources": ["qty", "ctns"], "operator": "*"}},
                {"name": "no", "insert": {"type": "auto_number", "format": "PL-%04d"}}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(set.grouping, GroupingPolicy::Explicit);
    assert!(set.sort_by_group);
    assert_eq!(set.headers[0].action, HeaderAction::Keep);
    assert_eq!(set.headers[0].group_key, Some(true));
    assert_eq!(set.headers[1].source, ColumnSource::Kept);
    assert_eq!(
        set.headers[2].insertion(),
        Some(&InsertionRule::Calculation {
            sources: columns(&["qty", "ctns"]),
            operator: CalcOperator::Product,
        })
    );
    assert_eq!(
        set.headers[3].insertion(),
        Some(&InsertionRule::AutoNumber {
            format: "PL-%04d".to_string(),
            start: 1,
        })
    );
}

#[test]
fn test_parse_bare_yaml_list() {
    let set = HeaderSet::from_yaml_str(
        "- name: ITEM\n- name: NW\n  action: sum\n- name: PORT\n  insert:\n    type: menu_list\n    sheet: ports\n    key_column: ITEM\n    result_column: port\n",
    )
    .unwrap();

    assert_eq!(set.grouping, GroupingPolicy::Positional);
    assert!(!set.sort_by_group);
    assert_eq!(set.headers.len(), 3);
    assert!(set.headers[2].is_inserted());
}

#[test]
fn test_unsupported_operator_rejected_on_parse() {
    let err = HeaderSet::from_json_str(
        r#"[{"name": "x", "insert": {"type": "calculation", "sources": ["a"], "operator": "%"}}]"#,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_from_path_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("headers.yml");
    std::fs::write(&yaml, "headers:\n  - name: item\n").unwrap();
    let json = dir.path().join("headers.json");
    std::fs::write(&json, r#"[{"name": "item", "action": "delete"}]"#).unwrap();

    assert_eq!(HeaderSet::from_path(&yaml).unwrap().headers.len(), 1);
    assert_eq!(
        HeaderSet::from_path(&json).unwrap().headers[0].action,
        HeaderAction::Delete
    );
    assert!(matches!(
        HeaderSet::from_path(dir.path().join("missing.json")),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn test_json_roundtrip_preserves_set() {
    let set = HeaderSet::from_json_str(
        r#"[{"name": "item"}, {"name": "lc", "insert": {"type": "text_literal", "value": "LC-1"}}]"#,
    )
    .unwrap();
    let json = serde_json::to_string(&set).unwrap();
    assert_eq!(HeaderSet::from_json_str(&json).unwrap(), set);
}

// ===== Validation =====

fn validate(json: &str, raw: &[&str]) -> Result<(), EngineError> {
    HeaderSet::from_json_str(json)
        .unwrap()
        .validate(&columns(raw), &ReferenceSnapshot::new())
}

#[test]
fn test_validate_duplicate_header() {
    let err = validate(r#"[{"name": "item"}, {"name": "item"}]"#, &["item"]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidHeaderConfig { .. }));
}

#[test]
fn test_validate_inserted_collision() {
    let err = validate(
        r#"[{"name": "item", "insert": {"type": "text_literal", "value": "x"}}]"#,
        &["item"],
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidHeaderConfig { .. }));
}

#[test]
fn test_validate_calculation_order() {
    // "b" is inserted after "a" uses it
    let err = validate(
        r#"[
            {"name": "a", "insert": {"type": "calculation", "sources": ["qty", "b"], "operator": "+"}},
            {"name": "b", "insert": {"type": "text_literal", "value": "1"}}
        ]"#,
        &["qty"],
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInsertionRule { column, .. } if column == "a"));
}

#[test]
fn test_validate_subtotal_needs_group_key() {
    let err = validate(r#"[{"name": "ctns", "action": "subtotal"}]"#, &["item", "ctns"]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidHeaderConfig { column, .. } if column == "ctns"));

    let err = validate(
        r#"{"grouping": "explicit", "headers": [{"name": "item"}, {"name": "ctns", "action": "subtotal"}]}"#,
        &["item", "ctns"],
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidHeaderConfig { .. }));
}

#[test]
fn test_validate_group_key_must_be_kept() {
    let err = validate(
        r#"[{"name": "item"}, {"name": "ctns", "action": "sum", "group_key": true}]"#,
        &["item", "ctns"],
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidHeaderConfig { column, .. } if column == "ctns"));
}

#[test]
fn test_validate_menu_list_sheet() {
    let set = HeaderSet::from_json_str(
        r#"[{"name": "port", "insert": {"type": "menu_list", "sheet": "ports", "key_column": "code", "result_column": "name"}}]"#,
    )
    .unwrap();
    let raw = columns(&["code"]);

    assert!(set.validate(&raw, &ReferenceSnapshot::new()).is_err());

    let refs = ReferenceSnapshot::new().with_sheet(
        "ports",
        TableModel::from_rows(vec!["code", "name"], vec![vec!["CGP", "Chittagong"]]).unwrap(),
    );
    assert!(set.validate(&raw, &refs).is_ok());
}
