mod common;

use std::process::Command;

use office_table_fill::{
    CsvOptions, ExtractOptions, FillMode, FillRecord, HeaderMode, LayoutRegion, WarningCode,
    extract_tables, extract_tables_to_csv_string,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::tempdir;

fn record(pairs: &[(&str, &str)]) -> FillRecord {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

#[test]
fn extracts_single_table_to_merged_csv() {
    let page = common::table_page(
        1,
        (100.0, 200.0),
        &[&["Name", "Age", "Score"], &["Alice", "30", "98"], &["Bob", "22", "87"]],
    );

    let (csv, report) =
        extract_tables_to_csv_string(&[page], &ExtractOptions::default(), &CsvOptions::default())
            .expect("extraction should succeed");

    assert!(
        csv.contains("page,table_id,col_1,col_2,col_3"),
        "unexpected CSV output: {csv:?}, report: {report:?}"
    );
    assert!(
        csv.contains("1,1,Alice,30,98"),
        "unexpected CSV output: {csv:?}, report: {report:?}"
    );
    assert_eq!(report.table_count, 1);
    assert_eq!(report.row_count, 3);
}

#[test]
fn numbers_tables_across_pages() {
    let pages = vec![
        common::table_page(1, (0.0, 0.0), &[&["City", "Pop"], &["A", "10"]]),
        common::table_page(2, (0.0, 0.0), &[&["Product", "Qty"], &["Pen", "3"]]),
    ];

    let report = extract_tables(&pages, &ExtractOptions::default()).expect("extraction");
    let ids = report
        .tables
        .iter()
        .map(|table| (table.page, table.table_id))
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![(1, 1), (2, 2)]);
    assert_eq!(report.row_count, 4);
}

#[test]
fn malformed_region_does_not_hide_valid_tables() {
    let mut page = common::table_page(1, (0.0, 0.0), &[&["a", "b"], &["c", "d"]]);
    page.regions.insert(
        0,
        LayoutRegion {
            label: "Table".to_string(),
            bbox: vec![50.0, 50.0, 10.0],
            score: None,
        },
    );

    let report = extract_tables(&[page], &ExtractOptions::default()).expect("extraction");
    assert_eq!(report.table_count, 1);
    assert_eq!(report.warnings[0].code, WarningCode::MalformedRegion);
}

#[test]
fn page_without_tables_reports_success_with_warning() {
    let mut page = common::table_page(1, (0.0, 0.0), &[&["a", "b"]]);
    page.regions.clear();

    let report = extract_tables(&[page], &ExtractOptions::default()).expect("extraction");
    assert_eq!(report.row_count, 0);
    assert_eq!(report.warnings.last().map(|w| w.code), Some(WarningCode::NoTablesDetected));
}

#[test]
fn extracted_table_is_filled_like_the_fill_endpoint() {
    let page = common::table_page(1, (0.0, 0.0), &[&["Name", "Age"], &["Alice", ""]]);
    let options = ExtractOptions {
        header_mode: HeaderMode::HasHeader,
        ..ExtractOptions::default()
    };

    let report = extract_tables(&[page], &options).expect("extraction");
    assert_eq!(report.tables[0].grid.data, vec![vec!["Alice", ""]]);

    let records = vec![
        record(&[("Name", "Alice"), ("Age", "30")]),
        record(&[("Name", "Bob"), ("Age", "25")]),
    ];
    let filled = report.fill(&records, &FillMode::Positional);
    assert_eq!(
        filled.tables[0].grid.data,
        vec![vec!["Alice", "30"], vec!["Bob", "25"]]
    );
    assert_eq!(filled.row_count, 2);
}

#[test]
fn cli_extract_writes_csv_and_exits_zero() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("pages.json");
    let output = dir.path().join("tables.csv");
    common::write_json(
        &input,
        &vec![common::table_page(1, (0.0, 0.0), &[&["Item", "Qty"], &["Pen", "3"]])],
    )
    .expect("fixture should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_tablefill"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
            "--nopage",
            "--notable",
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(0));
    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    assert_eq!(csv, "col_1,col_2\nItem,Qty\nPen,3\n");
}

#[test]
fn cli_exits_with_code_2_when_no_rows() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("empty.json");
    let output = dir.path().join("empty.csv");
    common::write_json(&input, &json!([{"page_number": 1}])).expect("fixture should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_tablefill"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(2));
}

#[test]
fn cli_fill_answers_request_body() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("request.json");
    let output = dir.path().join("response.json");
    common::write_json(
        &input,
        &json!({
            "tables": [{"columns": ["Name", "Age"], "data": [["Alice", ""]]}],
            "fill_data": [{"Name": "Alice", "Age": "30"}, {"Name": "Bob", "Age": "25"}],
        }),
    )
    .expect("fixture should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_tablefill"))
        .args([
            "fill",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert_eq!(status.code(), Some(0));

    let response: Value =
        serde_json::from_str(&std::fs::read_to_string(&output).expect("response file"))
            .expect("response should be JSON");
    assert_eq!(
        response,
        json!({
            "success": true,
            "filled_tables": [{
                "columns": ["Name", "Age"],
                "data": [["Alice", "30"], ["Bob", "25"]],
            }],
        })
    );
}
