//! Request and response bodies of the table-fill endpoint.
//!
//! Request: `{"tables": [{"columns": [...], "data": [[...]]}], "fill_data": [{...}]}`.
//! Response: `{"success": true, "filled_tables": [...]}`. Entries of `tables`
//! that are not column/data objects are echoed back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::fill::fill_grid;
use crate::model::{FillRecord, TableGrid};
use crate::options::FillMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableFillRequest {
    #[serde(default)]
    pub tables: Vec<Value>,
    #[serde(default)]
    pub fill_data: Vec<Map<String, Value>>,
    #[serde(default)]
    pub mode: FillMode,
}

impl TableFillRequest {
    pub fn from_json(body: &str) -> Result<Self, ErrorResponse> {
        serde_json::from_str(body).map_err(ErrorResponse::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableFillResponse {
    pub success: bool,
    pub filled_tables: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<serde_json::Error> for ErrorResponse {
    fn from(error: serde_json::Error) -> Self {
        Self {
            code: "parse_error".to_string(),
            message: error.to_string(),
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn record_from_object(object: &Map<String, Value>) -> FillRecord {
    object
        .iter()
        .map(|(key, value)| (key.clone(), cell_text(value)))
        .collect()
}

fn grid_from_value(value: &Value) -> Option<TableGrid> {
    let object = value.as_object()?;
    let columns = object
        .get("columns")?
        .as_array()?
        .iter()
        .map(cell_text)
        .collect::<Vec<_>>();

    let rows = match object.get("data") {
        None | Some(Value::Null) => Vec::new(),
        Some(data) => data
            .as_array()?
            .iter()
            .map(|row| row.as_array().map(|cells| cells.iter().map(cell_text).collect()))
            .collect::<Option<Vec<Vec<String>>>>()?,
    };

    Some(TableGrid::from_parts(columns, rows))
}

fn grid_to_value(grid: TableGrid) -> Value {
    json!({
        "columns": grid.columns,
        "data": grid.data,
    })
}

/// Fills every table of the request with its `fill_data`.
///
/// Always reports success: tables that cannot be read as grids are passed
/// through, and record keys that match no column are ignored.
#[must_use]
pub fn handle_table_fill(request: TableFillRequest) -> TableFillResponse {
    let records = request
        .fill_data
        .iter()
        .map(record_from_object)
        .collect::<Vec<_>>();

    let filled_tables = request
        .tables
        .into_iter()
        .enumerate()
        .map(|(index, value)| match grid_from_value(&value) {
            Some(grid) => grid_to_value(fill_grid(grid, &records, &request.mode)),
            None => {
                debug!(table = index, "table is not a column/data object; passing through");
                value
            }
        })
        .collect();

    TableFillResponse {
        success: true,
        filled_tables,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{TableFillRequest, handle_table_fill};

    #[test]
    fn fills_tables_and_stringifies_scalar_values() {
        let request = TableFillRequest::from_json(
            r#"{
                "tables": [{"columns": ["Name", "Age"], "data": [["Alice", ""]]}],
                "fill_data": [{"Name": "Alice", "Age": 30}, {"Name": "Bob", "Age": null}]
            }"#,
        )
        .expect("request should parse");

        let response = handle_table_fill(request);
        assert!(response.success);
        assert_eq!(
            response.filled_tables,
            vec![json!({
                "columns": ["Name", "Age"],
                "data": [["Alice", "30"], ["Bob", ""]],
            })]
        );
    }

    #[test]
    fn passes_through_values_that_are_not_tables() {
        let request = TableFillRequest::from_json(
            r#"{"tables": ["not a table", {"rows": []}], "fill_data": [{"A": "1"}]}"#,
        )
        .expect("request should parse");

        let response = handle_table_fill(request);
        assert_eq!(
            response.filled_tables,
            vec![json!("not a table"), json!({"rows": []})]
        );
    }

    #[test]
    fn rejects_malformed_body_with_parse_error() {
        let error = TableFillRequest::from_json("{tables:").expect_err("body is not JSON");
        assert_eq!(error.code, "parse_error");
    }
}
