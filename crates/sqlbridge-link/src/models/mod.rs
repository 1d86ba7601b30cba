//! Data models for the execution protocol.
//!
//! Defines buffered result shapes, the native query result and the wire
//! structures of the JSON statement API.

pub mod column;
pub mod execution_result;
pub mod query_request;
pub mod query_result;
pub mod result_format;
pub mod statement;

pub use column::ColumnField;
pub use execution_result::{ExecutionResult, QueryOutput};
pub use query_request::QueryRequest;
pub use query_result::QueryResult;
pub use result_format::ResultFormat;
pub use statement::{ErrorDetail, Page, PartitionData, ResultLayout, StatementResponse, StatementState};

use serde_json::Value as JsonValue;

/// One result row in column order.
pub type Row = Vec<JsonValue>;

/// Render a value as a delimited-text field. Strings are written without JSON
/// quoting and nulls become empty fields.
pub fn value_to_field(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Render a whole row as text fields.
pub fn row_to_fields(row: &[JsonValue]) -> Vec<String> {
    row.iter().map(value_to_field).collect()
}
