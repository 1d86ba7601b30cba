use serde_json::Value as JsonValue;
use sqlbridge_commons::{BridgeError, Result};
use std::collections::HashMap;

use super::column::ColumnField;
use super::query_result::QueryResult;
use super::result_format::ResultFormat;
use super::{row_to_fields, Row};
use crate::sink::encode_record;

/// A fully materialized result in the requested shape.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Tuples(Vec<Row>),
    Records(Vec<HashMap<String, JsonValue>>),
    Delimited(String),
    Native(QueryResult),
}

impl QueryOutput {
    /// Shape collected columns and rows.
    pub fn build(
        format: ResultFormat,
        columns: Vec<ColumnField>,
        rows: Vec<Row>,
        delimiter: u8,
    ) -> Result<Self> {
        let output = match format {
            ResultFormat::Tuples => QueryOutput::Tuples(rows),
            ResultFormat::Records => QueryOutput::Records(QueryResult::new(columns, rows).rows_as_maps()),
            ResultFormat::Native => QueryOutput::Native(QueryResult::new(columns, rows)),
            ResultFormat::Delimited => {
                let mut bytes = Vec::new();
                if !columns.is_empty() {
                    bytes.extend(encode_record(columns.iter().map(|c| c.name.as_str()), delimiter)?);
                }
                for row in &rows {
                    bytes.extend(encode_record(row_to_fields(row), delimiter)?);
                }
                QueryOutput::Delimited(
                    String::from_utf8(bytes).map_err(|e| BridgeError::Serialization(e.to_string()))?,
                )
            },
        };
        Ok(output)
    }

    pub fn format(&self) -> ResultFormat {
        match self {
            QueryOutput::Tuples(_) => ResultFormat::Tuples,
            QueryOutput::Records(_) => ResultFormat::Records,
            QueryOutput::Delimited(_) => ResultFormat::Delimited,
            QueryOutput::Native(_) => ResultFormat::Native,
        }
    }

    pub fn as_tuples(&self) -> Option<&[Row]> {
        match self {
            QueryOutput::Tuples(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_delimited(&self) -> Option<&str> {
        match self {
            QueryOutput::Delimited(text) => Some(text),
            _ => None,
        }
    }
}

/// Outcome of one execution call. Exactly one delivery style per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Buffered mode: the whole result
    Materialized(QueryOutput),
    /// Sink mode: rows were written to the caller's sink, which is rewound
    Flushed { rows: u64 },
    /// Callback mode: items handed to the callback and whether it stopped early
    Delivered { items: u64, stopped_early: bool },
}

impl ExecutionResult {
    pub fn into_output(self) -> Option<QueryOutput> {
        match self {
            ExecutionResult::Materialized(output) => Some(output),
            _ => None,
        }
    }
}
