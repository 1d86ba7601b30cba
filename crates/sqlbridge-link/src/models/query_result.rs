use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use super::column::ColumnField;
use super::Row;

/// Native engine result: schema plus rows as JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Columns of the result set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<ColumnField>,

    /// Result rows ordered by schema index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,

    /// Number of rows returned
    pub row_count: usize,

    /// Optional message for statements without a result set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QueryResult {
    pub fn new(schema: Vec<ColumnField>, rows: Vec<Row>) -> Self {
        Self {
            schema,
            row_count: rows.len(),
            rows: Some(rows),
            message: None,
        }
    }

    /// Get column names from schema
    pub fn column_names(&self) -> Vec<String> {
        self.schema.iter().map(|field| field.name.clone()).collect()
    }

    /// Get a row as a HashMap by index
    pub fn row_as_map(&self, row_idx: usize) -> Option<HashMap<String, JsonValue>> {
        let row = self.rows.as_ref()?.get(row_idx)?;
        let mut map = HashMap::with_capacity(self.schema.len());
        for field in &self.schema {
            if let Some(value) = row.get(field.index) {
                map.insert(field.name.clone(), value.clone());
            }
        }
        Some(map)
    }

    /// Get all rows as HashMaps
    pub fn rows_as_maps(&self) -> Vec<HashMap<String, JsonValue>> {
        let Some(rows) = &self.rows else {
            return vec![];
        };
        (0..rows.len()).filter_map(|i| self.row_as_map(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_as_maps_uses_schema_index() {
        let result = QueryResult::new(
            ColumnField::from_names(["id", "name"]),
            vec![vec![json!(1), json!("a")], vec![json!(2), json!(null)]],
        );
        assert_eq!(result.row_count, 2);
        assert_eq!(result.column_names(), vec!["id", "name"]);

        let maps = result.rows_as_maps();
        assert_eq!(maps[0]["name"], json!("a"));
        assert_eq!(maps[1]["name"], json!(null));
        assert!(result.row_as_map(5).is_none());
    }

    #[test]
    fn test_missing_rows() {
        let result: QueryResult = serde_json::from_str(r#"{"row_count":0,"message":"ok"}"#).unwrap();
        assert!(result.rows_as_maps().is_empty());
        assert_eq!(result.message.as_deref(), Some("ok"));
    }
}
