use serde::{Deserialize, Serialize};

/// Request payload for the HTTP transports.
///
/// ```rust
/// use sqlbridge_link::models::QueryRequest;
///
/// let request = QueryRequest::new("SELECT 1");
/// assert_eq!(serde_json::to_string(&request).unwrap(), r#"{"sql":"SELECT 1"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// SQL text, already rendered for the target dialect
    pub sql: String,

    /// Requested output format for chunked transports (e.g. "csv")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}
