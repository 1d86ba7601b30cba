//! Wire structures of the JSON statement API used by paginated and
//! partitioned cloud engines.

use serde::{Deserialize, Serialize};

use super::Row;

/// Remote statement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementState {
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for StatementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementState::Running => write!(f, "running"),
            StatementState::Succeeded => write!(f, "succeeded"),
            StatementState::Failed => write!(f, "failed"),
        }
    }
}

/// Error details reported by the remote engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Remote error code or state
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// One page of a token-paginated result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Vec<Row>,

    /// Continuation token; absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Rows of one result partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionData {
    #[serde(default)]
    pub data: Vec<Row>,
}

/// Response to a submission or status poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResponse {
    /// Statement handle used for polling and follow-up fetches
    pub handle: String,

    pub state: StatementState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,

    /// Column names, when known before the first row
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    /// Number of partitions; present for partitioned results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_count: Option<usize>,

    /// Rows of partition 0 or of the first page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Row>,

    /// Continuation token of the first page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,

    /// The first row of partition 0 or of the first page is a label row, not data
    #[serde(default)]
    pub leading_header: bool,
}

/// How a succeeded statement's rows are laid out.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultLayout {
    /// Partition 0 embedded; partitions 1..count fetched by index
    Partitioned {
        count: usize,
        first: Vec<Row>,
        leading_header: bool,
    },
    /// First page embedded; later pages fetched by token
    Paged { first: Page, leading_header: bool },
}

impl StatementResponse {
    pub fn running(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            state: StatementState::Running,
            error: None,
            columns: Vec::new(),
            partition_count: None,
            data: Vec::new(),
            next_token: None,
            leading_header: false,
        }
    }

    pub fn failed(handle: impl Into<String>, error: ErrorDetail) -> Self {
        Self {
            state: StatementState::Failed,
            error: Some(error),
            ..Self::running(handle)
        }
    }

    pub fn succeeded(handle: impl Into<String>) -> Self {
        Self {
            state: StatementState::Succeeded,
            ..Self::running(handle)
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_partitions(mut self, count: usize, first: Vec<Row>) -> Self {
        self.partition_count = Some(count);
        self.data = first;
        self
    }

    pub fn with_leading_header(mut self, leading_header: bool) -> Self {
        self.leading_header = leading_header;
        self
    }

    pub fn with_first_page(mut self, page: Page, leading_header: bool) -> Self {
        self.partition_count = None;
        self.data = page.data;
        self.next_token = page.next_token;
        self.leading_header = leading_header;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state != StatementState::Running
    }

    /// Split the embedded rows into their layout. Consumes the row data.
    pub fn take_layout(&mut self) -> ResultLayout {
        let data = std::mem::take(&mut self.data);
        match self.partition_count {
            Some(count) => ResultLayout::Partitioned {
                count,
                first: data,
                leading_header: self.leading_header,
            },
            None => ResultLayout::Paged {
                first: Page {
                    data,
                    next_token: self.next_token.take(),
                },
                leading_header: self.leading_header,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_partitioned_response() {
        let mut response: StatementResponse = serde_json::from_value(json!({
            "handle": "01ab",
            "state": "succeeded",
            "columns": ["id"],
            "partition_count": 3,
            "data": [[1], [2]]
        }))
        .unwrap();

        assert!(response.is_terminal());
        match response.take_layout() {
            ResultLayout::Partitioned {
                count,
                first,
                leading_header,
            } => {
                assert_eq!(count, 3);
                assert_eq!(first.len(), 2);
                assert!(!leading_header);
            },
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_failed_response() {
        let response: StatementResponse = serde_json::from_value(json!({
            "handle": "q1",
            "state": "failed",
            "error": { "code": "SYNTAX_ERROR", "message": "line 1:8" }
        }))
        .unwrap();
        assert_eq!(response.state, StatementState::Failed);
        assert_eq!(response.error.unwrap().code.as_deref(), Some("SYNTAX_ERROR"));
    }

    #[test]
    fn test_paged_layout_keeps_token() {
        let mut response = StatementResponse::succeeded("q").with_first_page(
            Page {
                data: vec![vec![json!("id")]],
                next_token: Some("t1".into()),
            },
            true,
        );
        match response.take_layout() {
            ResultLayout::Paged { first, leading_header } => {
                assert!(leading_header);
                assert_eq!(first.next_token.as_deref(), Some("t1"));
            },
            other => panic!("unexpected layout {:?}", other),
        }
    }
}
