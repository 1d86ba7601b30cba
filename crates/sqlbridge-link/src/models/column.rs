use serde::{Deserialize, Serialize};

/// A column of a result set.
///
/// # Example (JSON representation)
///
/// ```json
/// { "name": "order_id", "data_type": "BIGINT", "index": 0 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnField {
    /// Column name
    pub name: String,

    /// Engine-native type name, when the transport reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// Column position (0-indexed)
    pub index: usize,
}

impl ColumnField {
    /// Untyped columns from names, indexed in order.
    pub fn from_names<I, S>(names: I) -> Vec<ColumnField>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| ColumnField {
                name: name.into(),
                data_type: None,
                index,
            })
            .collect()
    }
}
