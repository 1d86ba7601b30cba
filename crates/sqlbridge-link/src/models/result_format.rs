use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use sqlbridge_commons::BridgeError;

/// Shape of a buffered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// Rows as value lists
    #[default]
    Tuples,
    /// Rows as column-name → value maps
    Records,
    /// One delimited-text blob, header first
    Delimited,
    /// The engine's native result
    Native,
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultFormat::Tuples => write!(f, "tuples"),
            ResultFormat::Records => write!(f, "records"),
            ResultFormat::Delimited => write!(f, "delimited"),
            ResultFormat::Native => write!(f, "native"),
        }
    }
}

impl FromStr for ResultFormat {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tuples" | "list" => Ok(ResultFormat::Tuples),
            "records" | "dict" => Ok(ResultFormat::Records),
            "delimited" | "csv" => Ok(ResultFormat::Delimited),
            "native" | "raw" => Ok(ResultFormat::Native),
            other => Err(BridgeError::ConfigurationError(format!("Unknown result format '{}'", other))),
        }
    }
}
