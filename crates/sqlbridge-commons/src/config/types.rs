use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main adapter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub execution: ExecutionSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub dialect: DialectConfig,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Streaming execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Maximum number of attempts for a whole call. 0 executes exactly once
    /// without retry bookkeeping.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Capacity of the statistics preview buffer.
    #[serde(default = "default_preview_capacity")]
    pub preview_capacity: usize,

    /// Row cap for the chunked decoder's in-memory preview parse.
    #[serde(default = "default_max_rows_in_memory")]
    pub max_rows_in_memory: usize,

    /// Longest single record the chunked decoder will buffer for its preview.
    #[serde(default = "default_max_parse_buffer_bytes")]
    pub max_parse_buffer_bytes: usize,

    /// Write the column header before the first data row in sink-streamed mode.
    #[serde(default = "default_true")]
    pub write_header: bool,

    /// Field delimiter for delimited text output (single byte).
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            preview_capacity: default_preview_capacity(),
            max_rows_in_memory: default_max_rows_in_memory(),
            max_parse_buffer_bytes: default_max_parse_buffer_bytes(),
            write_header: default_true(),
            delimiter: default_delimiter(),
        }
    }
}

impl ExecutionSettings {
    /// Delimiter as a single byte. Validated by [`BridgeConfig::validate`].
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

/// Async completion polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// First wait between status polls.
    #[serde(default = "default_poll_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Cap of the exponential backoff; after reaching it the wait resets to base.
    #[serde(default = "default_poll_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Optional bound on status polls. None polls until a terminal state.
    #[serde(default)]
    pub max_polls: Option<u32>,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            base_interval_ms: default_poll_base_interval_ms(),
            max_interval_ms: default_poll_max_interval_ms(),
            max_polls: None,
        }
    }
}

/// Dialect loading settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialectConfig {
    /// Directory holding `<engine>.toml` overlay documents that take precedence
    /// over the bundled overlays.
    #[serde(default)]
    pub overlay_dir: Option<PathBuf>,

    /// Week start day applied as an instance override ("monday" or "sunday").
    #[serde(default)]
    pub week_start_day: Option<String>,
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Opaque per-engine configuration handed to connection constructors.
///
/// Field validation belongs to the constructor that consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine type, used to select the dialect and the registered constructor.
    pub engine: String,
    /// Connection name, used for named pools.
    pub name: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl EngineConfig {
    pub fn new(engine: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            name: name.into(),
            options: HashMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|s| s.as_str())
    }
}
