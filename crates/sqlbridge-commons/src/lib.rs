//! sqlbridge-commons
//!
//! Error taxonomy, configuration types and transport timeouts shared by the
//! dialect engine and the streaming execution protocol.

pub mod config;
pub mod errors;
pub mod timeouts;

pub use config::{
    BridgeConfig, DialectConfig, EngineConfig, ExecutionSettings, HttpSettings, PollingSettings,
};
pub use errors::{BridgeError, Result};
pub use timeouts::{BridgeTimeouts, BridgeTimeoutsBuilder};
