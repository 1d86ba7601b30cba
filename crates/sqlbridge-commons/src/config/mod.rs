//! Runtime configuration for SQLBridge adapters.

pub mod defaults;
mod loader;
mod types;

pub use types::*;
