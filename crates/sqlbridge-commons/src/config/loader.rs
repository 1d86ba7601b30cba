use super::types::BridgeConfig;
use crate::errors::{BridgeError, Result};
use std::fs;
use std::path::Path;

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            BridgeError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        let config = Self::from_toml_str(&content)?;
        log::debug!("[CONFIG] Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: BridgeConfig = toml::from_str(content).map_err(|e| {
            BridgeError::ConfigurationError(format!("Failed to parse config file: {}", e))
        })?;

        config.finalize()?;

        Ok(config)
    }

    /// Normalize values and validate configuration.
    pub fn finalize(&mut self) -> Result<()> {
        if let Some(day) = self.dialect.week_start_day.as_mut() {
            *day = day.trim().to_lowercase();
        }

        self.validate()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.execution.preview_capacity == 0 {
            return Err(BridgeError::ConfigurationError(
                "preview_capacity cannot be 0".to_string(),
            ));
        }

        if self.execution.max_parse_buffer_bytes == 0 {
            return Err(BridgeError::ConfigurationError(
                "max_parse_buffer_bytes cannot be 0".to_string(),
            ));
        }

        if self.execution.delimiter.len() != 1 {
            return Err(BridgeError::ConfigurationError(format!(
                "delimiter must be a single byte, got '{}'",
                self.execution.delimiter
            )));
        }

        if self.polling.base_interval_ms == 0 {
            return Err(BridgeError::ConfigurationError(
                "polling.base_interval_ms cannot be 0".to_string(),
            ));
        }

        if self.polling.base_interval_ms > self.polling.max_interval_ms {
            return Err(BridgeError::ConfigurationError(format!(
                "polling.base_interval_ms ({}) cannot exceed polling.max_interval_ms ({})",
                self.polling.base_interval_ms, self.polling.max_interval_ms
            )));
        }

        if let Some(day) = &self.dialect.week_start_day {
            let valid_days = ["monday", "sunday"];
            if !valid_days.contains(&day.as_str()) {
                return Err(BridgeError::ConfigurationError(format!(
                    "Invalid week_start_day '{}'. Must be one of: {}",
                    day,
                    valid_days.join(", ")
                )));
            }
        }

        Ok(())
    }
}
