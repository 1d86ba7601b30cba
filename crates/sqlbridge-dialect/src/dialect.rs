//! Per-instance dialect: effective settings plus the resolved capability set.

use crate::calendar::WeekStart;
use crate::capabilities::{Capability, CapabilitySet};
use crate::keys;
use crate::settings::{DialectSettings, SettingsMap};
use crate::template::Template;
use sqlbridge_commons::{BridgeError, Result};

/// Dialect of one adapter instance.
///
/// Built from the catalog's effective settings for an engine type. Capabilities
/// are resolved once at construction and again after each override or restore.
#[derive(Debug, Clone)]
pub struct Dialect {
    engine: String,
    settings: DialectSettings,
    capabilities: CapabilitySet,
}

impl Dialect {
    /// Build a dialect; fails when the settings lack any capability flag.
    pub fn new(engine: impl Into<String>, settings: SettingsMap) -> Result<Self> {
        let settings = DialectSettings::new(settings);
        let capabilities = CapabilitySet::resolve(&settings)?;
        Ok(Self {
            engine: engine.into(),
            settings,
            capabilities,
        })
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn settings(&self) -> &DialectSettings {
        &self.settings
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn supports(&self, cap: Capability) -> bool {
        self.capabilities.contains(cap)
    }

    pub fn supports_table_join(&self) -> bool {
        self.supports(Capability::TableJoin)
    }

    pub fn supports_full_join(&self) -> bool {
        self.supports(Capability::FullJoin)
    }

    pub fn supports_cross_join(&self) -> bool {
        self.supports(Capability::CrossJoin)
    }

    pub fn supports_subquery(&self) -> bool {
        self.supports(Capability::Subquery)
    }

    pub fn supports_cte(&self) -> bool {
        self.supports(Capability::Cte)
    }

    pub fn supports_temp_table(&self) -> bool {
        self.supports(Capability::TempTable)
    }

    pub fn supports_window_functions(&self) -> bool {
        self.supports(Capability::WindowFunctions)
    }

    pub fn supports_array_functions(&self) -> bool {
        self.supports(Capability::ArrayFunctions)
    }

    /// Apply a single-level instance override (see [`DialectSettings::apply_override`]).
    ///
    /// On failure the dialect is left unchanged.
    pub fn apply_override(&mut self, changes: &SettingsMap) -> Result<()> {
        let mut candidate = self.settings.clone();
        candidate.apply_override(changes);
        let capabilities = CapabilitySet::resolve(&candidate)?;
        if let Some(day) = candidate.text_opt(keys::WEEK_START_DAY) {
            day.parse::<WeekStart>()?;
        }
        self.settings = candidate;
        self.capabilities = capabilities;
        Ok(())
    }

    /// Undo the most recent override.
    pub fn restore(&mut self) -> Result<()> {
        let mut candidate = self.settings.clone();
        candidate.restore();
        self.capabilities = CapabilitySet::resolve(&candidate)?;
        self.settings = candidate;
        Ok(())
    }

    /// Override the configured week start day.
    pub fn set_week_start(&mut self, start: WeekStart) -> Result<()> {
        let mut changes = SettingsMap::new();
        changes.insert(keys::WEEK_START_DAY.to_string(), start.as_str().into());
        self.apply_override(&changes)
    }

    /// Configured week start day (falls back to the engine's native one).
    pub fn week_start(&self) -> Result<WeekStart> {
        match self.settings.text_opt(keys::WEEK_START_DAY) {
            Some(day) => day.parse(),
            None => self.native_week_start(),
        }
    }

    /// Week start day the engine's native truncation uses.
    pub fn native_week_start(&self) -> Result<WeekStart> {
        self.settings.text(keys::NATIVE_WEEK_START_DAY)?.parse()
    }

    pub(crate) fn template(&self, key: &str) -> Result<Template<'_>> {
        self.settings.text(key).map(Template::new)
    }

    pub(crate) fn text(&self, key: &str) -> Result<&str> {
        self.settings.text(key)
    }

    pub(crate) fn flag(&self, key: &str) -> Result<bool> {
        self.settings.flag(key)
    }

    /// Check the capability a function needs, including any `requires.<function>`
    /// declared by the engine overlay.
    pub(crate) fn check_function(&self, function: &str, builtin: Option<Capability>) -> Result<()> {
        if let Some(cap) = builtin {
            self.capabilities.require(cap, function)?;
        }
        if let Some(name) = self.settings.text_opt(&keys::nested(keys::REQUIRES_PREFIX, function)) {
            let cap: Capability = name.parse().map_err(|_| {
                BridgeError::ConfigurationError(format!(
                    "Function '{}' requires unknown capability '{}'",
                    function, name
                ))
            })?;
            self.capabilities.require(cap, function)?;
        }
        Ok(())
    }
}
