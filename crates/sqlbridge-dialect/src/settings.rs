//! Dialect settings store.
//!
//! Settings are a flat map of dotted keys to either template text or boolean
//! flags. Generic defaults are merged with a per-engine overlay once per engine
//! type; each adapter instance then owns a copy it may shadow with a
//! single-level override.

use log::warn;
use sqlbridge_commons::{BridgeError, Result};
use std::collections::BTreeMap;

/// A single setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// Template or plain text (type names, patterns, tokens)
    Text(String),
    /// Capability or behavior flag
    Flag(bool),
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Flag(value)
    }
}

/// Effective key → value map.
pub type SettingsMap = BTreeMap<String, SettingValue>;

/// Merge an overlay over defaults. Overlay keys win; a missing overlay yields the
/// defaults unchanged.
pub fn load(defaults: &SettingsMap, overlay: Option<&SettingsMap>) -> SettingsMap {
    let mut effective = defaults.clone();
    if let Some(overlay) = overlay {
        merge_into(&mut effective, overlay);
    }
    effective
}

fn merge_into(target: &mut SettingsMap, changes: &SettingsMap) {
    for (key, value) in changes {
        target.insert(key.clone(), value.clone());
    }
}

/// Parse a nested TOML document into a flat settings map.
///
/// Nested tables flatten to dotted keys. Strings become text, booleans become
/// flags and numbers are kept as their text form. Arrays have no meaning in a
/// settings document and are skipped with a warning.
pub fn parse_document(text: &str) -> Result<SettingsMap> {
    let table: toml::Table = toml::from_str(text)?;
    let mut settings = SettingsMap::new();
    flatten_table("", &table, &mut settings);
    Ok(settings)
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut SettingsMap) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        match value {
            toml::Value::Table(inner) => flatten_table(&key, inner, out),
            toml::Value::String(s) => {
                out.insert(key, SettingValue::Text(s.clone()));
            },
            toml::Value::Boolean(b) => {
                out.insert(key, SettingValue::Flag(*b));
            },
            toml::Value::Integer(i) => {
                out.insert(key, SettingValue::Text(i.to_string()));
            },
            toml::Value::Float(f) => {
                out.insert(key, SettingValue::Text(f.to_string()));
            },
            toml::Value::Datetime(dt) => {
                out.insert(key, SettingValue::Text(dt.to_string()));
            },
            toml::Value::Array(_) => {
                warn!("[DIALECT] Ignoring array value for setting '{}'", key);
            },
        }
    }
}

/// Per-instance settings with a single-level restore point.
///
/// Applying an override first restores the state saved before the previous
/// override, then saves the current state as the new restore point and merges
/// the changes. Only the most recent override can be undone; overrides applied
/// back to back without a restore do not stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialectSettings {
    current: SettingsMap,
    restore_point: Option<SettingsMap>,
}

impl DialectSettings {
    pub fn new(settings: SettingsMap) -> Self {
        Self {
            current: settings,
            restore_point: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.current.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.current.contains_key(key)
    }

    /// Text value of a key; missing or non-text keys are configuration errors.
    pub fn text(&self, key: &str) -> Result<&str> {
        match self.current.get(key) {
            Some(SettingValue::Text(s)) => Ok(s.as_str()),
            Some(SettingValue::Flag(_)) => Err(BridgeError::ConfigurationError(format!(
                "Dialect setting '{}' is a flag, expected text",
                key
            ))),
            None => Err(BridgeError::ConfigurationError(format!(
                "Dialect setting '{}' is not loaded",
                key
            ))),
        }
    }

    /// Text value of a key, `None` when absent.
    pub fn text_opt(&self, key: &str) -> Option<&str> {
        match self.current.get(key) {
            Some(SettingValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Flag value of a key; missing or non-flag keys are configuration errors.
    pub fn flag(&self, key: &str) -> Result<bool> {
        match self.current.get(key) {
            Some(SettingValue::Flag(b)) => Ok(*b),
            Some(SettingValue::Text(_)) => Err(BridgeError::ConfigurationError(format!(
                "Dialect setting '{}' is text, expected a flag",
                key
            ))),
            None => Err(BridgeError::ConfigurationError(format!(
                "Dialect setting '{}' is not loaded",
                key
            ))),
        }
    }

    /// Apply a single-level override.
    pub fn apply_override(&mut self, changes: &SettingsMap) {
        if let Some(previous) = self.restore_point.take() {
            self.current = previous;
        }
        self.restore_point = Some(self.current.clone());
        merge_into(&mut self.current, changes);
    }

    /// Undo the most recent override. No-op without a restore point.
    pub fn restore(&mut self) {
        if let Some(previous) = self.restore_point.take() {
            self.current = previous;
        }
    }

    pub fn has_restore_point(&self) -> bool {
        self.restore_point.is_some()
    }

    pub fn as_map(&self) -> &SettingsMap {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, SettingValue)]) -> SettingsMap {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn defaults() -> SettingsMap {
        map(&[
            ("functions.trim", "TRIM({expression})".into()),
            ("capabilities.cte", true.into()),
            ("types.date", "DATE".into()),
        ])
    }

    #[test]
    fn test_overlay_wins_per_key() {
        let overlay = map(&[
            ("capabilities.cte", false.into()),
            ("types.string", "VARCHAR".into()),
        ]);
        let merged = load(&defaults(), Some(&overlay));
        assert_eq!(merged.get("capabilities.cte"), Some(&SettingValue::Flag(false)));
        assert_eq!(merged.get("types.string"), Some(&SettingValue::Text("VARCHAR".into())));
        assert_eq!(merged.get("types.date"), Some(&SettingValue::Text("DATE".into())));
    }

    #[test]
    fn test_missing_overlay_keeps_defaults() {
        assert_eq!(load(&defaults(), None), defaults());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let empty = SettingsMap::new();
        assert_eq!(load(&defaults(), Some(&empty)), defaults());

        let overlay = map(&[("types.date", "DATE32".into())]);
        let once = load(&defaults(), Some(&overlay));
        let twice = load(&once, Some(&overlay));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_document_flattens_tables() {
        let parsed = parse_document(
            r#"
            [functions]
            trim = "LTRIM(RTRIM({expression}))"

            [capabilities]
            cte = false

            [extract_units]
            day_of_week = "DOW"
            "#,
        )
        .expect("document should parse");

        assert_eq!(
            parsed.get("functions.trim"),
            Some(&SettingValue::Text("LTRIM(RTRIM({expression}))".into()))
        );
        assert_eq!(parsed.get("capabilities.cte"), Some(&SettingValue::Flag(false)));
        assert_eq!(parsed.get("extract_units.day_of_week"), Some(&SettingValue::Text("DOW".into())));
    }

    #[test]
    fn test_parse_document_rejects_malformed() {
        assert!(parse_document("[functions\ntrim = ").is_err());
    }

    #[test]
    fn test_override_and_restore() {
        let mut settings = DialectSettings::new(defaults());
        settings.apply_override(&map(&[("capabilities.cte", false.into())]));
        assert!(!settings.flag("capabilities.cte").unwrap());
        assert!(settings.has_restore_point());

        settings.restore();
        assert!(settings.flag("capabilities.cte").unwrap());
        assert!(!settings.has_restore_point());
    }

    #[test]
    fn test_restore_without_override_is_noop() {
        let mut settings = DialectSettings::new(defaults());
        settings.restore();
        assert_eq!(settings.as_map(), &defaults());
    }

    #[test]
    fn test_repeated_overrides_are_single_level() {
        let mut settings = DialectSettings::new(defaults());
        settings.apply_override(&map(&[("types.date", "DATE32".into())]));
        settings.apply_override(&map(&[("capabilities.cte", false.into())]));

        // The first override is discarded by the second one.
        assert_eq!(settings.text("types.date").unwrap(), "DATE");
        assert!(!settings.flag("capabilities.cte").unwrap());

        // Restoring goes straight back to the original state.
        settings.restore();
        assert_eq!(settings.as_map(), &defaults());
    }

    #[test]
    fn test_missing_and_mistyped_keys() {
        let settings = DialectSettings::new(defaults());
        assert!(matches!(
            settings.text("functions.upper"),
            Err(BridgeError::ConfigurationError(_))
        ));
        assert!(settings.flag("functions.trim").is_err());
        assert!(settings.text("capabilities.cte").is_err());
        assert_eq!(settings.text_opt("functions.upper"), None);
    }
}
