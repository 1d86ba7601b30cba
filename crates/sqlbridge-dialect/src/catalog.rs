//! Dialect catalog: generic defaults plus per-engine overlays, loaded once per
//! engine type.

use crate::calendar::WeekStart;
use crate::dialect::Dialect;
use crate::keys;
use crate::settings::{self, SettingsMap};
use dashmap::DashMap;
use log::{debug, info, warn};
use sqlbridge_commons::{BridgeError, DialectConfig, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const GENERIC: &str = include_str!("dialects/generic.toml");

/// Engine types with a bundled overlay.
pub const BUNDLED_ENGINES: [&str; 7] = [
    "bigquery",
    "clickhouse",
    "duckdb",
    "mssql",
    "postgres",
    "snowflake",
    "trino",
];

fn bundled_overlay(engine: &str) -> Option<&'static str> {
    let text = match engine {
        "bigquery" => include_str!("dialects/bigquery.toml"),
        "clickhouse" => include_str!("dialects/clickhouse.toml"),
        "duckdb" => include_str!("dialects/duckdb.toml"),
        "mssql" => include_str!("dialects/mssql.toml"),
        "postgres" => include_str!("dialects/postgres.toml"),
        "snowflake" => include_str!("dialects/snowflake.toml"),
        "trino" => include_str!("dialects/trino.toml"),
        _ => return None,
    };
    Some(text)
}

/// Canonical engine name: lowercase with common aliases folded.
pub fn normalize_engine(engine: &str) -> String {
    let lower = engine.trim().to_lowercase();
    match lower.as_str() {
        "postgresql" | "pg" | "redshift" => "postgres".to_string(),
        "sqlserver" | "sql_server" | "azure_sql" => "mssql".to_string(),
        "presto" | "athena" => "trino".to_string(),
        _ => lower,
    }
}

/// Effective settings per engine type.
///
/// Each engine is merged once on first use; concurrent first lookups for the same
/// engine load it exactly once. Every [`Dialect`] handed out owns its own copy.
pub struct DialectCatalog {
    defaults: Arc<SettingsMap>,
    overlay_dir: Option<PathBuf>,
    week_start: Option<WeekStart>,
    cache: DashMap<String, Arc<SettingsMap>>,
}

impl DialectCatalog {
    /// Catalog over the bundled generic defaults and bundled overlays.
    pub fn new() -> Result<Self> {
        let defaults = settings::parse_document(GENERIC).map_err(|e| {
            BridgeError::ConfigurationError(format!("Bundled generic dialect is invalid: {}", e))
        })?;
        Ok(Self {
            defaults: Arc::new(defaults),
            overlay_dir: None,
            week_start: None,
            cache: DashMap::new(),
        })
    }

    /// Catalog configured from the `[dialect]` config section.
    pub fn from_config(config: &DialectConfig) -> Result<Self> {
        let mut catalog = Self::new()?;
        if let Some(dir) = &config.overlay_dir {
            catalog = catalog.with_overlay_dir(dir);
        }
        if let Some(day) = &config.week_start_day {
            catalog = catalog.with_week_start(day.parse()?);
        }
        Ok(catalog)
    }

    /// Read `<engine>.toml` from `dir` before falling back to the bundled overlay.
    pub fn with_overlay_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.overlay_dir = Some(dir.as_ref().to_path_buf());
        self.cache.clear();
        self
    }

    /// Week start applied to every engine loaded afterwards.
    pub fn with_week_start(mut self, start: WeekStart) -> Self {
        self.week_start = Some(start);
        self.cache.clear();
        self
    }

    pub fn defaults(&self) -> &SettingsMap {
        &self.defaults
    }

    /// Effective settings for an engine type, loading them on first use.
    pub fn settings_for(&self, engine: &str) -> Arc<SettingsMap> {
        let engine = normalize_engine(engine);
        if let Some(found) = self.cache.get(&engine) {
            return Arc::clone(found.value());
        }

        let entry = self
            .cache
            .entry(engine.clone())
            .or_insert_with(|| Arc::new(self.load_engine(&engine)));
        Arc::clone(entry.value())
    }

    /// Build a per-instance dialect for an engine type.
    pub fn dialect(&self, engine: &str) -> Result<Dialect> {
        let engine = normalize_engine(engine);
        let effective = self.settings_for(&engine);
        Dialect::new(engine, (*effective).clone())
    }

    /// Engine types loaded so far.
    pub fn loaded_engines(&self) -> Vec<String> {
        let mut engines: Vec<String> = self.cache.iter().map(|e| e.key().clone()).collect();
        engines.sort();
        engines
    }

    fn load_engine(&self, engine: &str) -> SettingsMap {
        let overlay = self.overlay_document(engine);
        let mut effective = settings::load(&self.defaults, overlay.as_ref());
        if let Some(start) = self.week_start {
            effective.insert(keys::WEEK_START_DAY.to_string(), start.as_str().into());
        }
        info!(
            "[DIALECT] Loaded dialect '{}' ({} settings, overlay: {})",
            engine,
            effective.len(),
            overlay.is_some()
        );
        effective
    }

    fn overlay_document(&self, engine: &str) -> Option<SettingsMap> {
        if engine == "generic" {
            return None;
        }

        if let Some(dir) = &self.overlay_dir {
            let path = dir.join(format!("{}.toml", engine));
            if path.exists() {
                return match std::fs::read_to_string(&path)
                    .map_err(BridgeError::from)
                    .and_then(|text| settings::parse_document(&text))
                {
                    Ok(map) => {
                        debug!("[DIALECT] Using overlay {}", path.display());
                        Some(map)
                    },
                    Err(e) => {
                        warn!(
                            "[DIALECT] Malformed overlay {} ({}), using generic defaults",
                            path.display(),
                            e
                        );
                        None
                    },
                };
            }
        }

        match bundled_overlay(engine) {
            Some(text) => match settings::parse_document(text) {
                Ok(map) => Some(map),
                Err(e) => {
                    warn!("[DIALECT] Bundled overlay '{}' is malformed ({}), using generic defaults", engine, e);
                    None
                },
            },
            None => {
                warn!("[DIALECT] No overlay for engine '{}', using generic defaults", engine);
                None
            },
        }
    }
}
