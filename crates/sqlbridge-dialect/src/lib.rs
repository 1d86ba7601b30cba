//! sqlbridge-dialect
//!
//! Declarative SQL dialect translation. Generic defaults and per-engine overlays
//! merge into one settings map per engine type; a [`Dialect`] built from that map
//! renders function templates and answers capability and behavior questions.
//!
//! ```rust,ignore
//! use sqlbridge_dialect::{DateUnit, DialectCatalog};
//!
//! let catalog = DialectCatalog::new()?;
//! let dialect = catalog.dialect("snowflake")?;
//! let sql = dialect.date_trunc(DateUnit::Month, "created_at")?;
//! ```

pub mod calendar;
pub mod capabilities;
pub mod catalog;
pub mod dialect;
pub mod functions;
pub mod keys;
pub mod policy;
pub mod settings;
pub mod template;

pub use calendar::{end_of_day, week_start_date, WeekStart};
pub use capabilities::{Capability, CapabilitySet};
pub use catalog::{normalize_engine, DialectCatalog};
pub use dialect::Dialect;
pub use functions::{DateField, DateUnit, DateValue, NamePart, SqlFragment};
pub use policy::{BehaviorPolicy, DateFilterPushdown, FactMergeJoin, RangeEnd, TempTableStrategy};
pub use settings::{DialectSettings, SettingValue, SettingsMap};
pub use template::{Placeholder, Substitutions, Template};
