//! Query-generation policy flags read from dialect settings.
//!
//! The SQL builder that consumes these lives outside this crate; the policy only
//! answers questions about how the engine prefers queries to be shaped.

use crate::calendar::end_of_day;
use crate::dialect::Dialect;
use crate::keys;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlbridge_commons::{BridgeError, Result};
use std::fmt;
use std::str::FromStr;

/// How intermediate results are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempTableStrategy {
    Cte,
    Subquery,
    TempTable,
}

impl FromStr for TempTableStrategy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cte" => Ok(TempTableStrategy::Cte),
            "subquery" => Ok(TempTableStrategy::Subquery),
            "temp_table" | "temporary_table" => Ok(TempTableStrategy::TempTable),
            other => Err(invalid(keys::TEMP_TABLE_STRATEGY, other)),
        }
    }
}

impl fmt::Display for TempTableStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TempTableStrategy::Cte => "cte",
            TempTableStrategy::Subquery => "subquery",
            TempTableStrategy::TempTable => "temp_table",
        };
        f.write_str(name)
    }
}

/// Join used to merge measures from independent fact sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FactMergeJoin {
    #[default]
    Full,
    Left,
    Inner,
}

impl FactMergeJoin {
    pub fn sql_keyword(self) -> &'static str {
        match self {
            FactMergeJoin::Full => "FULL OUTER JOIN",
            FactMergeJoin::Left => "LEFT JOIN",
            FactMergeJoin::Inner => "INNER JOIN",
        }
    }
}

impl FromStr for FactMergeJoin {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "full" | "full_outer" => Ok(FactMergeJoin::Full),
            "left" => Ok(FactMergeJoin::Left),
            "inner" => Ok(FactMergeJoin::Inner),
            other => Err(invalid(keys::FACT_MERGE_JOIN, other)),
        }
    }
}

/// Which joined tables receive a date-range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFilterPushdown {
    AllTables,
    HighestCardinality,
}

impl FromStr for DateFilterPushdown {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all_tables" | "all" => Ok(DateFilterPushdown::AllTables),
            "highest_cardinality" => Ok(DateFilterPushdown::HighestCardinality),
            other => Err(invalid(keys::DATE_FILTER_PUSHDOWN, other)),
        }
    }
}

fn invalid(key: &str, value: &str) -> BridgeError {
    BridgeError::ConfigurationError(format!("Invalid value '{}' for '{}'", value, key))
}

/// End boundary of an inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    /// The date itself, compared as a date
    Date(NaiveDate),
    /// The final instant of the day, for engines comparing as timestamps
    EndOfDay(NaiveDateTime),
}

impl RangeEnd {
    pub fn as_datetime(self) -> NaiveDateTime {
        match self {
            RangeEnd::Date(d) => d.and_time(NaiveTime::MIN),
            RangeEnd::EndOfDay(ts) => ts,
        }
    }
}

/// Snapshot of a dialect's behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorPolicy {
    pub temp_table_strategy: TempTableStrategy,
    pub array_filter_requires_having: bool,
    pub fact_merge_join: FactMergeJoin,
    pub date_filter_pushdown: DateFilterPushdown,
    pub extend_inclusive_end: bool,
}

impl BehaviorPolicy {
    pub fn from_dialect(dialect: &Dialect) -> Result<Self> {
        let settings = dialect.settings();
        Ok(Self {
            temp_table_strategy: settings.text(keys::TEMP_TABLE_STRATEGY)?.parse()?,
            array_filter_requires_having: settings.flag(keys::ARRAY_FILTER_REQUIRES_HAVING)?,
            fact_merge_join: settings.text(keys::FACT_MERGE_JOIN)?.parse()?,
            date_filter_pushdown: settings.text(keys::DATE_FILTER_PUSHDOWN)?.parse()?,
            extend_inclusive_end: settings.flag(keys::EXTEND_INCLUSIVE_END)?,
        })
    }

    pub fn inclusive_range_end(&self, date: NaiveDate) -> RangeEnd {
        if self.extend_inclusive_end {
            RangeEnd::EndOfDay(end_of_day(date))
        } else {
            RangeEnd::Date(date)
        }
    }
}

impl Dialect {
    pub fn behavior(&self) -> Result<BehaviorPolicy> {
        BehaviorPolicy::from_dialect(self)
    }
}
