//! Capability set resolved from dialect settings.

use crate::keys;
use crate::settings::DialectSettings;
use sqlbridge_commons::{BridgeError, Result};
use std::fmt;
use std::str::FromStr;

/// SQL features a dialect may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    TableJoin,
    FullJoin,
    CrossJoin,
    Subquery,
    Cte,
    TempTable,
    WindowFunctions,
    ArrayFunctions,
    QuarterInterval,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::TableJoin,
        Capability::FullJoin,
        Capability::CrossJoin,
        Capability::Subquery,
        Capability::Cte,
        Capability::TempTable,
        Capability::WindowFunctions,
        Capability::ArrayFunctions,
        Capability::QuarterInterval,
    ];

    /// Settings key holding this capability's flag.
    pub fn key(self) -> &'static str {
        match self {
            Capability::TableJoin => keys::CAP_TABLE_JOIN,
            Capability::FullJoin => keys::CAP_FULL_JOIN,
            Capability::CrossJoin => keys::CAP_CROSS_JOIN,
            Capability::Subquery => keys::CAP_SUBQUERY,
            Capability::Cte => keys::CAP_CTE,
            Capability::TempTable => keys::CAP_TEMP_TABLE,
            Capability::WindowFunctions => keys::CAP_WINDOW_FUNCTIONS,
            Capability::ArrayFunctions => keys::CAP_ARRAY_FUNCTIONS,
            Capability::QuarterInterval => keys::CAP_QUARTER_INTERVAL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Capability::TableJoin => "table_join",
            Capability::FullJoin => "full_join",
            Capability::CrossJoin => "cross_join",
            Capability::Subquery => "subquery",
            Capability::Cte => "cte",
            Capability::TempTable => "temp_table",
            Capability::WindowFunctions => "window_functions",
            Capability::ArrayFunctions => "array_functions",
            Capability::QuarterInterval => "quarter_interval",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Capability::ALL
            .iter()
            .copied()
            .find(|cap| cap.name() == s)
            .ok_or_else(|| BridgeError::ConfigurationError(format!("Unknown capability '{}'", s)))
    }
}

/// Bitset of supported capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(0)
    }

    /// Read every capability flag from the settings.
    ///
    /// Fails when any flag is absent: reading capabilities from a store that was
    /// never loaded is a programming error, not an unsupported feature.
    pub fn resolve(settings: &DialectSettings) -> Result<Self> {
        let mut set = Self::empty();
        for cap in Capability::ALL {
            if settings.flag(cap.key())? {
                set.insert(cap);
            }
        }
        Ok(set)
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn remove(&mut self, cap: Capability) {
        self.0 &= !cap.bit();
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Fail with `UnsupportedCapability` unless `cap` is present.
    pub fn require(&self, cap: Capability, function: &str) -> Result<()> {
        if self.contains(cap) {
            Ok(())
        } else {
            Err(BridgeError::unsupported(cap.name(), function))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|cap| self.contains(*cap))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}
