//! Dialect-specific SQL function rendering.
//!
//! Every function looks up one template per family, checks the capability the
//! function needs and substitutes its arguments. Nothing here parses SQL; the
//! arguments are SQL fragments produced by the caller.

use crate::calendar::WeekStart;
use crate::capabilities::Capability;
use crate::dialect::Dialect;
use crate::keys;
use crate::template::Substitutions;
use chrono::{NaiveDate, NaiveDateTime};
use sqlbridge_commons::{BridgeError, Result};
use std::fmt;
use std::str::FromStr;

/// Rendered SQL text.
pub type SqlFragment = String;

/// Date/time units understood by truncation and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl DateUnit {
    pub fn name(self) -> &'static str {
        match self {
            DateUnit::Millisecond => "millisecond",
            DateUnit::Second => "second",
            DateUnit::Minute => "minute",
            DateUnit::Hour => "hour",
            DateUnit::Day => "day",
            DateUnit::Week => "week",
            DateUnit::Month => "month",
            DateUnit::Quarter => "quarter",
            DateUnit::Year => "year",
        }
    }

    /// Units finer than a day keep their timestamp type after truncation.
    pub fn is_sub_daily(self) -> bool {
        matches!(
            self,
            DateUnit::Millisecond | DateUnit::Second | DateUnit::Minute | DateUnit::Hour
        )
    }
}

impl fmt::Display for DateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DateUnit {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let unit = match s.trim().to_lowercase().trim_end_matches('s') {
            "millisecond" => DateUnit::Millisecond,
            "second" => DateUnit::Second,
            "minute" => DateUnit::Minute,
            "hour" => DateUnit::Hour,
            "day" => DateUnit::Day,
            "week" => DateUnit::Week,
            "month" => DateUnit::Month,
            "quarter" => DateUnit::Quarter,
            "year" => DateUnit::Year,
            other => {
                return Err(BridgeError::ConfigurationError(format!("Unknown date unit '{}'", other)));
            },
        };
        Ok(unit)
    }
}

/// Fields for `extract`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateField {
    Year,
    Month,
    Quarter,
    DayOfYear,
    DayOfMonth,
    DayOfWeek,
    WeekOfYear,
    Hour,
    Minute,
    YearMonth,
}

impl DateField {
    pub fn name(self) -> &'static str {
        match self {
            DateField::Year => "year",
            DateField::Month => "month",
            DateField::Quarter => "quarter",
            DateField::DayOfYear => "day_of_year",
            DateField::DayOfMonth => "day_of_month",
            DateField::DayOfWeek => "day_of_week",
            DateField::WeekOfYear => "week_of_year",
            DateField::Hour => "hour",
            DateField::Minute => "minute",
            DateField::YearMonth => "year_month",
        }
    }
}

/// Day or month name extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamePart {
    DayName,
    DayNameShort,
    MonthName,
    MonthNameShort,
}

impl NamePart {
    fn name(self) -> &'static str {
        match self {
            NamePart::DayName => "day_name",
            NamePart::DayNameShort => "day_name_short",
            NamePart::MonthName => "month_name",
            NamePart::MonthNameShort => "month_name_short",
        }
    }

    fn token_key(self) -> &'static str {
        match self {
            NamePart::DayName => keys::DAY_NAME_TOKEN,
            NamePart::DayNameShort => keys::DAY_NAME_SHORT_TOKEN,
            NamePart::MonthName => keys::MONTH_NAME_TOKEN,
            NamePart::MonthNameShort => keys::MONTH_NAME_SHORT_TOKEN,
        }
    }
}

/// Input to literal construction: already formatted text or a native value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    Formatted(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl From<NaiveDate> for DateValue {
    fn from(value: NaiveDate) -> Self {
        DateValue::Date(value)
    }
}

impl From<NaiveDateTime> for DateValue {
    fn from(value: NaiveDateTime) -> Self {
        DateValue::Timestamp(value)
    }
}

impl From<&str> for DateValue {
    fn from(value: &str) -> Self {
        DateValue::Formatted(value.to_string())
    }
}

impl Dialect {
    fn render(&self, key: &str, subs: &Substitutions) -> Result<String> {
        Ok(self.template(key)?.render(subs))
    }

    fn unit_token(&self, unit: DateUnit) -> String {
        self.settings()
            .text_opt(&keys::nested(keys::UNIT_PREFIX, unit.name()))
            .map(|s| s.to_string())
            .unwrap_or_else(|| unit.name().to_string())
    }

    fn type_name(&self, logical: &str) -> String {
        self.settings()
            .text_opt(&keys::nested(keys::TYPE_PREFIX, logical))
            .map(|s| s.to_string())
            .unwrap_or_else(|| logical.to_uppercase())
    }

    pub fn trim(&self, expression: &str) -> Result<SqlFragment> {
        self.check_function("trim", None)?;
        self.render(keys::TRIM, &Substitutions::new().expression(expression))
    }

    pub fn upper(&self, expression: &str) -> Result<SqlFragment> {
        self.check_function("upper", None)?;
        self.render(keys::UPPER, &Substitutions::new().expression(expression))
    }

    pub fn lower(&self, expression: &str) -> Result<SqlFragment> {
        self.check_function("lower", None)?;
        self.render(keys::LOWER, &Substitutions::new().expression(expression))
    }

    /// Quote an identifier, doubling embedded identifier quote characters.
    pub fn quote_identifier(&self, identifier: &str) -> Result<SqlFragment> {
        let quote = self.text(keys::IDENTIFIER_QUOTE)?;
        let escaped = double_quote_chars(identifier, quote);
        self.render(keys::QUOTE_IDENTIFIER, &Substitutions::new().value(escaped))
    }

    /// String literal with embedded quote characters doubled.
    pub fn string_literal(&self, value: &str) -> Result<SqlFragment> {
        let quote = self.text(keys::STRING_QUOTE)?;
        let escaped = double_quote_chars(value, quote);
        self.render(keys::STRING_LITERAL, &Substitutions::new().value(escaped))
    }

    pub fn cross_join(&self, relation: &str, alias: &str) -> Result<SqlFragment> {
        self.check_function("cross_join", Some(Capability::CrossJoin))?;
        self.render(keys::CROSS_JOIN, &Substitutions::new().relation(relation).alias(alias))
    }

    /// Cast to a logical type (`date`, `timestamp`, `string`, ...), mapped through
    /// the dialect's `types.*` names.
    pub fn cast(&self, expression: &str, logical_type: &str) -> Result<SqlFragment> {
        self.check_function("cast", None)?;
        let type_name = self.type_name(logical_type);
        self.render(
            keys::CAST,
            &Substitutions::new().expression(expression).type_name(type_name),
        )
    }

    /// Truncate to `unit`.
    ///
    /// Week truncation uses the dedicated adjustment template for the configured
    /// start day when it differs from the engine's native one. Results truncated
    /// to a day or coarser are cast to the dialect's date type.
    pub fn date_trunc(&self, unit: DateUnit, expression: &str) -> Result<SqlFragment> {
        self.check_function("date_trunc", None)?;
        let subs = Substitutions::new().unit(self.unit_token(unit)).expression(expression);

        let truncated = if unit == DateUnit::Week && self.week_start()? != self.native_week_start()? {
            let key = match self.week_start()? {
                WeekStart::Monday => keys::DATE_TRUNC_WEEK_MONDAY,
                WeekStart::Sunday => keys::DATE_TRUNC_WEEK_SUNDAY,
            };
            self.render(key, &subs)?
        } else {
            self.render(keys::DATE_TRUNC, &subs)?
        };

        if unit.is_sub_daily() {
            Ok(truncated)
        } else {
            self.cast(&truncated, "date")
        }
    }

    /// Add `offset` units to an expression. Quarters become three months on
    /// engines without a native quarter interval.
    pub fn date_add(&self, unit: DateUnit, offset: i64, expression: &str) -> Result<SqlFragment> {
        self.check_function("date_add", None)?;
        let (unit, offset) = if unit == DateUnit::Quarter && !self.supports(Capability::QuarterInterval) {
            let months = offset.checked_mul(3).ok_or_else(|| {
                BridgeError::ConfigurationError(format!("Quarter offset {} is out of range", offset))
            })?;
            (DateUnit::Month, months)
        } else {
            (unit, offset)
        };

        self.render(
            keys::DATE_ADD,
            &Substitutions::new()
                .unit(self.unit_token(unit))
                .value(offset.to_string())
                .expression(expression),
        )
    }

    /// Difference `end - start` in `unit`. `{expression}` is the start and
    /// `{value}` the end.
    pub fn date_diff(&self, unit: DateUnit, start: &str, end: &str) -> Result<SqlFragment> {
        self.check_function("date_diff", None)?;
        self.render(
            keys::DATE_DIFF,
            &Substitutions::new().unit(self.unit_token(unit)).expression(start).value(end),
        )
    }

    /// Format with an engine-native pattern.
    pub fn date_format(&self, expression: &str, pattern: &str) -> Result<SqlFragment> {
        self.check_function("date_format", None)?;
        self.render(keys::DATE_FORMAT, &Substitutions::new().expression(expression).value(pattern))
    }

    pub fn date_literal(&self, value: impl Into<DateValue>) -> Result<SqlFragment> {
        let text = match value.into() {
            DateValue::Formatted(s) => s,
            DateValue::Date(d) => d.format(self.text(keys::DATE_LITERAL_PATTERN)?).to_string(),
            DateValue::Timestamp(ts) => {
                ts.date().format(self.text(keys::DATE_LITERAL_PATTERN)?).to_string()
            },
        };
        self.render(keys::DATE_LITERAL, &Substitutions::new().value(text))
    }

    pub fn timestamp_literal(&self, value: impl Into<DateValue>) -> Result<SqlFragment> {
        let text = match value.into() {
            DateValue::Formatted(s) => s,
            DateValue::Date(d) => d
                .and_time(chrono::NaiveTime::MIN)
                .format(self.text(keys::TIMESTAMP_LITERAL_PATTERN)?)
                .to_string(),
            DateValue::Timestamp(ts) => ts.format(self.text(keys::TIMESTAMP_LITERAL_PATTERN)?).to_string(),
        };
        self.render(keys::TIMESTAMP_LITERAL, &Substitutions::new().value(text))
    }

    /// Extract a date part. A field-specific `extract.<field>` template wins over
    /// the generic `functions.extract_field` template; year-month uses the
    /// formatting template with the dialect's year-month token.
    pub fn extract(&self, field: DateField, expression: &str) -> Result<SqlFragment> {
        self.check_function("extract", None)?;
        if let Some(template) = self
            .settings()
            .text_opt(&keys::nested(keys::EXTRACT_PREFIX, field.name()))
        {
            return Ok(crate::template::Template::new(template)
                .render(&Substitutions::new().expression(expression)));
        }

        if field == DateField::YearMonth {
            return self.date_format(expression, self.text(keys::YEAR_MONTH_TOKEN)?);
        }

        let unit = self.text(&keys::nested(keys::EXTRACT_UNIT_PREFIX, field.name()))?;
        self.render(keys::EXTRACT_FIELD, &Substitutions::new().unit(unit).expression(expression))
    }

    /// Day or month name, upper-cased when the dialect normalizes name casing.
    ///
    /// A `names.<part>` template wins; otherwise the formatting template is
    /// rendered with the part's locale-style token.
    pub fn name_of(&self, part: NamePart, expression: &str) -> Result<SqlFragment> {
        let formatted = match self.settings().text_opt(&keys::nested(keys::NAME_PREFIX, part.name())) {
            Some(template) => {
                crate::template::Template::new(template).render(&Substitutions::new().expression(expression))
            },
            None => self.date_format(expression, self.text(part.token_key())?)?,
        };
        if self.flag(keys::UPPERCASE_NAMES)? {
            self.upper(&formatted)
        } else {
            Ok(formatted)
        }
    }

    pub fn day_name(&self, expression: &str) -> Result<SqlFragment> {
        self.name_of(NamePart::DayName, expression)
    }

    pub fn day_name_short(&self, expression: &str) -> Result<SqlFragment> {
        self.name_of(NamePart::DayNameShort, expression)
    }

    pub fn month_name(&self, expression: &str) -> Result<SqlFragment> {
        self.name_of(NamePart::MonthName, expression)
    }

    pub fn month_name_short(&self, expression: &str) -> Result<SqlFragment> {
        self.name_of(NamePart::MonthNameShort, expression)
    }

    pub fn coalesce(&self, expressions: &[&str]) -> Result<SqlFragment> {
        if expressions.is_empty() {
            return Err(BridgeError::ConfigurationError(
                "coalesce requires at least one expression".to_string(),
            ));
        }
        self.check_function("coalesce", None)?;
        self.render(keys::COALESCE, &Substitutions::new().list(expressions.join(", ")))
    }

    pub fn nullif(&self, expression: &str, value: &str) -> Result<SqlFragment> {
        self.check_function("nullif", None)?;
        self.render(keys::NULLIF, &Substitutions::new().expression(expression).value(value))
    }

    pub fn nullif_zero(&self, expression: &str) -> Result<SqlFragment> {
        self.check_function("nullif_zero", None)?;
        self.render(keys::NULLIF_ZERO, &Substitutions::new().expression(expression))
    }

    /// `value` is a member of the array `expression`.
    pub fn array_contains(&self, expression: &str, value: &str) -> Result<SqlFragment> {
        self.check_function("array_contains", Some(Capability::ArrayFunctions))?;
        self.render(keys::ARRAY_CONTAINS, &Substitutions::new().expression(expression).value(value))
    }

    /// `value` is not a member of the array `expression`.
    pub fn array_not_contains(&self, expression: &str, value: &str) -> Result<SqlFragment> {
        self.check_function("array_not_contains", Some(Capability::ArrayFunctions))?;
        self.render(
            keys::ARRAY_NOT_CONTAINS,
            &Substitutions::new().expression(expression).value(value),
        )
    }

    /// Join clause that unnests the array `expression` as `alias`.
    pub fn array_unnest_join(&self, expression: &str, alias: &str) -> Result<SqlFragment> {
        self.check_function("array_unnest_join", Some(Capability::ArrayFunctions))?;
        self.render(
            keys::ARRAY_UNNEST_JOIN,
            &Substitutions::new().expression(expression).alias(alias),
        )
    }
}

fn double_quote_chars(value: &str, quote: &str) -> String {
    if quote.is_empty() {
        return value.to_string();
    }
    value.replace(quote, &format!("{}{}", quote, quote))
}
