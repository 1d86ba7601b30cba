//! Symbolic setting keys.
//!
//! Nested overlay documents flatten to these dotted keys.

// Function templates
pub const TRIM: &str = "functions.trim";
pub const UPPER: &str = "functions.upper";
pub const LOWER: &str = "functions.lower";
pub const QUOTE_IDENTIFIER: &str = "functions.quote_identifier";
pub const STRING_LITERAL: &str = "functions.string_literal";
pub const CROSS_JOIN: &str = "functions.cross_join";
pub const CAST: &str = "functions.cast";
pub const DATE_TRUNC: &str = "functions.date_trunc";
pub const DATE_TRUNC_WEEK_MONDAY: &str = "functions.date_trunc_week_monday";
pub const DATE_TRUNC_WEEK_SUNDAY: &str = "functions.date_trunc_week_sunday";
pub const DATE_ADD: &str = "functions.date_add";
pub const DATE_DIFF: &str = "functions.date_diff";
pub const DATE_FORMAT: &str = "functions.date_format";
pub const DATE_LITERAL: &str = "functions.date_literal";
pub const TIMESTAMP_LITERAL: &str = "functions.timestamp_literal";
pub const EXTRACT_FIELD: &str = "functions.extract_field";
pub const COALESCE: &str = "functions.coalesce";
pub const NULLIF: &str = "functions.nullif";
pub const NULLIF_ZERO: &str = "functions.nullif_zero";
pub const ARRAY_CONTAINS: &str = "functions.array_contains";
pub const ARRAY_NOT_CONTAINS: &str = "functions.array_not_contains";
pub const ARRAY_UNNEST_JOIN: &str = "functions.array_unnest_join";

// Per-field extraction: `extract.<field>` template, else `extract_units.<field>` token
pub const EXTRACT_PREFIX: &str = "extract";
pub const EXTRACT_UNIT_PREFIX: &str = "extract_units";

// Per-name override: `names.<part>` template, else the `formats.<part>` token
pub const NAME_PREFIX: &str = "names";

// Dialect tokens for date units (`units.<unit>`); missing units use the lowercase name
pub const UNIT_PREFIX: &str = "units";

// Extra capability requirements (`requires.<function>` = capability name)
pub const REQUIRES_PREFIX: &str = "requires";

// Quoting
pub const STRING_QUOTE: &str = "strings.quote_char";
pub const IDENTIFIER_QUOTE: &str = "strings.identifier_quote";

// Type names
pub const TYPE_DATE: &str = "types.date";
pub const TYPE_TIMESTAMP: &str = "types.timestamp";
pub const TYPE_PREFIX: &str = "types";

// Formatting patterns and locale tokens
pub const DATE_LITERAL_PATTERN: &str = "formats.date_literal_pattern";
pub const TIMESTAMP_LITERAL_PATTERN: &str = "formats.timestamp_literal_pattern";
pub const DAY_NAME_TOKEN: &str = "formats.day_name";
pub const DAY_NAME_SHORT_TOKEN: &str = "formats.day_name_short";
pub const MONTH_NAME_TOKEN: &str = "formats.month_name";
pub const MONTH_NAME_SHORT_TOKEN: &str = "formats.month_name_short";
pub const YEAR_MONTH_TOKEN: &str = "formats.year_month";
pub const UPPERCASE_NAMES: &str = "formats.uppercase_names";

// Calendar
pub const WEEK_START_DAY: &str = "calendar.week_start_day";
pub const NATIVE_WEEK_START_DAY: &str = "calendar.native_week_start_day";

// Capabilities
pub const CAP_TABLE_JOIN: &str = "capabilities.table_join";
pub const CAP_FULL_JOIN: &str = "capabilities.full_join";
pub const CAP_CROSS_JOIN: &str = "capabilities.cross_join";
pub const CAP_SUBQUERY: &str = "capabilities.subquery";
pub const CAP_CTE: &str = "capabilities.cte";
pub const CAP_TEMP_TABLE: &str = "capabilities.temp_table";
pub const CAP_WINDOW_FUNCTIONS: &str = "capabilities.window_functions";
pub const CAP_ARRAY_FUNCTIONS: &str = "capabilities.array_functions";
pub const CAP_QUARTER_INTERVAL: &str = "capabilities.quarter_interval";

// Behavior policy
pub const TEMP_TABLE_STRATEGY: &str = "behavior.temp_table_strategy";
pub const ARRAY_FILTER_REQUIRES_HAVING: &str = "behavior.array_filter_requires_having";
pub const FACT_MERGE_JOIN: &str = "behavior.fact_merge_join";
pub const DATE_FILTER_PUSHDOWN: &str = "behavior.date_filter_pushdown";
pub const EXTEND_INCLUSIVE_END: &str = "behavior.extend_inclusive_end";

/// Join a prefix and a name into a dotted key.
pub fn nested(prefix: &str, name: &str) -> String {
    format!("{}.{}", prefix, name)
}
