//! Calendar semantics encoded by the week and date-range templates.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sqlbridge_commons::{BridgeError, Result};
use std::fmt;
use std::str::FromStr;

/// First day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekStart {
    Monday,
    Sunday,
}

impl WeekStart {
    pub fn as_str(self) -> &'static str {
        match self {
            WeekStart::Monday => "monday",
            WeekStart::Sunday => "sunday",
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeekStart {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "monday" => Ok(WeekStart::Monday),
            "sunday" => Ok(WeekStart::Sunday),
            other => Err(BridgeError::ConfigurationError(format!(
                "Invalid week start day '{}'. Must be one of: monday, sunday",
                other
            ))),
        }
    }
}

/// First day of the week containing `date`.
pub fn week_start_date(date: NaiveDate, start: WeekStart) -> NaiveDate {
    let offset = match start {
        WeekStart::Monday => date.weekday().num_days_from_monday(),
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
    };
    date - Duration::days(offset as i64)
}

/// Final representable instant of `date` at microsecond precision.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
    date.and_time(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_date() {
        // 2024-01-10 is a Wednesday
        assert_eq!(week_start_date(date(2024, 1, 10), WeekStart::Monday), date(2024, 1, 8));
        assert_eq!(week_start_date(date(2024, 1, 10), WeekStart::Sunday), date(2024, 1, 7));
        assert_eq!(week_start_date(date(2024, 1, 7), WeekStart::Sunday), date(2024, 1, 7));
    }

    #[test]
    fn test_monday_and_sunday_weeks_differ_by_one_day() {
        for day in 8..=13 {
            // Monday through Saturday
            let d = date(2024, 1, day);
            let monday = week_start_date(d, WeekStart::Monday);
            let sunday = week_start_date(d, WeekStart::Sunday);
            assert_eq!(monday - sunday, Duration::days(1));
            assert_eq!(monday.weekday(), Weekday::Mon);
            assert_eq!(sunday.weekday(), Weekday::Sun);
        }
    }

    #[test]
    fn test_end_of_day() {
        let end = end_of_day(date(2024, 2, 29));
        assert_eq!(end.to_string(), "2024-02-29 23:59:59.999999");
    }

    #[test]
    fn test_parse_week_start() {
        assert_eq!("Sunday".parse::<WeekStart>().unwrap(), WeekStart::Sunday);
        assert!("friday".parse::<WeekStart>().is_err());
    }
}
