//! Named date range presets for the dashboard.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The format used for the `start` and `end` query parameters.
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// The only ranges the dashboard offers. There are no custom ranges.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    ThisMonth,
    LastMonth,
    #[serde(rename = "last-3-months")]
    #[value(name = "last-3-months")]
    Last3Months,
}

serde_plain::derive_display_from_serialize!(Preset);
serde_plain::derive_fromstr_from_deserialize!(Preset);

impl Preset {
    pub fn label(&self) -> &'static str {
        match self {
            Preset::ThisMonth => "This Month",
            Preset::LastMonth => "Last Month",
            Preset::Last3Months => "Last 3 Months",
        }
    }

    /// Resolves this preset against `today`.
    ///
    /// - `ThisMonth`: first day of the current month through `today`.
    /// - `LastMonth`: the whole previous calendar month.
    /// - `Last3Months`: first day of the month two months back through `today`.
    pub fn range(&self, today: NaiveDate) -> DateRange {
        let this_month = first_of_month(today);
        let (start, end) = match self {
            Preset::ThisMonth => (this_month, today),
            Preset::LastMonth => {
                let start = months_back(this_month, 1);
                let end = this_month.pred_opt().unwrap_or(this_month);
                (start, end)
            }
            Preset::Last3Months => (months_back(this_month, 2), today),
        };
        DateRange {
            start,
            end,
            label: self.label().to_string(),
        }
    }
}

/// A closed interval of dates, `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl DateRange {
    /// `start` and `end` formatted for the transactions query.
    pub fn query_params(&self) -> (String, String) {
        (
            self.start.format(QUERY_DATE_FORMAT).to_string(),
            self.end.format(QUERY_DATE_FORMAT).to_string(),
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} - {})",
            self.label,
            self.start.format("%d/%m/%Y"),
            self.end.format("%d/%m/%Y")
        )
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `first` must be the first of a month, which always exists in earlier months.
fn months_back(first: NaiveDate, n: u32) -> NaiveDate {
    first.checked_sub_months(Months::new(n)).unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, QUERY_DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_last_month_leap_year() {
        let r = Preset::LastMonth.range(date("2024-03-15"));
        assert_eq!(r.start, date("2024-02-01"));
        assert_eq!(r.end, date("2024-02-29"));
        assert_eq!(r.label, "Last Month");
    }

    #[test]
    fn test_last_month_across_year() {
        let r = Preset::LastMonth.range(date("2025-01-10"));
        assert_eq!(r.start, date("2024-12-01"));
        assert_eq!(r.end, date("2024-12-31"));
    }

    #[test]
    fn test_this_month() {
        let r = Preset::ThisMonth.range(date("2024-03-15"));
        assert_eq!(r.start, date("2024-03-01"));
        assert_eq!(r.end, date("2024-03-15"));
        assert_eq!(r.label, "This Month");
    }

    #[test]
    fn test_this_month_on_first_day() {
        let r = Preset::ThisMonth.range(date("2024-03-01"));
        assert_eq!(r.start, r.end);
    }

    #[test]
    fn test_last_3_months() {
        let r = Preset::Last3Months.range(date("2024-03-15"));
        assert_eq!(r.start, date("2024-01-01"));
        assert_eq!(r.end, date("2024-03-15"));

        let r = Preset::Last3Months.range(date("2024-02-29"));
        assert_eq!(r.start, date("2023-12-01"));
    }

    #[test]
    fn test_start_never_after_end() {
        let mut day = date("2023-01-01");
        while day < date("2025-01-01") {
            for p in [Preset::ThisMonth, Preset::LastMonth, Preset::Last3Months] {
                let r = p.range(day);
                assert!(r.start <= r.end, "{p} at {day}");
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_query_params() {
        let r = Preset::LastMonth.range(date("2024-03-15"));
        assert_eq!(
            r.query_params(),
            ("2024-02-01".to_string(), "2024-02-29".to_string())
        );
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Preset::Last3Months.to_string(), "last-3-months");
        assert_eq!(Preset::from_str("this-month").unwrap(), Preset::ThisMonth);
    }
}
