use serde::Deserialize;
use time::macros::{format_description, time};
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

/// Query-string shape shared by the diet and exercise window endpoints.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub date: String,
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
}

fn default_granularity() -> Granularity {
    Granularity::Day
}

/// Inclusive date range used to scope entry queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Date,
    pub end: Date,
}

impl Window {
    pub fn compute(reference: Date, granularity: Granularity) -> Window {
        match granularity {
            Granularity::Day => Window {
                start: reference,
                end: reference,
            },
            Granularity::Week => {
                let start = reference
                    - Duration::days(i64::from(reference.weekday().number_days_from_monday()));
                Window {
                    start,
                    end: start + Duration::days(6),
                }
            }
            Granularity::Month => {
                let last = time::util::days_in_year_month(reference.year(), reference.month());
                // days 1 and `last` exist in every month
                Window {
                    start: reference.replace_day(1).expect("first day of month"),
                    end: reference.replace_day(last).expect("last day of month"),
                }
            }
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Timestamp bounds for entries carrying a date-time rather than a date:
    /// start 00:00:00 through end 23:59:59, both UTC.
    pub fn datetime_bounds(&self) -> (OffsetDateTime, OffsetDateTime) {
        (
            self.start.midnight().assume_utc(),
            self.end.with_time(time!(23:59:59)).assume_utc(),
        )
    }
}

/// Parse a `YYYY-MM-DD` date, rejecting malformed input with a structured
/// `InvalidDate` error.
pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), &format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::InvalidDate(raw.to_string()))
}

/// Parse a `YYYY-MM-DD HH:MM` (seconds optional) date-time, assumed UTC.
pub fn parse_date_time(raw: &str) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    let mut candidate = trimmed.to_string();
    if trimmed.len() == 16 {
        candidate.push_str(":00");
    }
    PrimitiveDateTime::parse(
        &candidate,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .map(|dt| dt.assume_utc())
    .map_err(|_| AppError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::Weekday;

    #[test]
    fn day_window_is_the_reference_itself() {
        let w = Window::compute(date!(2024 - 05 - 17), Granularity::Day);
        assert_eq!(w.start, date!(2024 - 05 - 17));
        assert_eq!(w.end, date!(2024 - 05 - 17));
    }

    #[test]
    fn week_window_runs_monday_through_sunday() {
        // 2024-05-17 is a Friday
        let w = Window::compute(date!(2024 - 05 - 17), Granularity::Week);
        assert_eq!(w.start, date!(2024 - 05 - 13));
        assert_eq!(w.end, date!(2024 - 05 - 19));
        assert_eq!(w.start.weekday(), Weekday::Monday);
        assert_eq!(w.end.weekday(), Weekday::Sunday);
        assert!(w.contains(date!(2024 - 05 - 17)));
    }

    #[test]
    fn week_window_on_monday_and_sunday_edges() {
        let monday = Window::compute(date!(2024 - 05 - 13), Granularity::Week);
        assert_eq!(monday.start, date!(2024 - 05 - 13));
        let sunday = Window::compute(date!(2024 - 05 - 19), Granularity::Week);
        assert_eq!(sunday.start, date!(2024 - 05 - 13));
        assert_eq!(sunday.end, date!(2024 - 05 - 19));
    }

    #[test]
    fn week_window_spans_seven_days_and_contains_reference() {
        let mut d = date!(2024 - 01 - 01);
        for _ in 0..400 {
            let w = Window::compute(d, Granularity::Week);
            assert_eq!(w.start.weekday(), Weekday::Monday);
            assert_eq!(w.end.weekday(), Weekday::Sunday);
            assert_eq!(w.end - w.start, Duration::days(6));
            assert!(w.contains(d));
            d = d.next_day().unwrap();
        }
    }

    #[test]
    fn month_window_handles_variable_lengths() {
        let jan = Window::compute(date!(2023 - 01 - 15), Granularity::Month);
        assert_eq!(jan.start, date!(2023 - 01 - 01));
        assert_eq!(jan.end, date!(2023 - 01 - 31));

        let apr = Window::compute(date!(2023 - 04 - 30), Granularity::Month);
        assert_eq!(apr.end, date!(2023 - 04 - 30));

        let feb = Window::compute(date!(2023 - 02 - 10), Granularity::Month);
        assert_eq!(feb.end, date!(2023 - 02 - 28));
    }

    #[test]
    fn month_window_handles_leap_february() {
        let w = Window::compute(date!(2024 - 02 - 10), Granularity::Month);
        assert_eq!(w.start, date!(2024 - 02 - 01));
        assert_eq!(w.end, date!(2024 - 02 - 29));
    }

    #[test]
    fn datetime_bounds_cover_the_whole_days() {
        let w = Window::compute(date!(2024 - 05 - 17), Granularity::Day);
        let (start, end) = w.datetime_bounds();
        assert_eq!(start.date(), date!(2024 - 05 - 17));
        assert_eq!(start.time(), time!(00:00:00));
        assert_eq!(end.date(), date!(2024 - 05 - 17));
        assert_eq!(end.time(), time!(23:59:59));
    }

    #[test]
    fn parse_date_accepts_iso_and_rejects_garbage() {
        assert_eq!(parse_date("2024-02-29").unwrap(), date!(2024 - 02 - 29));
        assert!(matches!(
            parse_date("2023-02-29"),
            Err(AppError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_date("17/05/2024"),
            Err(AppError::InvalidDate(_))
        ));
        assert!(matches!(parse_date(""), Err(AppError::InvalidDate(_))));
    }

    #[test]
    fn parse_date_time_accepts_minutes_and_seconds() {
        let a = parse_date_time("2024-05-17 18:30").unwrap();
        let b = parse_date_time("2024-05-17 18:30:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.date(), date!(2024 - 05 - 17));
        assert!(matches!(
            parse_date_time("2024-05-17T18:30"),
            Err(AppError::InvalidDate(_))
        ));
    }
}
