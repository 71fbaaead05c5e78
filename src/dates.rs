//! Date-only strings anchored to the site's civil timezone.
//!
//! Every viewer sees the same day boundaries no matter where the server or
//! the browser runs, so all comparisons go through civil year/month/day
//! re-derived in [`SITE_TIMEZONE`] instead of raw instant arithmetic.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

pub const SITE_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

/// Calendar day with no time of day or offset attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CivilDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

/// Midnight of a `YYYY-MM-DD` day in [`SITE_TIMEZONE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDate(DateTime<Tz>);

impl EventDate {
    /// Returns `None` for anything that is not a real calendar day written
    /// exactly as `YYYY-MM-DD`.
    pub fn parse(value: &str) -> Option<Self> {
        if !DATE_RE.is_match(value) {
            return None;
        }
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        SITE_TIMEZONE
            .from_local_datetime(&midnight)
            .earliest()
            .map(EventDate)
    }

    pub fn civil(&self) -> CivilDate {
        let local = self.0.with_timezone(&SITE_TIMEZONE);
        CivilDate::new(local.year(), local.month(), local.day())
    }

    /// Seconds since the epoch; only used for ordering.
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn same_day(&self, other: &EventDate) -> bool {
        self.civil() == other.civil()
    }

    pub fn same_month(&self, other: &EventDate) -> bool {
        let (a, b) = (self.civil(), other.civil());
        a.year == b.year && a.month == b.month
    }

    /// `March 1, 2025`
    pub fn format_long(&self) -> String {
        self.0.format("%B %-d, %Y").to_string()
    }

    /// `Mar 1`
    pub fn format_short(&self) -> String {
        self.0.format("%b %-d").to_string()
    }
}

/// Today's civil date in [`SITE_TIMEZONE`].
pub fn today(now: DateTime<Utc>) -> CivilDate {
    let local = now.with_timezone(&SITE_TIMEZONE);
    CivilDate::new(local.year(), local.month(), local.day())
}

/// Human label for a start/end pair. `None` when there is no start.
pub fn format_range(start: Option<&EventDate>, end: Option<&EventDate>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => {
            if start.same_day(end) {
                return Some(start.format_long());
            }
            let year = if start.same_month(end) {
                start.civil().year
            } else {
                end.civil().year
            };
            Some(format!(
                "{} – {}, {}",
                start.format_short(),
                end.format_short(),
                year
            ))
        }
        (Some(start), None) => Some(start.format_long()),
        (None, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> EventDate {
        EventDate::parse(value).unwrap()
    }

    #[test]
    fn civil_components_match_input() {
        for value in ["2025-01-01", "2024-02-29", "2025-03-09", "2025-11-02", "1999-12-31"] {
            let civil = date(value).civil();
            let expected = format!("{:04}-{:02}-{:02}", civil.year, civil.month, civil.day);
            assert_eq!(expected, value);
        }
    }

    #[test]
    fn anchored_to_pacific_midnight() {
        // 2025-07-04 00:00 PDT is 07:00 UTC.
        assert_eq!(date("2025-07-04").timestamp(), 1_751_612_400);
    }

    #[test]
    fn malformed_input_is_no_date() {
        for value in [
            "",
            "2025-1-01",
            "2025/01/01",
            "01-02-2025",
            "2025-01-01T00:00:00",
            " 2025-01-01",
            "2025-02-30",
            "2025-13-01",
            "２０２５-01-01",
        ] {
            assert!(EventDate::parse(value).is_none(), "{value:?} should not parse");
        }
    }

    #[test]
    fn same_day_and_month_use_civil_components() {
        assert!(date("2025-03-09").same_day(&date("2025-03-09")));
        assert!(!date("2025-03-09").same_day(&date("2025-03-10")));
        // Spans the spring-forward transition.
        assert!(date("2025-03-01").same_month(&date("2025-03-31")));
        assert!(!date("2025-03-31").same_month(&date("2025-04-01")));
        assert!(!date("2024-03-01").same_month(&date("2025-03-01")));
    }

    #[test]
    fn today_uses_site_timezone() {
        // 03:00 UTC on Jan 2 is still Jan 1 in Los Angeles.
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 0, 0).unwrap();
        assert_eq!(today(now), CivilDate::new(2025, 1, 1));
    }

    #[test]
    fn range_labels() {
        let label = |s: Option<&str>, e: Option<&str>| {
            format_range(s.map(date).as_ref(), e.map(date).as_ref())
        };
        assert_eq!(label(Some("2025-03-01"), None).as_deref(), Some("March 1, 2025"));
        assert_eq!(
            label(Some("2025-03-01"), Some("2025-03-01")).as_deref(),
            Some("March 1, 2025")
        );
        assert_eq!(
            label(Some("2025-03-01"), Some("2025-03-03")).as_deref(),
            Some("Mar 1 – Mar 3, 2025")
        );
        assert_eq!(
            label(Some("2024-12-30"), Some("2025-01-02")).as_deref(),
            Some("Dec 30 – Jan 2, 2025")
        );
        assert_eq!(label(None, Some("2025-03-03")), None);
        assert_eq!(label(None, None), None);
    }
}
