//! Time utilities: firm-local calendar dates and due-date reconciliation.
//!
//! The spreadsheet script serializes a midnight-local date as a UTC instant
//! (2023-11-20 00:00 Asia/Taipei arrives as "2023-11-19T16:00:00.000Z").
//! Every instant is therefore converted into the firm's timezone before the
//! calendar date is taken; slicing the raw string would land a day early.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::node::DueDate;

/// The firm operates on Taiwan time (UTC+8, no DST).
pub const FIRM_TIMEZONE: Tz = chrono_tz::Asia::Taipei;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Today's date as experienced in the office.
pub fn today_in_firm_tz() -> NaiveDate {
    firm_date(Utc::now())
}

/// Calendar date of an instant in the firm's timezone.
pub fn firm_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&FIRM_TIMEZONE).date_naive()
}

/// A due-date value as it arrives from the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDate<'a> {
    Absent,
    Text(&'a str),
    /// Unix epoch milliseconds
    EpochMillis(i64),
}

/// How a due date was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// No value; defaulted to today
    Missing,
    /// Plain calendar date, taken as-is
    DateOnly,
    /// Instant whose local date matches its serialized date
    Timestamp,
    /// Instant whose serialized date differs from the firm-local date
    Shifted,
    /// Epoch milliseconds
    Epoch,
    /// Not a recognizable date; prefix kept verbatim
    Unparsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub due_date: DueDate,
    pub source: DateSource,
}

impl Reconciled {
    fn new(due_date: impl Into<DueDate>, source: DateSource) -> Self {
        Self {
            due_date: due_date.into(),
            source,
        }
    }
}

/// Render a raw due date as the firm-local calendar date.
///
/// Never fails: unknown text degrades to its date-only prefix, absence to
/// `today`. Reconciling an already reconciled `YYYY-MM-DD` returns the same
/// date.
pub fn reconcile_due_date(raw: RawDate<'_>, today: NaiveDate) -> Reconciled {
    match raw {
        RawDate::Absent => Reconciled::new(today, DateSource::Missing),
        RawDate::EpochMillis(ms) => match Utc.timestamp_millis_opt(ms).single() {
            Some(instant) => Reconciled::new(firm_date(instant), DateSource::Epoch),
            None => Reconciled::new(DueDate::Unparsed(ms.to_string()), DateSource::Unparsed),
        },
        RawDate::Text(s) => reconcile_text(s.trim(), today),
    }
}

fn reconcile_text(s: &str, today: NaiveDate) -> Reconciled {
    if s.is_empty() {
        return Reconciled::new(today, DateSource::Missing);
    }

    if let Some(d) = parse_date_only(s) {
        return Reconciled::new(d, DateSource::DateOnly);
    }

    if let Some(instant) = parse_instant(s) {
        let local = firm_date(instant.with_timezone(&Utc));
        let source = if local == instant.date_naive() {
            DateSource::Timestamp
        } else {
            DateSource::Shifted
        };
        return Reconciled::new(local, source);
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            // No offset given: the sheet meant office time.
            return Reconciled::new(ndt.date(), DateSource::Timestamp);
        }
    }

    let prefix = s.split('T').next().unwrap_or(s);
    match parse_date_only(prefix) {
        Some(d) => Reconciled::new(d, DateSource::Unparsed),
        None => Reconciled::new(DueDate::Unparsed(prefix.to_string()), DateSource::Unparsed),
    }
}

fn parse_date_only(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// RFC 3339 ("2023-11-19T16:00:00.000Z") or the JavaScript `Date.toString`
/// form ("Mon Nov 20 2023 00:00:00 GMT+0800 (台北標準時間)").
fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let head = s.split(" (").next().unwrap_or(s);
    DateTime::parse_from_str(head, "%a %b %d %Y %H:%M:%S GMT%z").ok()
}
