// Date and time string formats shared by body validation, coercion and query validation

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

const DATE_TIME_OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Strict `yyyy-MM-dd`
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Any accepted date or date-time; only the calendar date is kept
pub fn parse_lenient_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    parse_iso_date(value)
        .or_else(|| NaiveDate::parse_from_str(value, "%m/%d/%Y").ok())
        .or_else(|| parse_date_time(value).map(|dt| dt.date()))
}

/// Permissive date-time: RFC 3339, `T` or space separated, optional fractional
/// seconds and offset, or a bare date
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATE_TIME_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    parse_iso_date(value).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `HH:mm:ss`, 24 hour clock
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    if value.len() != 8 {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M:%S").ok()
}
