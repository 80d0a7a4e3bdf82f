//! Date Coercion Helpers
//! Lenient conversion of spreadsheet cells into calendar dates.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Layouts tried for text values that carry a time component.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Layouts tried for date-only text values (month-first before day-first).
const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

/// Parse a free-text date. Returns `None` for anything unrecognised.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

/// Convert a spreadsheet serial date (1900 date system) to a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    // Serial 0 maps to 1899-12-30 so that the phantom 1900-02-29 lines up.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn days_since_unix_epoch(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

/// Inverse of [`days_since_unix_epoch`].
pub fn date_from_unix_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(Duration::days(days as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_layouts() {
        assert_eq!(parse_date_text("2024-01-05"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05 13:45:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05T13:45:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("2024/03/09"), Some(ymd(2024, 3, 9)));
        assert_eq!(parse_date_text("03/09/2024"), Some(ymd(2024, 3, 9)));
        assert_eq!(parse_date_text("25-12-2023"), Some(ymd(2023, 12, 25)));
        assert_eq!(parse_date_text("March 9, 2024"), Some(ymd(2024, 3, 9)));
        assert_eq!(parse_date_text(" 2024-01-05 "), Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date_text("N/A"), None);
        assert_eq!(parse_date_text(""), None);
        assert_eq!(parse_date_text("2024-13-40"), None);
    }

    #[test]
    fn converts_excel_serials() {
        let dt = excel_serial_to_datetime(45296.5).unwrap();
        assert_eq!(dt.date(), ymd(2024, 1, 5));
        assert_eq!(dt.format("%H:%M").to_string(), "12:00");
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
        assert!(excel_serial_to_datetime(-1.0).is_none());
    }

    #[test]
    fn unix_days_are_reversible() {
        let date = ymd(2024, 1, 20);
        assert_eq!(days_since_unix_epoch(ymd(1970, 1, 1)), 0);
        assert_eq!(date_from_unix_days(days_since_unix_epoch(date)), Some(date));
    }
}
