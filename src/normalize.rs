use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::models::{DateField, DurationField, RemoteTimestamp};

/// Placeholder the backend writes when a field has no real value.
pub const NOT_PROVIDED: &str = "not provided";

/// Strings that full-match this (after trimming) are treated as a numeric
/// week count. Partial matches like "12abc" are not.
static WEEKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+)?$").unwrap()
});

impl RemoteTimestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanoseconds).single()
    }
}

/// Normalize a date field to a concrete instant. Timestamp objects convert
/// via their epoch fields; strings go through `parse_date`. Anything else
/// (absent, placeholder, garbage) is None - bad dates degrade the display,
/// they never abort it.
pub fn normalize_date(value: Option<&DateField>) -> Option<DateTime<Utc>> {
    match value {
        Some(DateField::Timestamp(ts)) => ts.to_datetime(),
        Some(DateField::Text(s)) => parse_date(s),
        None => None,
    }
}

/// Parse a date string in any of the formats seen in real documents.
/// Date-only formats resolve to midnight UTC.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(NOT_PROVIDED) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
        }
    }

    None
}

/// Render a duration field as a display label.
///
/// Absent values, blank strings, and the "not provided" placeholder become
/// "Not provided". Numeric values (and strings that are entirely numeric
/// after trimming) render as "<N> weeks". Everything else is assumed to be
/// already human-readable and passes through unchanged.
pub fn format_duration(duration: Option<&DurationField>) -> String {
    match duration {
        None => "Not provided".to_string(),
        Some(DurationField::Weeks(n)) => format_weeks(*n),
        Some(DurationField::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_PROVIDED) {
                "Not provided".to_string()
            } else if WEEKS_RE.is_match(trimmed) {
                match trimmed.parse::<f64>() {
                    Ok(n) => format_weeks(n),
                    Err(_) => s.clone(),
                }
            } else {
                s.clone()
            }
        }
    }
}

fn format_weeks(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{} weeks", n as i64)
    } else {
        format!("{} weeks", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_date_absent_is_none() {
        assert_eq!(normalize_date(None), None);
    }

    #[test]
    fn test_normalize_date_timestamp_object() {
        let ts = DateField::Timestamp(RemoteTimestamp {
            seconds: 1700000000,
            nanoseconds: 0,
        });
        let dt = normalize_date(Some(&ts)).unwrap();
        assert_eq!(dt.timestamp(), 1700000000);
    }

    #[test]
    fn test_normalize_date_string() {
        let field = DateField::Text("2029-06-01".to_string());
        let dt = normalize_date(Some(&field)).unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2029, 6, 1).unwrap());
    }

    #[test]
    fn test_normalize_date_garbage_is_none() {
        let field = DateField::Text("soonish".to_string());
        assert_eq!(normalize_date(Some(&field)), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2029, 6, 1).unwrap();
        assert_eq!(parse_date("2029-06-01").unwrap().date_naive(), expected);
        assert_eq!(parse_date("06/01/2029").unwrap().date_naive(), expected);
        assert_eq!(parse_date("June 01, 2029").unwrap().date_naive(), expected);
        assert_eq!(
            parse_date("2029-06-01T12:30:00Z").unwrap().date_naive(),
            expected
        );
    }

    #[test]
    fn test_parse_date_placeholder_and_blank() {
        assert_eq!(parse_date("not provided"), None);
        assert_eq!(parse_date("Not Provided"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
    }

    #[test]
    fn test_format_duration_missing_inputs() {
        assert_eq!(format_duration(None), "Not provided");
        let blank = DurationField::Text(String::new());
        assert_eq!(format_duration(Some(&blank)), "Not provided");
        let spaces = DurationField::Text("   ".to_string());
        assert_eq!(format_duration(Some(&spaces)), "Not provided");
        let placeholder = DurationField::Text("not provided".to_string());
        assert_eq!(format_duration(Some(&placeholder)), "Not provided");
    }

    #[test]
    fn test_format_duration_number_and_numeric_string_agree() {
        for n in [0.0, 1.0, 8.0, 12.0, 52.0] {
            let as_number = DurationField::Weeks(n);
            let as_string = DurationField::Text(format!("{}", n as i64));
            assert_eq!(format_duration(Some(&as_number)), format_duration(Some(&as_string)));
        }
        let eight = DurationField::Weeks(8.0);
        assert_eq!(format_duration(Some(&eight)), "8 weeks");
    }

    #[test]
    fn test_format_duration_trims_numeric_strings() {
        let padded = DurationField::Text(" 12 ".to_string());
        assert_eq!(format_duration(Some(&padded)), "12 weeks");
    }

    #[test]
    fn test_format_duration_fractional_weeks() {
        let half = DurationField::Text("6.5".to_string());
        assert_eq!(format_duration(Some(&half)), "6.5 weeks");
    }

    #[test]
    fn test_format_duration_passthrough_text() {
        // Partial numeric prefixes are not coerced; the string is kept as-is.
        for text in ["Rolling basis", "12abc", "6-8 weeks"] {
            let field = DurationField::Text(text.to_string());
            assert_eq!(format_duration(Some(&field)), text);
        }
    }
}
