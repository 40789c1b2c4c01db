//! PDF date strings
//!
//! Dates in the document information dictionary use the form
//! `D:YYYYMMDDHHmmSSOHH'mm'`, where `O` is `+`, `-` or `Z`.
//! Every field after the year is optional when reading.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use crate::error::{Error, Result};

/// Current local time with its UTC offset
pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Format a timestamp as a PDF date string
pub fn format_pdf_date(date: &DateTime<FixedOffset>) -> String {
    let offset = date.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let minutes = offset.abs() / 60;

    format!(
        "{}{}{:02}'{:02}'",
        date.format("D:%Y%m%d%H%M%S"),
        sign,
        minutes / 60,
        minutes % 60
    )
}

/// Parse a PDF date string
pub fn parse_pdf_date(input: &str) -> Result<DateTime<FixedOffset>> {
    let invalid = || Error::InvalidDate(input.to_string());

    let s = input.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, zone) = s.split_at(digits_end);
    if digits.len() < 4 || digits.len() > 14 || digits.len() % 2 != 0 {
        return Err(invalid());
    }

    // Two-digit fields after the year, defaulting to the start of the period
    let field = |start: usize, default: u32| -> Result<u32> {
        match digits.get(start..start + 2) {
            Some(part) => part.parse().map_err(|_| invalid()),
            None => Ok(default),
        }
    };

    let year: i32 = digits[..4].parse().map_err(|_| invalid())?;
    let month = field(4, 1)?;
    let day = field(6, 1)?;
    let hour = field(8, 0)?;
    let minute = field(10, 0)?;
    let second = field(12, 0)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)?;

    let offset = parse_offset(zone).ok_or_else(invalid)?;
    offset.from_local_datetime(&naive).single().ok_or_else(invalid)
}

/// `Z`, empty, or `+HH'mm'` / `-HH'mm` / `+HH`
fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    if zone.is_empty() || zone.starts_with('Z') {
        return FixedOffset::east_opt(0);
    }

    let sign = match zone.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };

    let rest: Vec<&str> = zone[1..].split('\'').filter(|p| !p.is_empty()).collect();
    let hours: i32 = rest.first()?.parse().ok()?;
    let minutes: i32 = match rest.get(1) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn at(offset_secs: i32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_secs)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 7, 9, 5, 1)
            .unwrap()
    }

    #[test]
    fn test_format_positive_offset() {
        assert_eq!(format_pdf_date(&at(8 * 3600)), "D:20260307090501+08'00'");
    }

    #[test]
    fn test_format_negative_offset() {
        assert_eq!(format_pdf_date(&at(-(5 * 3600 + 30 * 60))), "D:20260307090501-05'30'");
    }

    #[test]
    fn test_parse_full() {
        let date = parse_pdf_date("D:20260307090501+08'00'").unwrap();
        assert_eq!(date, at(8 * 3600));
    }

    #[test]
    fn test_parse_utc_and_partial() {
        let date = parse_pdf_date("D:20240102Z").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 2);
        assert_eq!(date.hour(), 0);
        assert_eq!(date.offset().local_minus_utc(), 0);

        let date = parse_pdf_date("2024").unwrap();
        assert_eq!((date.month(), date.day()), (1, 1));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_pdf_date("").is_err());
        assert!(parse_pdf_date("D:20241301").is_err()); // Invalid month
        assert!(parse_pdf_date("D:2024011").is_err()); // Odd digit count
        assert!(parse_pdf_date("D:20240101?").is_err());
    }

    #[test]
    fn test_now_round_trips_to_the_second() {
        let current = now().with_nanosecond(0).unwrap();
        assert_eq!(parse_pdf_date(&format_pdf_date(&current)).unwrap(), current);
    }
}
