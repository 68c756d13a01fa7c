//! Build-date normalization.
//!
//! The personal collection writes dates as `MM/DD/YYYY` (or `MM/DD/YY`); the
//! organization dump carries date-times like `2024-03-19 00:00:00`. Both map
//! onto a plain [`NaiveDate`]. Any other shape is rejected.

use chrono::NaiveDate;

/// Normalize a raw build-date cell. `None` means the value is not admissible.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_slash(raw).or_else(|| parse_datetime_prefix(raw))
}

/// Render as zero-padded `MM/DD/YYYY`.
pub fn render_slash(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// `M/D/YYYY` or `M/D/YY`, month and day one or two digits.
fn parse_slash(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('/');
    let (month, day, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let month = small_number(month)?;
    let day = small_number(day)?;

    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = match year.len() {
        4 => year.parse().ok()?,
        2 => {
            // POSIX %y pivot
            let yy: i32 = year.parse().ok()?;
            if yy < 69 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYY-MM-DD` optionally followed by whitespace and a time component.
/// Only the first whitespace-delimited token is used; with the separators
/// removed it must be exactly eight digits.
fn parse_datetime_prefix(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    if bytes.len() < 5 || !bytes[..4].iter().all(u8::is_ascii_digit) || bytes[4] != b'-' {
        return None;
    }

    let date_part = raw.split_whitespace().next()?;
    let digits: String = date_part.chars().filter(|c| *c != '-').collect();
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn small_number(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
