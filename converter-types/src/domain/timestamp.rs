//! ISO-8601 timestamp parsing for historical lookups.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::error::DomainError;

/// Parses an ISO-8601 timestamp, keeping its UTC offset.
///
/// Accepts `YYYY-MM-DD`, optionally followed by `T` or a space and
/// `HH:MM[:SS[.fraction]]`, optionally followed by `Z`, `±HH:MM`, `±HHMM` or
/// `±HH`. Every field has a fixed width. Values without an offset are UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, DomainError> {
    let raw = raw.trim();
    parse_iso(raw).ok_or_else(|| DomainError::InvalidTimestamp(raw.to_string()))
}

fn parse_iso(raw: &str) -> Option<DateTime<FixedOffset>> {
    let (year, rest) = digits(raw, 4)?;
    let (month, rest) = digits(rest.strip_prefix('-')?, 2)?;
    let (day, rest) = digits(rest.strip_prefix('-')?, 2)?;
    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;

    if rest.is_empty() {
        return Some(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }

    let rest = rest.strip_prefix(['T', ' '])?;
    let (hour, rest) = digits(rest, 2)?;
    let (minute, mut rest) = digits(rest.strip_prefix(':')?, 2)?;

    let (mut second, mut nanos) = (0, 0);
    if let Some(tail) = rest.strip_prefix(':') {
        (second, rest) = digits(tail, 2)?;
        if let Some(tail) = rest.strip_prefix(['.', ',']) {
            let len = tail.bytes().take_while(u8::is_ascii_digit).count();
            if !(1..=9).contains(&len) {
                return None;
            }
            let (fraction, tail) = tail.split_at(len);
            nanos = fraction.parse::<u32>().ok()? * 10u32.pow(9 - len as u32);
            rest = tail;
        }
    }

    // Rejects hour 24, minute 60 and leap second 60.
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    let naive = date.and_time(time);

    match parse_offset(rest)? {
        Some(offset) => naive.and_local_timezone(offset).single(),
        None => Some(naive.and_utc().fixed_offset()),
    }
}

/// `Some(None)` means no offset was given.
fn parse_offset(raw: &str) -> Option<Option<FixedOffset>> {
    let sign = match raw.bytes().next() {
        None => return Some(None),
        Some(b'Z' | b'z') if raw.len() == 1 => return FixedOffset::east_opt(0).map(Some),
        Some(b'+') => 1,
        Some(b'-') => -1,
        Some(_) => return None,
    };

    let (hours, rest) = digits(&raw[1..], 2)?;
    let minutes = if rest.is_empty() {
        0
    } else {
        let (minutes, tail) = digits(rest.strip_prefix(':').unwrap_or(rest), 2)?;
        if !tail.is_empty() {
            return None;
        }
        minutes
    };
    if hours > 23 || minutes > 59 {
        return None;
    }

    let seconds = i32::try_from(hours * 3600 + minutes * 60).ok()?;
    FixedOffset::east_opt(sign * seconds).map(Some)
}

/// Splits off exactly `width` ASCII digits.
fn digits(raw: &str, width: usize) -> Option<(u32, &str)> {
    let (head, tail) = raw.split_at_checked(width)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((head.parse().ok()?, tail))
}
