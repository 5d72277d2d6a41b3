use chrono::{Datelike, NaiveDate};
use tracing::warn;

/// Parse an appointment date as delivered by the remote service. Three
/// encodings are accepted:
///
/// 1. `"DD-MM-YYYY"`
/// 2. `"<DayName>, DD <MonthName> YYYY"` (e.g. `"Monday, 10 June 2024"`)
/// 3. `"<DayName> DD"`: month and year are assumed to be the current ones
///    at parse time. Near month boundaries this yields the wrong date; the
///    heuristic matches the upstream data producer and is kept as-is.
///
/// Malformed input is logged and yields `None`; callers classify such
/// records by status alone instead of dropping them.
pub fn parse_appointment_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d-%m-%Y") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%A, %d %B %Y") {
        return Some(date);
    }

    if let Some(date) = parse_partial_date(trimmed, today) {
        return Some(date);
    }

    warn!("Unparseable appointment date: {:?}", text);
    None
}

/// `"<DayName> DD"` with the current month/year assumed.
fn parse_partial_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let mut parts = text.split_whitespace();
    let _day_name = parts.next()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(today.year(), today.month(), day)
}

/// Reformat a task date from the wire `"DD-MM-YYYY"` into `"YYYY-MM-DD"`.
/// Unparseable input is logged and passed through unchanged so a single
/// malformed record does not break the list.
pub fn normalize_task_date(text: &str) -> String {
    match NaiveDate::parse_from_str(text.trim(), "%d-%m-%Y") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => {
            warn!("Unparseable task date: {:?}", text);
            text.to_string()
        }
    }
}

/// Parse an already-normalized `"YYYY-MM-DD"` date.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}
