use chrono::NaiveTime;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

fn time_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})\s*([AaPp][Mm])?$").unwrap())
}

/// Parse one `"HH:MM"` / `"H:MMAM"` / `"H:MM pm"` token into a `NaiveTime`.
/// 12-hour tokens convert as 12 PM -> 12, 12 AM -> 0, otherwise +12 for PM.
pub fn parse_time_token(token: &str) -> Option<NaiveTime> {
    let caps = time_token_re().captures(token.trim())?;

    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;

    let hour = match caps.get(3).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(ref meridiem) if meridiem == "PM" => {
            if hour == 12 {
                12
            } else {
                hour + 12
            }
        }
        Some(ref meridiem) if meridiem == "AM" => {
            if hour == 12 {
                0
            } else {
                hour
            }
        }
        _ => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Split an appointment time range `"<start>-<end>"` and parse both halves.
/// The end half is optional; only the start drives calendar date math.
pub fn parse_time_range(range: &str) -> Option<(NaiveTime, Option<NaiveTime>)> {
    let mut parts = range.splitn(2, '-');
    let start_text = parts.next()?.trim();
    let end_text = parts.next().map(str::trim);

    let start = match parse_time_token(start_text) {
        Some(start) => start,
        None => {
            warn!("Unparseable time range: {:?}", range);
            return None;
        }
    };
    let end = end_text.and_then(parse_time_token);

    Some((start, end))
}
