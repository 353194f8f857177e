use lazy_static::lazy_static;
use regex::Regex;
use storage::models::SwimTime;

lazy_static! {
    static ref TIME_RE: Regex = Regex::new(r"^(?:(\d{1,2}):)?(\d{1,2})[.,](\d{1,2})$").unwrap();
    static ref DISTANCE_RE: Regex = Regex::new(r"(?i)(\d+)\s*m(?:eter)?").unwrap();
}

/// Parses `SS.cc`, `M:SS.cc` or `MM:SS.cc`, with `.` or `,` before the
/// hundredths. A single fractional digit is tenths ("54.8" is 54.80).
///
/// Returns `None` for anything else, including empty text and zero times.
pub fn parse_time(text: &str) -> Option<SwimTime> {
    let text = text.trim();
    let caps = TIME_RE.captures(text)?;

    let minutes: i64 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let seconds_text = caps.get(2)?.as_str();
    let seconds: i64 = seconds_text.parse().ok()?;
    if caps.get(1).is_some() && (seconds_text.len() != 2 || seconds >= 60) {
        return None;
    }

    let fraction_text = caps.get(3)?.as_str();
    let mut fraction: i64 = fraction_text.parse().ok()?;
    if fraction_text.len() == 1 {
        fraction *= 10;
    }

    SwimTime::from_centiseconds((minutes * 60 + seconds) * 100 + fraction)
}

/// First `<n>m` / `<n> meter` distance in an event label.
pub fn parse_distance(text: &str) -> Option<i32> {
    let caps = DISTANCE_RE.captures(text)?;
    caps.get(1)?
        .as_str()
        .parse::<i32>()
        .ok()
        .filter(|distance| *distance > 0)
}
