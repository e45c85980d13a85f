use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat};
use tracing::debug;

pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Render a client timestamp for display.
///
/// Offset-carrying values keep their own offset, naive values are shown
/// as written, and anything unparseable is passed through untouched.
pub fn display(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(aware) = parse_aware(trimmed) {
        return aware.format(DISPLAY_FORMAT).to_string();
    }
    if let Some(naive) = parse_naive(trimmed) {
        return naive.format(DISPLAY_FORMAT).to_string();
    }
    debug!(timestamp = raw, "timestamp is not ISO-8601, passing it through");
    raw.to_string()
}

pub fn display_now(now: DateTime<Local>) -> String {
    now.format(DISPLAY_FORMAT).to_string()
}

pub fn iso(now: DateTime<Local>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn parse_aware(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
