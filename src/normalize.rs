//! Pure normalization helpers: feed-title language detection and
//! published-at resolution. Kept dependency-free of any feed-parsing or
//! database type so they can be tested in isolation (spec §8's round-trip
//! laws exercise exactly these functions).

use chrono::{DateTime, Datelike, Utc};

const YEAR_MIN: i32 = 1990;
const YEAR_MAX: i32 = 2100;

/// Detects the feed's language from its title, per spec §4.2. Scans the
/// whole title for a Cyrillic/German/Spanish marker character first — a
/// leading plain ASCII letter (as in `"Häuser"` or `"Straße"`) must not
/// short-circuit the scan before a later, higher-priority marker is seen,
/// matching `original_source`'s `languageCheck`, which only matches
/// lowercase marker characters and keeps scanning past any character that
/// isn't one. Only once no such marker is found anywhere does the first
/// plain ASCII letter decide `"english"`. Falls back to `"russian"` when
/// no alphabetic character is found at all.
pub fn detect_language(feed_title: &str) -> &'static str {
    for ch in feed_title.chars() {
        let cp = ch as u32;
        if (0x0430..=0x044F).contains(&cp) || cp == 0x0451 {
            return "russian";
        }
        if matches!(ch, 'ä' | 'ö' | 'ü' | 'ß') {
            return "german";
        }
        if matches!(ch, 'ñ' | 'á' | 'é' | 'í' | 'ó' | 'ú') {
            return "spanish";
        }
    }
    if feed_title.chars().any(|ch| ch.is_ascii_alphabetic()) {
        return "english";
    }
    "russian"
}

fn year_in_range(dt: &DateTime<Utc>) -> bool {
    (YEAR_MIN..=YEAR_MAX).contains(&dt.year())
}

/// Attempts to parse a textual `pubDate` per the priority order in spec
/// §4.2: RFC-2822, then ISO-8601, then ISO-8601-with-milliseconds (this
/// last one is handled by the same RFC-3339 parser, which accepts
/// fractional seconds). Returns `None` if nothing parses or the parsed
/// year falls outside `[1990, 2100]`.
pub fn parse_textual_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc2822(trimmed)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .ok()?;
    let utc = parsed.with_timezone(&Utc);
    if year_in_range(&utc) {
        Some(utc)
    } else {
        None
    }
}

/// Interprets a numeric `pubDate_ts` by magnitude, per spec §4.2:
/// `>= 1e18` nanoseconds, `>= 1e14` microseconds, `>= 1e12` milliseconds,
/// else seconds. Returns `None` if the value is non-positive or the
/// resulting year falls outside `[1990, 2100]`.
pub fn parse_numeric_pub_date(ts: i64) -> Option<DateTime<Utc>> {
    if ts <= 0 {
        return None;
    }

    let dt = if ts >= 1_000_000_000_000_000_000 {
        let secs = ts.div_euclid(1_000_000_000);
        let nsecs = ts.rem_euclid(1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs)?
    } else if ts >= 100_000_000_000_000 {
        DateTime::from_timestamp_micros(ts)?
    } else if ts >= 1_000_000_000_000 {
        DateTime::from_timestamp_millis(ts)?
    } else {
        DateTime::from_timestamp(ts, 0)?
    };

    if year_in_range(&dt) {
        Some(dt)
    } else {
        None
    }
}

/// Resolves an item's `published_at`, per the full priority cascade in
/// spec §4.2: textual `pubDate`, then numeric `pubDate_ts`, then "now".
pub fn resolve_published_at(raw_pub_date: Option<&str>, raw_pub_date_ts: Option<i64>) -> DateTime<Utc> {
    if let Some(text) = raw_pub_date {
        if let Some(dt) = parse_textual_pub_date(text) {
            return dt;
        }
    }
    if let Some(ts) = raw_pub_date_ts {
        if let Some(dt) = parse_numeric_pub_date(ts) {
            return dt;
        }
    }
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_language_marker() {
        assert_eq!(detect_language("Привет мир"), "russian");
        assert_eq!(detect_language("Ёлка в лесу"), "russian");
        assert_eq!(detect_language("Häuser in Köln"), "german");
        assert_eq!(detect_language("Straße"), "german");
        assert_eq!(detect_language("Niño feliz"), "spanish");
        assert_eq!(detect_language("English headline"), "english");
        assert_eq!(detect_language("123 !!!"), "russian");
    }

    #[test]
    fn parses_rfc2822_pub_date() {
        let dt = parse_textual_pub_date("Mon, 01 Jan 2024 12:34:56 +0000").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T12:34:56+00:00");
    }

    #[test]
    fn parses_iso8601_pub_date() {
        let dt = parse_textual_pub_date("2024-01-01T12:34:56Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T12:34:56+00:00");
    }

    #[test]
    fn parses_iso8601_millis_pub_date() {
        let dt = parse_textual_pub_date("2024-01-01T12:34:56.789Z").unwrap();
        assert_eq!(dt.timestamp(), 1_704_112_496);
    }

    #[test]
    fn numeric_seconds_resolves() {
        let dt = parse_numeric_pub_date(1_700_000_000).unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn numeric_millis_resolves_to_same_instant() {
        let dt = parse_numeric_pub_date(1_700_000_000_000).unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn numeric_micros_resolves_to_same_instant() {
        let dt = parse_numeric_pub_date(1_700_000_000_000_000).unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn out_of_range_year_is_rejected() {
        assert!(parse_textual_pub_date("Mon, 01 Jan 1899 00:00:00 +0000").is_none());
    }

    #[test]
    fn malformed_and_zero_fall_back_to_now() {
        let before = Utc::now();
        let resolved = resolve_published_at(Some(""), Some(0));
        let after = Utc::now();
        assert!(resolved >= before && resolved <= after);
    }
}
