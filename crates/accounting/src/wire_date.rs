//! Dates as the accounting API exchanges them.
//!
//! Responses carry `/Date(1518685950940+0000)/` (epoch milliseconds plus an
//! informational offset); some endpoints echo ISO timestamps with or without
//! a zone. Requests are sent as RFC 3339.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised date `{raw}`")))
}

/// Parse any of the date forms the API returns.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix("/Date(").and_then(|s| s.strip_suffix(")/")) {
        return parse_epoch_millis(inner);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// `1518685950940+0000`: the millisecond count is already UTC.
fn parse_epoch_millis(inner: &str) -> Option<DateTime<Utc>> {
    let digits_end = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map_or(inner.len(), |(idx, _)| idx);
    let (millis, offset) = inner.split_at(digits_end);
    if !offset.is_empty() && !(offset.len() == 5 && offset[1..].bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    DateTime::from_timestamp_millis(millis.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_ms_json_dates() {
        let expected = Utc.timestamp_millis_opt(1_518_685_950_940).unwrap();
        assert_eq!(parse("/Date(1518685950940+0000)/"), Some(expected));
        assert_eq!(parse("/Date(1518685950940+1300)/"), Some(expected));
        assert_eq!(parse("/Date(1518685950940)/"), Some(expected));
    }

    #[test]
    fn parses_iso_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(parse("2024-05-01T12:00:00Z"), Some(expected));
        assert_eq!(parse("2024-05-01T12:00:00"), Some(expected));
        assert_eq!(
            parse("2024-05-01"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("/Date(abc)/"), None);
        assert_eq!(parse("/Date(1518685950940+00)/"), None);
        assert_eq!(parse("yesterday"), None);
    }
}
