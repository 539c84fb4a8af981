//! Lenient (de)serializers for the date shapes the transactions API emits.
//!
//! Dates arrive either as `YYYY-MM-DD` or as a full timestamp; timestamps arrive
//! with or without an offset. Everything is written back in the strict form.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(trimmed)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub mod date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date `{raw}`")))
    }
}

pub mod date_opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{raw}`"))),
        }
    }
}

pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`")))
    }
}

pub mod timestamp_opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn dates_accept_timestamp_prefix() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert_eq!(parse_date("2025-05-01"), Some(expected));
        assert_eq!(parse_date("2025-05-01T13:45:00"), Some(expected));
        assert_eq!(parse_date("01/05/2025"), None);
    }

    #[test]
    fn timestamps_accept_naive_and_offset_forms() {
        let naive = parse_timestamp("2025-05-01T13:45:10.123").unwrap();
        assert_eq!(naive.hour(), 13);
        let offset = parse_timestamp("2025-05-01T13:45:10-03:00").unwrap();
        assert_eq!(offset.hour(), 16);
        let date_only = parse_timestamp("2025-05-01").unwrap();
        assert_eq!(date_only.day(), 1);
        assert!(parse_timestamp("yesterday").is_none());
    }
}
