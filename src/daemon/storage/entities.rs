use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// A closed range of time attributed to one application. Intervals produced by one tracking
/// session are contiguous: the end of one is the start of the next.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone)]
pub struct UsageIntervalEntity {
    pub app_name: Arc<str>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl UsageIntervalEntity {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Total time spent in one application over all stored intervals.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct UsageTotalEntity {
    pub app_name: Arc<str>,
    pub total: Duration,
}

/// A user-authored note with the moment it was recorded.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ReflectionEntity {
    pub recorded_at: DateTime<Utc>,
    pub note: Arc<str>,
}

/// The standard way of writing a timestamp into the database. Fixed precision and a `Z` suffix
/// keep stored values lexicographically ordered.
pub fn timestamp_to_text(moment: DateTime<Utc>) -> String {
    moment.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn timestamp_from_text(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| anyhow!("invalid timestamp '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};

    use super::{timestamp_from_text, timestamp_to_text, UsageIntervalEntity};

    #[test]
    fn test_timestamp_text_keeps_milliseconds() -> Result<()> {
        let moment = Utc.with_ymd_and_hms(2024, 11, 29, 9, 30, 0).unwrap()
            + Duration::milliseconds(250);
        let text = timestamp_to_text(moment);
        assert_eq!(text, "2024-11-29T09:30:00.250Z");
        assert_eq!(timestamp_from_text(&text)?, moment);
        Ok(())
    }

    #[test]
    fn test_timestamp_from_offset_text() -> Result<()> {
        let parsed = timestamp_from_text("2024-11-29T10:30:00+01:00")?;
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 11, 29, 9, 30, 0).unwrap());
        Ok(())
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!(timestamp_from_text("yesterday-ish").is_err());
    }

    #[test]
    fn test_interval_duration() {
        let start = Utc.with_ymd_and_hms(2024, 11, 29, 9, 0, 0).unwrap();
        let interval = UsageIntervalEntity {
            app_name: "Safari".into(),
            start,
            end: start + Duration::seconds(42),
        };
        assert_eq!(interval.duration(), Duration::seconds(42));
    }
}
