//! Event model

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Start of an event. Some listings only carry a local date.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum EventStart {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventStart {
    /// Instant used for ordering; date-only starts sort at midnight UTC
    #[must_use]
    pub fn sort_key(&self) -> DateTime<Utc> {
        match self {
            EventStart::DateTime(dt) => *dt,
            EventStart::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            EventStart::DateTime(dt) => dt.date_naive(),
            EventStart::Date(date) => *date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start: EventStart,
    pub venue_label: String,
    pub image_url: Option<String>,
    pub detail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_only_sorts_before_same_day_times() {
        let date = EventStart::Date(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        let evening = EventStart::DateTime(
            DateTime::parse_from_rfc3339("2026-03-14T20:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        assert!(date.sort_key() < evening.sort_key());
        assert_eq!(date.date(), evening.date());
    }
}
