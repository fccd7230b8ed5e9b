use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_format;

/// A schedule record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Schedule {
    pub id: i64,
    pub title: String,
    /// Calendar day, `YYYY-MM-DD` on the wire.
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: i64,
}

/// Body of `POST schedules/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScheduleCreate {
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Body of `PUT schedules/{id}`. Unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScheduleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time_format::option"
    )]
    pub start_time: Option<NaiveTime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time_format::option"
    )]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ScheduleUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schedule_accepts_times_with_seconds() {
        let schedule: Schedule = serde_json::from_value(json!({
            "id": 7,
            "title": "Dentist",
            "date": "2025-11-18",
            "start_time": "14:00:00",
            "end_time": "15:30:00",
            "content": null,
            "created_at": "2025-11-01T09:00:00Z",
            "updated_at": "2025-11-01T09:00:00+09:00",
            "user_id": 3
        }))
        .expect("valid schedule payload");

        assert_eq!(schedule.start_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(schedule.end_time, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
        assert_eq!(schedule.content, None);
    }

    #[test]
    fn create_sends_short_times_and_omits_missing_content() {
        let body = ScheduleCreate {
            title: "Standup".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            content: None,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "title": "Standup",
                "date": "2025-11-18",
                "start_time": "09:00",
                "end_time": "09:15"
            })
        );
    }

    #[test]
    fn update_serializes_only_set_fields() {
        let update = ScheduleUpdate {
            end_time: NaiveTime::from_hms_opt(18, 0, 0),
            ..Default::default()
        };

        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "end_time": "18:00" })
        );
        assert!(ScheduleUpdate::default().is_empty());
    }
}
