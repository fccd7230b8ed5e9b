//! `ai/parse` request and response.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::schedule::ScheduleCreate;
use crate::time_format;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiParseRequest {
    pub text: String,
}

/// Schedule fields extracted from free text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AiParsedSchedule {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveTime,
}

impl From<AiParsedSchedule> for ScheduleCreate {
    fn from(parsed: AiParsedSchedule) -> Self {
        ScheduleCreate {
            title: parsed.title,
            date: parsed.date,
            start_time: parsed.start_time,
            end_time: parsed.end_time,
            content: parsed.content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AiParseResponse {
    pub is_complete: bool,
    #[serde(default)]
    pub data: Option<AiParsedSchedule>,
    #[serde(default)]
    pub question: Option<String>,
}

/// What the assistant made of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Complete(AiParsedSchedule),
    NeedsMoreInfo(String),
}

impl AiParseResponse {
    /// Folds the flag/data/question triple into a single outcome.
    ///
    /// Returns `None` when the payload contradicts itself (complete without data, or
    /// incomplete without a question).
    pub fn into_outcome(self) -> Option<ParseOutcome> {
        match (self.is_complete, self.data, self.question) {
            (true, Some(data), _) => Some(ParseOutcome::Complete(data)),
            (false, _, Some(question)) if !question.trim().is_empty() => {
                Some(ParseOutcome::NeedsMoreInfo(question))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_response_yields_schedule() {
        let resp: AiParseResponse = serde_json::from_value(json!({
            "is_complete": true,
            "data": {
                "title": "Lunch with Mina",
                "date": "2025-11-20",
                "content": null,
                "start_time": "12:00:00",
                "end_time": "13:00:00"
            },
            "question": null
        }))
        .unwrap();

        let Some(ParseOutcome::Complete(parsed)) = resp.into_outcome() else {
            panic!("expected a complete outcome");
        };
        let create = ScheduleCreate::from(parsed);
        assert_eq!(create.title, "Lunch with Mina");
        assert_eq!(create.start_time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn incomplete_response_yields_question() {
        let resp: AiParseResponse = serde_json::from_value(json!({
            "is_complete": false,
            "data": null,
            "question": "What time does it start?"
        }))
        .unwrap();

        assert_eq!(
            resp.into_outcome(),
            Some(ParseOutcome::NeedsMoreInfo(
                "What time does it start?".to_string()
            ))
        );
    }

    #[test]
    fn contradictory_response_has_no_outcome() {
        let resp = AiParseResponse {
            is_complete: true,
            data: None,
            question: None,
        };
        assert_eq!(resp.into_outcome(), None);
    }
}
