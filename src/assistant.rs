use chrono::Datelike;
use schedule_schema::{AiParsedSchedule, ParseOutcome};
use std::sync::Arc;
use tracing::info;

use crate::api::AiApi;
use crate::error::ClientError;
use crate::store::ScheduleStore;

/// Answer to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    /// The backend understood the text and stored the schedule.
    Scheduled(AiParsedSchedule),
    /// More information is needed.
    Question(String),
    NotUnderstood,
}

/// Turns chat messages into schedules via `ai/parse`.
pub struct Assistant {
    ai: AiApi,
    store: Arc<ScheduleStore>,
}

impl Assistant {
    pub fn new(ai: AiApi, store: Arc<ScheduleStore>) -> Self {
        Self { ai, store }
    }

    pub async fn submit(&self, text: &str) -> Result<AssistantReply, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::InvalidInput("message is empty".to_string()));
        }

        let reply = match self.ai.parse(text).await?.into_outcome() {
            Some(ParseOutcome::Complete(parsed)) => {
                info!(title = %parsed.title, date = %parsed.date, "assistant scheduled entry");
                // The backend saved it already; reload the month if it is the one in view.
                let month = (parsed.date.year(), parsed.date.month());
                if self.store.month() == Some(month) {
                    self.store.fetch(month.0, month.1).await;
                }
                AssistantReply::Scheduled(parsed)
            }
            Some(ParseOutcome::NeedsMoreInfo(question)) => AssistantReply::Question(question),
            None => AssistantReply::NotUnderstood,
        };
        Ok(reply)
    }
}
