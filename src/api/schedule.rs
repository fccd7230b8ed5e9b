use schedule_schema::{Schedule, ScheduleCreate, ScheduleUpdate};
use tracing::debug;

use crate::error::ClientError;
use crate::gateway::{ApiRequest, Gateway};

/// `schedules/*` calls.
#[derive(Clone)]
pub struct ScheduleApi {
    gateway: Gateway,
}

impl ScheduleApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Schedules of one month; `month` is 1-based.
    pub async fn list(&self, year: i32, month: u32) -> Result<Vec<Schedule>, ClientError> {
        if !(1..=12).contains(&month) {
            return Err(ClientError::InvalidInput(format!(
                "month must be within 1..=12, got {month}"
            )));
        }
        let request = ApiRequest::get("schedules/")
            .query("year", year)
            .query("month", month);
        let schedules: Vec<Schedule> = self.gateway.send_json(&request).await?;
        debug!(year, month, count = schedules.len(), "schedules listed");
        Ok(schedules)
    }

    pub async fn create(&self, schedule: &ScheduleCreate) -> Result<Schedule, ClientError> {
        let request = ApiRequest::post("schedules/").json(schedule)?;
        self.gateway.send_json(&request).await
    }

    pub async fn update(&self, id: i64, update: &ScheduleUpdate) -> Result<Schedule, ClientError> {
        if update.is_empty() {
            return Err(ClientError::InvalidInput(format!(
                "update for schedule {id} changes nothing"
            )));
        }
        let request = ApiRequest::put(format!("schedules/{id}")).json(update)?;
        self.gateway.send_json(&request).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.gateway
            .send(&ApiRequest::delete(format!("schedules/{id}")))
            .await
            .map(|_| ())
    }
}
