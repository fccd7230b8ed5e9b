//! Month-scoped schedule cache.
//!
//! Holds the schedules of the month in view and keeps them in step with every
//! create/update/delete made through it. A failed `fetch` keeps the previous list and
//! records a message instead of failing; mutations record the message and return the
//! error.

use chrono::{Datelike, NaiveDate};
use schedule_schema::{Schedule, ScheduleCreate, ScheduleUpdate};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::api::ScheduleApi;
use crate::error::ClientError;

#[derive(Debug, Default)]
struct StoreState {
    month: Option<(i32, u32)>,
    schedules: Vec<Schedule>,
    loading: bool,
    last_error: Option<String>,
}

impl StoreState {
    fn in_view(&self, date: NaiveDate) -> bool {
        self.month
            .is_none_or(|(year, month)| date.year() == year && date.month() == month)
    }
}

pub struct ScheduleStore {
    api: ScheduleApi,
    state: Mutex<StoreState>,
}

impl ScheduleStore {
    pub fn new(api: ScheduleApi) -> Self {
        Self {
            api,
            state: Mutex::new(StoreState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) {
        let mut state = self.lock();
        state.loading = true;
        state.last_error = None;
    }

    fn fail(&self, action: &str, err: &ClientError) {
        warn!(action, error = %err, "schedule store operation failed");
        let mut state = self.lock();
        state.loading = false;
        state.last_error = Some(format!("failed to {action}: {err}"));
    }

    /// Loads `year`/`month` into the cache.
    pub async fn fetch(&self, year: i32, month: u32) {
        self.begin();
        match self.api.list(year, month).await {
            Ok(schedules) => {
                debug!(year, month, count = schedules.len(), "schedule cache replaced");
                let mut state = self.lock();
                state.month = Some((year, month));
                state.schedules = schedules;
                state.loading = false;
            }
            Err(e) => self.fail("load schedules", &e),
        }
    }

    pub async fn add(&self, schedule: ScheduleCreate) -> Result<Schedule, ClientError> {
        self.begin();
        match self.api.create(&schedule).await {
            Ok(created) => {
                let mut state = self.lock();
                if state.in_view(created.date) {
                    state.schedules.push(created.clone());
                }
                state.loading = false;
                Ok(created)
            }
            Err(e) => {
                self.fail("create schedule", &e);
                Err(e)
            }
        }
    }

    pub async fn edit(&self, id: i64, update: ScheduleUpdate) -> Result<Schedule, ClientError> {
        self.begin();
        match self.api.update(id, &update).await {
            Ok(updated) => {
                let mut state = self.lock();
                let keep = state.in_view(updated.date);
                match state.schedules.iter().position(|s| s.id == id) {
                    Some(idx) if keep => state.schedules[idx] = updated.clone(),
                    Some(idx) => {
                        state.schedules.remove(idx);
                    }
                    None if keep && state.month.is_some() => {
                        state.schedules.push(updated.clone());
                    }
                    None => {}
                }
                state.loading = false;
                Ok(updated)
            }
            Err(e) => {
                self.fail("update schedule", &e);
                Err(e)
            }
        }
    }

    pub async fn remove(&self, id: i64) -> Result<(), ClientError> {
        self.begin();
        match self.api.delete(id).await {
            Ok(()) => {
                let mut state = self.lock();
                state.schedules.retain(|s| s.id != id);
                state.loading = false;
                Ok(())
            }
            Err(e) => {
                self.fail("delete schedule", &e);
                Err(e)
            }
        }
    }

    pub fn schedules(&self) -> Vec<Schedule> {
        self.lock().schedules.clone()
    }

    /// Cached schedules on `date`, earliest start first.
    pub fn on_date(&self, date: NaiveDate) -> Vec<Schedule> {
        let mut day: Vec<Schedule> = self
            .lock()
            .schedules
            .iter()
            .filter(|s| s.date == date)
            .cloned()
            .collect();
        day.sort_by_key(|s| (s.start_time, s.end_time, s.id));
        day
    }

    /// `(year, month)` currently cached, if any fetch succeeded.
    pub fn month(&self) -> Option<(i32, u32)> {
        self.lock().month
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }
}
