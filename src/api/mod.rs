//! Typed bindings for the backend's REST surface.

mod ai;
mod auth;
mod schedule;

pub use ai::AiApi;
pub use auth::AuthApi;
pub use schedule::ScheduleApi;
