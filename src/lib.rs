pub mod api;
pub mod assistant;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod store;

mod utils;

pub use client::ScheduleClient;
pub use error::ClientError;
pub use gateway::{ApiRequest, Gateway, SessionEvent};
pub use schedule_schema as schema;
