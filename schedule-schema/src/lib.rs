pub mod ai;
pub mod error;
pub mod schedule;
pub mod user;

mod time_format;

pub use ai::{AiParseRequest, AiParseResponse, AiParsedSchedule, ParseOutcome};
pub use error::{ApiErrorBody, ErrorDetail, ValidationIssue};
pub use schedule::{Schedule, ScheduleCreate, ScheduleUpdate};
pub use user::{Credentials, User};
