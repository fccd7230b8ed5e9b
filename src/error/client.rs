use reqwest::StatusCode;
use schedule_schema::ApiErrorBody;
use std::{sync::Arc, time::Duration};
use thiserror::Error as ThisError;

use super::IsAuthExpired;

/// Longest slice of an unparseable error body kept in [`ClientError::Status`].
pub(crate) const BODY_PREVIEW_CHARS: usize = 512;

#[derive(Debug, ThisError)]
pub enum ClientError {
    /// Non-success answer from the backend. `message` is the backend's `detail` when it
    /// sent one, otherwise a preview of the raw body.
    #[error("Backend error with status {status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
        body: String,
    },

    /// The session could not be renewed. Every request of the same episode shares this
    /// exact inner error.
    #[error("Session refresh failed: {0}")]
    RefreshFailed(Arc<ClientError>),

    #[error("Session refresh timed out after {0:?}")]
    RefreshTimeout(Duration),

    /// The request driving the refresh was cancelled before the refresh settled.
    #[error("Session refresh was abandoned before completing")]
    RefreshAborted,

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl ClientError {
    /// Builds a [`ClientError::Status`] from an error answer's status and body.
    pub(crate) fn from_response_body(status: StatusCode, body: String) -> Self {
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => parsed.message(),
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
            Err(_) => format!("{:.len$}", body, len = BODY_PREVIEW_CHARS),
        };
        ClientError::Status {
            status,
            message,
            body,
        }
    }

    /// HTTP status of a backend answer, if this error came from one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::ReqwestError(e) => e.status(),
            _ => None,
        }
    }

    /// True for errors that end the session: refresh failures of any kind.
    pub fn is_session_lost(&self) -> bool {
        matches!(
            self,
            ClientError::RefreshFailed(_)
                | ClientError::RefreshTimeout(_)
                | ClientError::RefreshAborted
        )
    }
}

impl IsAuthExpired for ClientError {
    fn is_auth_expired(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}
