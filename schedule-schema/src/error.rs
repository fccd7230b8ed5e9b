//! Backend error envelope.
//!
//! Plain HTTP errors carry `{"detail": "<message>"}`; request validation failures carry
//! `{"detail": [{"loc": [...], "msg": "...", "type": "..."}]}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
    Other(Value),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ValidationIssue {
    /// `body.end_time`-style field path.
    pub fn field_path(&self) -> String {
        self.loc
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl ApiErrorBody {
    /// Single human-readable line for the error.
    pub fn message(&self) -> String {
        match &self.detail {
            ErrorDetail::Message(msg) => msg.clone(),
            ErrorDetail::Validation(issues) => issues
                .iter()
                .map(|issue| {
                    let path = issue.field_path();
                    if path.is_empty() {
                        issue.msg.clone()
                    } else {
                        format!("{path}: {}", issue.msg)
                    }
                })
                .collect::<Vec<_>>()
                .join("; "),
            ErrorDetail::Other(value) => value.to_string(),
        }
    }
}
