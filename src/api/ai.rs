use schedule_schema::{AiParseRequest, AiParseResponse};

use crate::error::ClientError;
use crate::gateway::{ApiRequest, Gateway};

/// `ai/*` calls.
#[derive(Clone)]
pub struct AiApi {
    gateway: Gateway,
}

impl AiApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Sends free text to the backend's parser.
    pub async fn parse(&self, text: &str) -> Result<AiParseResponse, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::InvalidInput("text to parse is empty".to_string()));
        }
        let request = ApiRequest::post("ai/parse").json(&AiParseRequest {
            text: text.to_string(),
        })?;
        self.gateway.send_json(&request).await
    }
}
