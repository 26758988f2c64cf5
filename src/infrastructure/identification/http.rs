//! HTTP identification service adapter
//!
//! Uploads the sample as a single multipart `file` field and interprets the
//! JSON answer. A body whose `status` is anything but `"success"` is a no-match;
//! everything that prevents reading a valid answer is a transport failure.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::application::ports::{IdentificationError, Identifier};
use crate::domain::identification::MatchResult;
use crate::domain::recording::Sample;

/// Multipart field name the service expects
const FILE_FIELD: &str = "file";

const SUCCESS_STATUS: &str = "success";

/// Fields of a successful answer
#[derive(Debug, Deserialize)]
struct MatchPayload {
    song: String,
    confidence: u64,
    offset_seconds: f64,
}

/// Identification over HTTP
pub struct HttpIdentifier {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpIdentifier {
    /// Create an identifier for `endpoint` with an overall request timeout
    pub fn new(endpoint: &str, timeout: StdDuration) -> Result<Self, IdentificationError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            IdentificationError::Transport(format!("Invalid endpoint '{}': {}", endpoint, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentificationError::Transport(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_form(sample: &Sample) -> Result<Form, IdentificationError> {
        let part = Part::bytes(sample.to_vec())
            .file_name(sample.file_name())
            .mime_str(sample.encoding().as_str())
            .map_err(|e| IdentificationError::Transport(format!("Failed to build upload: {}", e)))?;

        Ok(Form::new().part(FILE_FIELD, part))
    }

    /// Interpret a response body
    fn parse_answer(body: &str) -> Result<MatchResult, IdentificationError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| IdentificationError::Transport(format!("Response is not JSON: {}", e)))?;

        let status = value.get("status").and_then(Value::as_str);
        if status != Some(SUCCESS_STATUS) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .or(status)
                .unwrap_or("no status in response");
            return Err(IdentificationError::NoMatch(message.to_string()));
        }

        let payload: MatchPayload = serde_json::from_value(value)
            .map_err(|e| IdentificationError::Transport(format!("Malformed match: {}", e)))?;

        MatchResult::new(payload.song, payload.confidence, payload.offset_seconds)
            .map_err(|e| IdentificationError::Transport(format!("Malformed match: {}", e)))
    }
}

#[async_trait]
impl Identifier for HttpIdentifier {
    async fn identify(&self, sample: &Sample) -> Result<MatchResult, IdentificationError> {
        let form = Self::build_form(sample)?;

        debug!(
            endpoint = %self.endpoint,
            file = %sample.file_name(),
            size = sample.size_bytes(),
            "Sending identification request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| IdentificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IdentificationError::Transport(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IdentificationError::Transport(format!("Failed to read response: {}", e)))?;

        debug!(status = %status, bytes = body.len(), "Identification response received");
        Self::parse_answer(&body)
    }
}
