//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::{Duration, Encoding};

/// Identification endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "https://audio-print.onrender.com/identify";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub endpoint: Option<String>,
    pub duration: Option<String>,
    pub encoding: Option<String>,
    pub request_timeout: Option<String>,
    pub notify: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            duration: Some(Duration::recording_ceiling().to_string()),
            encoding: Some(Encoding::default().name().to_string()),
            request_timeout: Some(Duration::default_request_timeout().to_string()),
            notify: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            endpoint: other.endpoint.or(self.endpoint),
            duration: other.duration.or(self.duration),
            encoding: other.encoding.or(self.encoding),
            request_timeout: other.request_timeout.or(self.request_timeout),
            notify: other.notify.or(self.notify),
        }
    }

    /// Get the endpoint, or the default service URL
    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Get the recording duration, clamped to the ceiling; default if not set/invalid
    pub fn duration_or_default(&self) -> Duration {
        self.duration
            .as_ref()
            .and_then(|s| s.parse::<Duration>().ok())
            .map(Duration::clamp_to_ceiling)
            .unwrap_or_else(Duration::recording_ceiling)
    }

    /// Get the preferred encoding, or FLAC if not set/invalid
    pub fn encoding_or_default(&self) -> Encoding {
        self.encoding
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get the request timeout, or the default if not set/invalid
    pub fn request_timeout_or_default(&self) -> Duration {
        self.request_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_request_timeout)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }
}
