//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Hard ceiling for a single recording (10 seconds)
pub const RECORDING_CEILING_SECS: u64 = 10;

/// Default timeout for one identification request (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Value object representing a time duration.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// The longest a recording may ever run
    pub const fn recording_ceiling() -> Self {
        Self::from_secs(RECORDING_CEILING_SECS)
    }

    /// Default identification request timeout
    pub const fn default_request_timeout() -> Self {
        Self::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Limit this duration to the recording ceiling.
    ///
    /// Shorter recordings are allowed; longer ones are cut to the ceiling.
    pub fn clamp_to_ceiling(self) -> Self {
        self.min(Self::recording_ceiling())
    }

    /// Whether this duration exceeds the recording ceiling
    pub fn exceeds_ceiling(&self) -> bool {
        *self > Self::recording_ceiling()
    }

    /// Get duration in seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "5s", "1m", "1m30s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let invalid = || DurationParseError {
            input: s.to_string(),
        };

        let mut minutes: u64 = 0;
        let mut seconds: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;

        for ch in input.chars() {
            match ch {
                '0'..='9' => current_num.push(ch),
                'm' if !current_num.is_empty() => {
                    minutes = current_num.parse().map_err(|_| invalid())?;
                    current_num.clear();
                    found_any = true;
                }
                's' if !current_num.is_empty() => {
                    seconds = current_num.parse().map_err(|_| invalid())?;
                    current_num.clear();
                    found_any = true;
                }
                _ => return Err(invalid()),
            }
        }

        // Trailing digits without a unit
        if !current_num.is_empty() || !found_any {
            return Err(invalid());
        }

        let total_ms = minutes
            .checked_mul(60)
            .and_then(|secs| secs.checked_add(seconds))
            .and_then(|secs| secs.checked_mul(1000))
            .ok_or_else(invalid)?;
        if total_ms == 0 {
            return Err(invalid());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::recording_ceiling()
    }
}
