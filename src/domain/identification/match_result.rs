//! Match result value object

use std::fmt;

use crate::domain::error::InvalidMatchResult;

/// A song match reported by the identification service.
///
/// `confidence` counts matching fingerprint elements; `offset_seconds` is where
/// the sample aligns within the matched reference track.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    song_label: String,
    confidence: u64,
    offset_seconds: f64,
}

impl MatchResult {
    pub fn new(
        song_label: impl Into<String>,
        confidence: u64,
        offset_seconds: f64,
    ) -> Result<Self, InvalidMatchResult> {
        let song_label = song_label.into();
        if !offset_seconds.is_finite() || offset_seconds < 0.0 {
            return Err(InvalidMatchResult::InvalidOffset(offset_seconds));
        }
        Ok(Self {
            song_label,
            confidence,
            offset_seconds,
        })
    }

    pub fn song_label(&self) -> &str {
        &self.song_label
    }

    pub fn confidence(&self) -> u64 {
        self.confidence
    }

    pub fn offset_seconds(&self) -> f64 {
        self.offset_seconds
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} matches, offset {}s)",
            self.song_label, self.confidence, self.offset_seconds
        )
    }
}
