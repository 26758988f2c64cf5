//! Capture encoding negotiation

use tracing::debug;

use super::ports::AudioDevice;
use crate::domain::recording::Encoding;

/// Picks the encoding a recording will use on this runtime.
///
/// The preferred encoding wins when the device supports it; otherwise the
/// broadly supported fallback is used. An unusable host is reported later by
/// the recording session, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureNegotiator {
    preferred: Encoding,
    fallback: Encoding,
}

impl CaptureNegotiator {
    /// Prefer `preferred`, fall back to WAV
    pub fn new(preferred: Encoding) -> Self {
        Self {
            preferred,
            fallback: Encoding::Wav,
        }
    }

    pub fn select_encoding<D: AudioDevice + ?Sized>(&self, device: &D) -> Encoding {
        if device.supports(self.preferred) {
            debug!(encoding = %self.preferred, "Preferred encoding supported");
            return self.preferred;
        }
        debug!(
            preferred = %self.preferred,
            fallback = %self.fallback,
            "Preferred encoding unsupported, falling back"
        );
        self.fallback
    }
}

impl Default for CaptureNegotiator {
    fn default() -> Self {
        Self::new(Encoding::Flac)
    }
}
