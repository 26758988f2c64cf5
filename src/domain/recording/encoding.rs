//! Capture encoding identifiers

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidEncodingError;

/// Audio encodings a capture device may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Lossless compressed FLAC, the preferred encoding
    #[default]
    Flac,
    /// Uncompressed 16-bit PCM in a WAV container
    Wav,
}

impl Encoding {
    /// All known encodings in preference order
    pub const ALL: [Encoding; 2] = [Encoding::Flac, Encoding::Wav];

    /// Get the MIME type string used as the encoding identifier
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }

    /// Short name used in config files and CLI flags
    pub const fn name(&self) -> &'static str {
        self.extension()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = InvalidEncodingError;

    /// Accepts the short name ("flac") or the MIME type ("audio/flac")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.name() == needle || e.as_str() == needle)
            .ok_or_else(|| InvalidEncodingError {
                input: s.to_string(),
            })
    }
}
