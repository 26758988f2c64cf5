//! Audio chunk and sample value objects

use std::sync::Arc;

use super::Encoding;
use crate::domain::error::EmptySampleError;

/// An immutable fragment of encoded audio emitted by a recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    data: Vec<u8>,
}

impl AudioChunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Value object representing one completed recording.
/// Contains the assembled audio bytes and the encoding they were produced in.
///
/// Cloning is cheap; clones share the same buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    data: Arc<[u8]>,
    encoding: Encoding,
}

impl Sample {
    /// Create a sample from raw bytes. Empty input is rejected.
    pub fn new(data: Vec<u8>, encoding: Encoding) -> Result<Self, EmptySampleError> {
        if data.is_empty() {
            return Err(EmptySampleError);
        }
        Ok(Self {
            data: data.into(),
            encoding,
        })
    }

    /// Concatenate chunks in order into one sample, consuming them
    pub fn assemble(chunks: Vec<AudioChunk>, encoding: Encoding) -> Result<Self, EmptySampleError> {
        let total: usize = chunks.iter().map(AudioChunk::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(chunk.data());
        }
        Self::new(data, encoding)
    }

    /// Get the raw audio data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copy the audio data into an owned buffer
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Get the encoding
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Whether two samples are the same finalized buffer, not just equal bytes
    pub fn same_buffer(&self, other: &Sample) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// File name used when uploading
    pub fn file_name(&self) -> String {
        format!("recording.{}", self.encoding.extension())
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
