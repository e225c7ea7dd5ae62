//! Error types for framing and message serialization.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode message: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },

    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SerializationError {
    /// True when the frame itself was unreadable but the stream is still
    /// aligned on frame boundaries, so the next frame can be read.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, SerializationError>;
