//! Error types for frame and record encoding/decoding

use thiserror::Error;

/// Errors that can occur while decoding or encoding protocol data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input is shorter than the structure requires
    #[error("truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// Address bytes fail the shifted-ASCII checks
    #[error("malformed address: {0}")]
    MalformedAddress(String),

    /// Address values out of range for encoding
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Text form could not be parsed
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Structural precondition for encoding violated
    #[error("not encodable: {0}")]
    NotEncodable(String),

    /// Hex text could not be decoded
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl CodecError {
    pub(crate) fn truncated(what: &'static str, needed: usize, available: usize) -> Self {
        Self::Truncated {
            what,
            needed,
            available,
        }
    }
}

/// Result alias used throughout the codecs
pub type Result<T> = std::result::Result<T, CodecError>;
