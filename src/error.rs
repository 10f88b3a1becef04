//! Error types for the scale protocol.

use thiserror::Error;

/// Errors raised while encoding, decoding or driving a scale conversation.
#[derive(Error, Debug)]
pub enum ScaleError {
    /// Frame is too short to hold a header and checksum.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Declared length byte disagrees with the number of bytes received.
    #[error("packet length is incorrect: expected {expected} bytes, got {actual} bytes")]
    LengthMismatch {
        expected: usize,
        actual: usize,
    },

    /// Additive checksum does not match the trailing byte.
    #[error("packet checksum is incorrect: computed 0x{expected:02x}, frame carries 0x{actual:02x}")]
    ChecksumMismatch {
        expected: u8,
        actual: u8,
    },

    /// Byte at offset 2 is not the magic constant.
    #[error("magic byte mismatch: got 0x{0:02x}")]
    MagicMismatch(u8),

    /// Recognised type code but the payload cannot hold its layout.
    #[error("malformed payload for type 0x{msg_type:02x}: {reason}")]
    MalformedPayload {
        msg_type: u8,
        reason: String,
    },

    /// Requested frame cannot be represented on the wire.
    #[error("cannot encode frame: {0}")]
    Encoding(String),

    /// Display unit token not understood by the scale.
    #[error("unknown display unit: {0:?}")]
    UnknownUnit(String),

    /// Writing a frame to the transport failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScaleError {
    pub fn malformed(msg_type: u8, reason: impl Into<String>) -> Self {
        ScaleError::MalformedPayload {
            msg_type,
            reason: reason.into(),
        }
    }

    pub fn encoding(reason: impl Into<String>) -> Self {
        ScaleError::Encoding(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, ScaleError>;
