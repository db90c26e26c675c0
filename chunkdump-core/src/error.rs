//! Error types for chunkdump

use thiserror::Error;

/// Result type alias for decoding operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Decoding error types
#[derive(Error, Debug)]
pub enum DecodeError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input ended before a length-governed field could be read
    #[error("Truncated input: {field} at offset {offset} needs {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Bit stream ended before a field could be read
    #[error("Truncated bit stream: {field} at bit {bit_offset} needs {needed} bits, {available} available")]
    OutOfBits {
        field: &'static str,
        bit_offset: usize,
        needed: usize,
        available: usize,
    },

    /// Framing is inconsistent with the declared lengths or counts
    #[error("Framing error: {0}")]
    Framing(String),

    /// Byte-aligned read attempted while the bit cursor sits mid-byte
    #[error("Misaligned read of {field} at bit offset {bit_offset}")]
    Misaligned { field: &'static str, bit_offset: usize },

    /// Metadata decompression failed
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Invalid data format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl DecodeError {
    /// Build a truncation error for `field` starting at `offset`
    pub(crate) fn truncated(field: &'static str, offset: usize, needed: usize, available: usize) -> Self {
        DecodeError::Truncated {
            field,
            offset,
            needed,
            available,
        }
    }

    /// Check if error indicates the input ended early
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            DecodeError::Truncated { .. } | DecodeError::OutOfBits { .. }
        )
    }

    /// Check if error indicates the input cannot be trusted past this point
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            DecodeError::Truncated { .. }
                | DecodeError::OutOfBits { .. }
                | DecodeError::Framing(_)
                | DecodeError::Misaligned { .. }
        )
    }
}
