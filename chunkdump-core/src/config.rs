//! Format constants and decode configuration

use crate::metadata::MetadataCodec;

/// Longest varint encoding of a 64-bit value
pub const MAX_VARINT_LEN: usize = 10;

/// Width of the big-endian metadata and time-series length prefixes
pub const SECTION_LENGTH_BYTES: usize = 4;

/// Width of the little-endian chunk count and chunk length fields
pub const CHUNK_FRAME_BYTES: usize = 2;

/// Width of the big-endian sample count at the start of a chunk payload
pub const SAMPLE_COUNT_BYTES: usize = 2;

/// Delta-of-delta field widths selected by the `10`, `110`, `1110`, `1111` prefixes
pub const DOD_WIDTHS: [usize; 4] = [14, 17, 20, 64];

/// Width of the leading-zero count in a new XOR window
pub const LEADING_ZEROS_BITS: usize = 5;

/// Width of the meaningful-bit count in a new XOR window
pub const MEANINGFUL_BITS_BITS: usize = 6;

/// How the declared time-series section length is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionLengthPolicy {
    /// The declared length bounds chunk framing; a shortfall is an error
    #[default]
    Enforce,
    /// The declared length is informational; framing runs over the rest of the input
    Ignore,
}

/// Decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeConfig {
    /// Treatment of the time-series section length
    pub section_length: SectionLengthPolicy,
    /// Codec of the metadata block
    pub codec: MetadataCodec,
}

impl DecodeConfig {
    /// Reference-compatible configuration: the section length is not checked
    pub fn lenient() -> Self {
        Self {
            section_length: SectionLengthPolicy::Ignore,
            ..Default::default()
        }
    }

    /// Use `codec` for the metadata block
    pub fn with_codec(mut self, codec: MetadataCodec) -> Self {
        self.codec = codec;
        self
    }
}
