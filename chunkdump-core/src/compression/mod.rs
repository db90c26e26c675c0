//! XOR chunk compression for time-series samples
//!
//! The bit layout follows the Gorilla paper ("Gorilla: A Fast, Scalable,
//! In-Memory Time Series Database") as adapted by Prometheus: varint first
//! timestamp and delta, delta-of-delta with 14/17/20/64-bit fields, and
//! XOR-compressed values.

mod bitstream;
mod decoder;
mod encoder;
pub mod varint;

pub use bitstream::{BitReader, BitWriter};
pub use decoder::{DecoderState, XorDecoder, XorWindow};
pub use encoder::XorEncoder;

/// Encoded payload of one chunk, without its sample count header
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    /// Bit-packed samples
    pub data: Vec<u8>,
    /// Number of samples
    pub count: usize,
}
