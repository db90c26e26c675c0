//! XOR chunk encoder, the exact mirror of [`XorDecoder`](super::XorDecoder)

use super::bitstream::BitWriter;
use super::decoder::XorWindow;
use super::varint::encode_varint;
use super::EncodedChunk;
use crate::config::{DOD_WIDTHS, LEADING_ZEROS_BITS, MEANINGFUL_BITS_BITS};
use crate::Sample;

/// Encoder for one chunk payload
pub struct XorEncoder {
    writer: BitWriter,
    count: usize,

    // Timestamp state
    prev_timestamp: i64,
    prev_timestamp_delta: i64,

    // Value state
    prev_value_bits: u64,
    window: Option<XorWindow>,
}

impl XorEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {
            writer: BitWriter::with_capacity(128),
            count: 0,
            prev_timestamp: 0,
            prev_timestamp_delta: 0,
            prev_value_bits: 0,
            window: None,
        }
    }

    /// Append a sample
    pub fn encode(&mut self, sample: Sample) {
        match self.count {
            0 => self.encode_first(sample),
            1 => self.encode_second(sample),
            _ => {
                self.encode_timestamp(sample.timestamp);
                self.encode_value(sample.value);
            }
        }
        self.count += 1;
    }

    /// Number of samples encoded so far
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if no sample was encoded
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Finish encoding and return the chunk payload
    pub fn finish(self) -> EncodedChunk {
        EncodedChunk {
            data: self.writer.finish(),
            count: self.count,
        }
    }

    fn encode_first(&mut self, sample: Sample) {
        self.prev_timestamp = sample.timestamp;

        let mut head = Vec::with_capacity(18);
        encode_varint(sample.timestamp, &mut head);
        let value_bits = sample.value.to_bits();
        head.extend_from_slice(&value_bits.to_be_bytes());
        self.writer.write_aligned(&head);

        self.prev_value_bits = value_bits;
    }

    fn encode_second(&mut self, sample: Sample) {
        let delta = sample.timestamp.wrapping_sub(self.prev_timestamp);

        let mut head = Vec::with_capacity(10);
        encode_varint(delta, &mut head);
        self.writer.write_aligned(&head);
        self.encode_value(sample.value);

        self.prev_timestamp_delta = delta;
        self.prev_timestamp = sample.timestamp;
    }

    fn encode_timestamp(&mut self, timestamp: i64) {
        let delta = timestamp.wrapping_sub(self.prev_timestamp);
        let delta_of_delta = delta.wrapping_sub(self.prev_timestamp_delta);

        if delta_of_delta == 0 {
            self.writer.write_bit(false);
        } else {
            // prefix '10', '110', '1110' or '1111'
            let narrow = DOD_WIDTHS[..DOD_WIDTHS.len() - 1]
                .iter()
                .position(|&width| fits_width(delta_of_delta, width));
            let (prefix_ones, width) = match narrow {
                Some(i) => (i + 1, DOD_WIDTHS[i]),
                None => (DOD_WIDTHS.len(), DOD_WIDTHS[DOD_WIDTHS.len() - 1]),
            };

            for _ in 0..prefix_ones {
                self.writer.write_bit(true);
            }
            if prefix_ones < DOD_WIDTHS.len() {
                self.writer.write_bit(false);
            }
            // the two's complement low bits decode back through the sign rule
            self.writer.write_bits(delta_of_delta as u64, width);
        }

        self.prev_timestamp_delta = delta;
        self.prev_timestamp = timestamp;
    }

    fn encode_value(&mut self, value: f64) {
        let value_bits = value.to_bits();
        let xor = value_bits ^ self.prev_value_bits;

        if xor == 0 {
            self.writer.write_bit(false);
        } else {
            self.writer.write_bit(true);

            let leading_zeros = xor.leading_zeros().min(31);
            let trailing_zeros = xor.trailing_zeros();

            match self.window {
                Some(window)
                    if leading_zeros >= window.leading_zeros
                        && trailing_zeros >= window.trailing_zeros() =>
                {
                    self.writer.write_bit(false);
                    self.writer.write_bits(
                        xor >> window.trailing_zeros(),
                        window.meaningful_bits as usize,
                    );
                }
                _ => {
                    let window = XorWindow {
                        leading_zeros,
                        meaningful_bits: 64 - leading_zeros - trailing_zeros,
                    };
                    self.writer.write_bit(true);
                    self.writer.write_bits(leading_zeros as u64, LEADING_ZEROS_BITS);
                    // 64 wraps to 0 in the six-bit field
                    self.writer.write_bits(
                        window.meaningful_bits as u64 & 0x3f,
                        MEANINGFUL_BITS_BITS,
                    );
                    self.writer.write_bits(xor >> trailing_zeros, window.meaningful_bits as usize);
                    self.window = Some(window);
                }
            }
        }

        self.prev_value_bits = value_bits;
    }
}

impl Default for XorEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `value` lies in `[-(2^(w-1) - 1), 2^(w-1)]`
fn fits_width(value: i64, width: usize) -> bool {
    let half = 1i64 << (width - 1);
    value > -half && value <= half
}
