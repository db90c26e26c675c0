//! XOR chunk decoder for time-series decompression
//!
//! Samples are reconstructed strictly in order. The first sample is stored
//! verbatim, the second carries a varint timestamp delta, and every later
//! sample carries a delta-of-delta. Values after the first are XORed against
//! their predecessor.

use super::bitstream::BitReader;
use super::varint::decode_varint;
use crate::config::{DOD_WIDTHS, LEADING_ZEROS_BITS, MAX_VARINT_LEN, MEANINGFUL_BITS_BITS};
use crate::{DecodeError, Result, Sample};
use bytes::Buf;

/// Position and width of the non-zero run in an XORed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorWindow {
    /// Zero bits above the meaningful run
    pub leading_zeros: u32,
    /// Length of the meaningful run, 1..=64
    pub meaningful_bits: u32,
}

impl XorWindow {
    /// Zero bits below the meaningful run
    pub fn trailing_zeros(&self) -> u32 {
        64 - self.leading_zeros - self.meaningful_bits
    }
}

/// Running history carried from one sample to the next
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecoderState {
    /// Samples emitted so far
    pub emitted: usize,
    /// Last emitted sample
    pub prev: Option<Sample>,
    /// Difference between the two most recent timestamps
    pub prev_delta: i64,
    /// Most recently declared XOR window
    pub window: Option<XorWindow>,
}

/// Decoder for one chunk payload
pub struct XorDecoder<'a> {
    reader: BitReader<'a>,
    count: usize,
    state: DecoderState,
    failed: bool,
}

impl<'a> XorDecoder<'a> {
    /// Create a decoder that yields `count` samples from `data`
    pub fn new(data: &'a [u8], count: usize) -> Self {
        Self {
            reader: BitReader::new(data),
            count,
            state: DecoderState::default(),
            failed: false,
        }
    }

    /// Decode all remaining samples
    pub fn decode_all(&mut self) -> Result<Vec<Sample>> {
        let mut samples = Vec::with_capacity(self.count - self.state.emitted.min(self.count));

        while let Some(sample) = self.decode_next()? {
            samples.push(sample);
        }

        Ok(samples)
    }

    /// Decode the next sample, or `None` once `count` samples were produced.
    ///
    /// State only advances when the whole sample decodes.
    pub fn decode_next(&mut self) -> Result<Option<Sample>> {
        if self.failed || self.state.emitted >= self.count {
            return Ok(None);
        }

        match self.step() {
            Ok((sample, next)) => {
                self.state = next;
                Ok(Some(sample))
            }
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    /// Current decoder history
    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Bit offset of the cursor within the payload
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Number of samples this decoder will produce
    pub fn count(&self) -> usize {
        self.count
    }

    fn step(&mut self) -> Result<(Sample, DecoderState)> {
        let state = self.state;
        match state.prev {
            None => self.decode_first(state),
            Some(prev) if state.emitted == 1 => self.decode_second(state, prev),
            Some(prev) => self.decode_subsequent(state, prev),
        }
    }

    fn decode_first(&mut self, mut state: DecoderState) -> Result<(Sample, DecoderState)> {
        let timestamp = self.read_varint("first timestamp")?;
        let mut raw = self.reader.read_aligned("first value", 8)?;
        let value = raw.get_u64();

        let sample = Sample::new(timestamp, f64::from_bits(value));
        state.emitted = 1;
        state.prev = Some(sample);
        Ok((sample, state))
    }

    fn decode_second(&mut self, mut state: DecoderState, prev: Sample) -> Result<(Sample, DecoderState)> {
        let delta = self.read_varint("timestamp delta")?;
        let value = self.decode_value(&mut state, prev.value)?;

        let sample = Sample::new(prev.timestamp.wrapping_add(delta), value);
        state.emitted = 2;
        state.prev = Some(sample);
        state.prev_delta = delta;
        Ok((sample, state))
    }

    fn decode_subsequent(&mut self, mut state: DecoderState, prev: Sample) -> Result<(Sample, DecoderState)> {
        let delta_of_delta = self.decode_delta_of_delta()?;
        let delta = state.prev_delta.wrapping_add(delta_of_delta);
        let value = self.decode_value(&mut state, prev.value)?;

        let sample = Sample::new(prev.timestamp.wrapping_add(delta), value);
        state.emitted += 1;
        state.prev = Some(sample);
        state.prev_delta = delta;
        Ok((sample, state))
    }

    fn decode_delta_of_delta(&mut self) -> Result<i64> {
        if !self.bit("timestamp control")? {
            // '0' - same delta
            return Ok(0);
        }

        // '10', '110', '1110' pick the narrow widths; '1111' escapes to 64 bits
        let mut width = DOD_WIDTHS[DOD_WIDTHS.len() - 1];
        for &candidate in &DOD_WIDTHS[..DOD_WIDTHS.len() - 1] {
            if !self.bit("timestamp control")? {
                width = candidate;
                break;
            }
        }

        let raw = self.bits(width, "delta of delta")?;
        Ok(sign_extend(raw, width))
    }

    fn decode_value(&mut self, state: &mut DecoderState, prev: f64) -> Result<f64> {
        if !self.bit("value changed")? {
            return Ok(prev);
        }

        let window = if !self.bit("value control")? {
            state.window.ok_or_else(|| {
                DecodeError::Framing(format!(
                    "sample {} reuses an XOR window before any was declared",
                    state.emitted
                ))
            })?
        } else {
            let leading_zeros = self.bits(LEADING_ZEROS_BITS, "leading zeros")? as u32;
            let mut meaningful_bits = self.bits(MEANINGFUL_BITS_BITS, "meaningful bits")? as u32;
            // 64 does not fit in six bits and is written as 0
            if meaningful_bits == 0 {
                meaningful_bits = 64;
            }
            if leading_zeros + meaningful_bits > 64 {
                return Err(DecodeError::Framing(format!(
                    "sample {} declares {} leading zeros and {} meaningful bits",
                    state.emitted, leading_zeros, meaningful_bits
                )));
            }

            let window = XorWindow {
                leading_zeros,
                meaningful_bits,
            };
            state.window = Some(window);
            window
        };

        let meaningful = self.bits(window.meaningful_bits as usize, "xor residue")?;
        let xor = meaningful << window.trailing_zeros();
        Ok(f64::from_bits(prev.to_bits() ^ xor))
    }

    fn read_varint(&mut self, field: &'static str) -> Result<i64> {
        let offset = self.reader.byte_offset();
        let window = self.reader.peek_aligned(field, MAX_VARINT_LEN)?;
        let (value, len) = match decode_varint(window) {
            Some(decoded) => decoded,
            None if window.len() < MAX_VARINT_LEN => {
                return Err(DecodeError::truncated(field, offset, window.len() + 1, window.len()));
            }
            None => {
                return Err(DecodeError::Framing(format!(
                    "{} at offset {} overflows 64 bits",
                    field, offset
                )));
            }
        };
        self.reader.read_aligned(field, len)?;
        Ok(value)
    }

    fn bit(&mut self, field: &'static str) -> Result<bool> {
        let bit_offset = self.reader.position();
        self.reader.read_bit().ok_or(DecodeError::OutOfBits {
            field,
            bit_offset,
            needed: 1,
            available: 0,
        })
    }

    fn bits(&mut self, num_bits: usize, field: &'static str) -> Result<u64> {
        let bit_offset = self.reader.position();
        let available = self.reader.remaining_bits();
        self.reader.read_bits(num_bits).ok_or(DecodeError::OutOfBits {
            field,
            bit_offset,
            needed: num_bits,
            available,
        })
    }
}

impl<'a> Iterator for XorDecoder<'a> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        (0, Some(self.count.saturating_sub(self.state.emitted)))
    }
}

/// Recover a signed delta-of-delta from a `width`-bit field.
///
/// Narrow fields cover `[-(2^(w-1) - 1), 2^(w-1)]`; the 64-bit escape is taken as-is.
pub(crate) fn sign_extend(raw: u64, width: usize) -> i64 {
    if width >= 64 {
        return raw as i64;
    }
    if raw > 1 << (width - 1) {
        raw as i64 - (1i64 << width)
    } else {
        raw as i64
    }
}
