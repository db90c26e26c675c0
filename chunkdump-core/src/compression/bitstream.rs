//! Bit-level I/O for the XOR chunk encoding
//!
//! Both sides work most-significant-bit first. The reader owns its cursor
//! and only ever moves it forward.

use crate::{DecodeError, Result};

/// Bit writer for encoding compressed data
#[derive(Debug)]
pub struct BitWriter {
    buffer: Vec<u8>,
    current_byte: u8,
    bit_position: u8,
}

impl BitWriter {
    /// Create a new BitWriter
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            current_byte: 0,
            bit_position: 0,
        }
    }

    /// Create with capacity hint
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            current_byte: 0,
            bit_position: 0,
        }
    }

    /// Write a single bit
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.current_byte |= 1 << (7 - self.bit_position);
        }
        self.bit_position += 1;

        if self.bit_position == 8 {
            self.buffer.push(self.current_byte);
            self.current_byte = 0;
            self.bit_position = 0;
        }
    }

    /// Write the low `num_bits` bits of `value`
    #[inline]
    pub fn write_bits(&mut self, value: u64, num_bits: usize) {
        debug_assert!(num_bits <= 64);

        for i in (0..num_bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Append whole bytes; the writer must be byte-aligned
    pub fn write_aligned(&mut self, bytes: &[u8]) {
        debug_assert!(self.is_aligned(), "aligned write at bit {}", self.bit_position);
        self.buffer.extend_from_slice(bytes);
    }

    /// Whether the next bit starts a fresh byte
    pub fn is_aligned(&self) -> bool {
        self.bit_position == 0
    }

    /// Finish writing and return the buffer
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_position > 0 {
            self.buffer.push(self.current_byte);
        }
        self.buffer
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Bit reader over a single chunk payload
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_position: usize,
    bit_position: u8,
}

impl<'a> BitReader<'a> {
    /// Create a new BitReader
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_position: 0,
            bit_position: 0,
        }
    }

    /// Read a single bit
    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        if self.byte_position >= self.data.len() {
            return None;
        }

        let bit = (self.data[self.byte_position] >> (7 - self.bit_position)) & 1 == 1;
        self.bit_position += 1;

        if self.bit_position == 8 {
            self.byte_position += 1;
            self.bit_position = 0;
        }

        Some(bit)
    }

    /// Read `num_bits` bits, right-aligned in a u64.
    ///
    /// Returns `None` without moving the cursor if fewer bits remain.
    #[inline]
    pub fn read_bits(&mut self, num_bits: usize) -> Option<u64> {
        debug_assert!(num_bits <= 64);

        if num_bits > self.remaining_bits() {
            return None;
        }

        let mut value = 0u64;
        for _ in 0..num_bits {
            let bit = self.read_bit()?;
            value = (value << 1) | (bit as u64);
        }
        Some(value)
    }

    /// Borrow up to `len` upcoming bytes without consuming them.
    ///
    /// The slice is shorter than `len` near the end of the payload.
    pub fn peek_aligned(&self, field: &'static str, len: usize) -> Result<&'a [u8]> {
        self.ensure_aligned(field)?;
        let end = self.data.len().min(self.byte_position + len);
        Ok(&self.data[self.byte_position..end])
    }

    /// Consume exactly `len` whole bytes
    pub fn read_aligned(&mut self, field: &'static str, len: usize) -> Result<&'a [u8]> {
        self.ensure_aligned(field)?;
        let available = self.data.len() - self.byte_position;
        if available < len {
            return Err(DecodeError::truncated(field, self.byte_position, len, available));
        }
        let start = self.byte_position;
        self.byte_position += len;
        Ok(&self.data[start..self.byte_position])
    }

    fn ensure_aligned(&self, field: &'static str) -> Result<()> {
        if self.bit_position != 0 {
            return Err(DecodeError::Misaligned {
                field,
                bit_offset: self.position(),
            });
        }
        Ok(())
    }

    /// Bits left before the end of the payload
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() - self.byte_position) * 8 - self.bit_position as usize
    }

    /// Get the current position in bits
    pub fn position(&self) -> usize {
        self.byte_position * 8 + self.bit_position as usize
    }

    /// Byte offset of the cursor, rounded down
    pub fn byte_offset(&self) -> usize {
        self.byte_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_writer_reader() {
        let mut writer = BitWriter::new();

        writer.write_bit(true);
        writer.write_bit(false);
        writer.write_bit(true);
        writer.write_bits(0b1010_1010, 8);
        writer.write_bits(0xFF, 8);

        let data = writer.finish();

        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bit(), Some(true));
        assert_eq!(reader.read_bit(), Some(false));
        assert_eq!(reader.read_bit(), Some(true));
        assert_eq!(reader.read_bits(8), Some(0b1010_1010));
        assert_eq!(reader.read_bits(8), Some(0xFF));
    }

    #[test]
    fn test_write_read_various_sizes() {
        let mut writer = BitWriter::new();

        writer.write_bits(0b111, 3);
        writer.write_bits(0b10101, 5);
        writer.write_bits(0xABCD, 16);
        writer.write_bits(0xDEADBEEF, 32);
        writer.write_bits(u64::MAX - 1, 64);

        let data = writer.finish();

        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(3), Some(0b111));
        assert_eq!(reader.read_bits(5), Some(0b10101));
        assert_eq!(reader.read_bits(16), Some(0xABCD));
        assert_eq!(reader.read_bits(32), Some(0xDEADBEEF));
        assert_eq!(reader.read_bits(64), Some(u64::MAX - 1));
        assert_eq!(reader.remaining_bits(), 0);
    }

    #[test]
    fn test_msb_first_layout() {
        let data = [0b1000_0001, 0b0100_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(1), Some(1));
        assert_eq!(reader.read_bits(8), Some(0b0000_0010));
        assert_eq!(reader.position(), 9);
    }

    #[test]
    fn test_read_past_end_keeps_cursor() {
        let data = [0xAB];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(4), Some(0xA));
        assert_eq!(reader.read_bits(5), None);
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.read_bits(4), Some(0xB));
        assert_eq!(reader.read_bit(), None);
    }

    #[test]
    fn test_aligned_reads() {
        let data = [1, 2, 3, 4];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.peek_aligned("probe", 10).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(reader.read_aligned("head", 2).unwrap(), &[1, 2]);
        assert_eq!(reader.byte_offset(), 2);

        let err = reader.read_aligned("tail", 3).unwrap_err();
        assert!(err.is_truncation());

        reader.read_bit();
        let err = reader.peek_aligned("tail", 1).unwrap_err();
        assert!(matches!(err, DecodeError::Misaligned { bit_offset: 17, .. }));
    }

    #[test]
    fn test_writer_aligned_bytes() {
        let mut writer = BitWriter::new();
        writer.write_aligned(&[0xCA, 0xFE]);
        writer.write_bit(true);
        assert!(!writer.is_aligned());
        assert_eq!(writer.finish(), vec![0xCA, 0xFE, 0x80]);
    }
}
