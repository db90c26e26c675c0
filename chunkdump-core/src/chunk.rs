//! Chunk framing inside the time-series section
//!
//! Layout, after the section length:
//! - 2 bytes: chunk count (little-endian)
//! - per chunk: 2 bytes length (little-endian), then `length` bytes of payload
//!
//! A chunk payload opens with a big-endian u16 sample count followed by the
//! bit-packed samples.

use crate::compression::XorDecoder;
use crate::config::{CHUNK_FRAME_BYTES, SAMPLE_COUNT_BYTES};
use crate::{DecodeError, Result, Sample};
use bytes::Buf;
use tracing::{debug, warn};

/// One framed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Position in the section
    pub index: usize,
    /// Absolute offset of the chunk's length field
    pub offset: usize,
    /// Declared byte length of the payload
    pub byte_length: u16,
    /// Declared number of samples
    pub sample_count: u16,
    /// Bit-packed samples, without the sample count
    pub payload: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// Split a chunk payload into its sample count and sample stream
    pub fn parse(index: usize, offset: usize, bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < SAMPLE_COUNT_BYTES {
            return Err(DecodeError::Framing(format!(
                "chunk {} at offset {} is {} bytes, too short for its sample count",
                index,
                offset,
                bytes.len()
            )));
        }

        let mut header = &bytes[..SAMPLE_COUNT_BYTES];
        let sample_count = header.get_u16();

        Ok(Self {
            index,
            offset,
            byte_length: bytes.len() as u16,
            sample_count,
            payload: &bytes[SAMPLE_COUNT_BYTES..],
        })
    }

    /// Lazy sample sequence, bounded by the declared count
    pub fn samples(&self) -> XorDecoder<'a> {
        XorDecoder::new(self.payload, self.sample_count as usize)
    }

    /// Absolute offset of the first sample byte
    fn samples_offset(&self) -> usize {
        self.offset + CHUNK_FRAME_BYTES + SAMPLE_COUNT_BYTES
    }

    /// Decode exactly `sample_count` samples
    pub fn decode_all(&self) -> Result<Vec<Sample>> {
        debug!(
            "Decoding chunk {} ({} bytes, {} samples)",
            self.index, self.byte_length, self.sample_count
        );
        self.samples().decode_all().map_err(|e| match e {
            DecodeError::OutOfBits {
                field,
                bit_offset,
                needed,
                available,
            } => DecodeError::Framing(format!(
                "chunk {} declares {} samples but its payload ends while reading {} at bit {} ({} of {} bits left)",
                self.index, self.sample_count, field, bit_offset, available, needed
            )),
            DecodeError::Truncated {
                field,
                offset,
                needed,
                available,
            } => DecodeError::Framing(format!(
                "chunk {} declares {} samples but its payload ends while reading {} at offset {} ({} of {} bytes left)",
                self.index,
                self.sample_count,
                field,
                self.samples_offset() + offset,
                available,
                needed
            )),
            other => other,
        })
    }
}

/// Time-series section: chunk count plus framed chunks
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesSection<'a> {
    /// Declared section length
    pub declared_length: u32,
    /// Declared number of chunks
    pub chunk_count: u16,
    body: &'a [u8],
    offset: usize,
}

impl<'a> TimeSeriesSection<'a> {
    /// Parse the chunk count at the start of `bytes`, located at `offset` in the input
    pub fn parse(bytes: &'a [u8], offset: usize, declared_length: u32) -> Result<Self> {
        if bytes.len() < CHUNK_FRAME_BYTES {
            return Err(DecodeError::truncated(
                "chunk count",
                offset,
                CHUNK_FRAME_BYTES,
                bytes.len(),
            ));
        }

        let mut cursor = &bytes[..CHUNK_FRAME_BYTES];
        let chunk_count = cursor.get_u16_le();

        Ok(Self {
            declared_length,
            chunk_count,
            body: &bytes[CHUNK_FRAME_BYTES..],
            offset: offset + CHUNK_FRAME_BYTES,
        })
    }

    /// Iterate over the framed chunks in order
    pub fn chunks(&self) -> ChunkIter<'a> {
        ChunkIter {
            data: self.body,
            base_offset: self.offset,
            position: 0,
            index: 0,
            remaining: self.chunk_count,
            done: false,
        }
    }

    /// Frame every chunk
    pub fn collect_chunks(&self) -> Result<Vec<Chunk<'a>>> {
        self.chunks().collect()
    }
}

/// Iterator over framed chunks
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    data: &'a [u8],
    base_offset: usize,
    position: usize,
    index: usize,
    remaining: u16,
    done: bool,
}

impl<'a> ChunkIter<'a> {
    /// Bytes consumed so far, including the chunk count field
    pub fn consumed(&self) -> usize {
        CHUNK_FRAME_BYTES + self.position
    }

    fn next_chunk(&mut self) -> Result<Chunk<'a>> {
        let data = self.data;
        let offset = self.base_offset + self.position;
        let rest = &data[self.position..];

        if rest.len() < CHUNK_FRAME_BYTES {
            return Err(DecodeError::truncated(
                "chunk length",
                offset,
                CHUNK_FRAME_BYTES,
                rest.len(),
            ));
        }
        let mut cursor = rest;
        let length = cursor.get_u16_le() as usize;

        if cursor.len() < length {
            return Err(DecodeError::Framing(format!(
                "chunk {} at offset {} declares {} bytes but only {} remain",
                self.index,
                offset,
                length,
                cursor.len()
            )));
        }

        let chunk = Chunk::parse(self.index, offset, &cursor[..length])?;
        self.position += CHUNK_FRAME_BYTES + length;
        self.index += 1;
        self.remaining -= 1;
        Ok(chunk)
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.remaining == 0 {
            self.done = true;
            let trailing = self.data.len() - self.position;
            if trailing > 0 {
                warn!(
                    "{} trailing bytes after the last chunk at offset {}",
                    trailing,
                    self.base_offset + self.position
                );
            }
            return None;
        }

        let result = self.next_chunk();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.remaining as usize))
        }
    }
}
