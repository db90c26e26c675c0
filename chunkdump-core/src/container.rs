//! Top-level container parsing
//!
//! Format (big-endian unless noted):
//! - 4 bytes: metadata section length `L`, counting these 4 bytes
//! - `L - 4` bytes: compressed metadata
//! - 4 bytes: time-series section length
//! - time-series section (see [`crate::chunk`])

use crate::chunk::{Chunk, TimeSeriesSection};
use crate::config::{DecodeConfig, SectionLengthPolicy, SECTION_LENGTH_BYTES};
use crate::metadata::{Decompressor, Metadata};
use crate::{DecodeError, Result, Sample};
use bytes::Buf;
use serde::Serialize;
use tracing::{debug, warn};

/// Borrowed view of a parsed container
#[derive(Debug, Clone, Copy)]
pub struct Container<'a> {
    /// Metadata section length, prefix included
    pub metadata_length: u32,
    /// Compressed metadata bytes
    pub metadata_payload: &'a [u8],
    /// Time-series section
    pub series: TimeSeriesSection<'a>,
}

impl<'a> Container<'a> {
    /// Split `input` into its metadata and time-series sections
    pub fn parse(input: &'a [u8], config: &DecodeConfig) -> Result<Self> {
        let metadata_length = read_u32(input, 0, "metadata length")?;
        let metadata_end = metadata_length as usize;

        if metadata_end < SECTION_LENGTH_BYTES {
            return Err(DecodeError::Framing(format!(
                "metadata length {} is shorter than its own {}-byte prefix",
                metadata_length, SECTION_LENGTH_BYTES
            )));
        }
        if input.len() < metadata_end {
            return Err(DecodeError::truncated(
                "metadata payload",
                SECTION_LENGTH_BYTES,
                metadata_end - SECTION_LENGTH_BYTES,
                input.len() - SECTION_LENGTH_BYTES,
            ));
        }

        let series_length = read_u32(input, metadata_end, "time-series length")?;
        let series_start = metadata_end + SECTION_LENGTH_BYTES;
        let mut body = &input[series_start..];

        match config.section_length {
            SectionLengthPolicy::Enforce => {
                let declared = series_length as usize;
                if body.len() < declared {
                    return Err(DecodeError::truncated(
                        "time-series section",
                        series_start,
                        declared,
                        body.len(),
                    ));
                }
                if body.len() > declared {
                    warn!(
                        "Ignoring {} bytes after the declared time-series section",
                        body.len() - declared
                    );
                }
                body = &body[..declared];
            }
            SectionLengthPolicy::Ignore => {
                if body.len() != series_length as usize {
                    debug!(
                        "Time-series section declares {} bytes, {} present",
                        series_length,
                        body.len()
                    );
                }
            }
        }

        let series = TimeSeriesSection::parse(body, series_start, series_length)?;
        debug!(
            "Parsed container: metadata {} bytes, time series {} bytes, {} chunks",
            metadata_length, series_length, series.chunk_count
        );

        Ok(Self {
            metadata_length,
            metadata_payload: &input[SECTION_LENGTH_BYTES..metadata_end],
            series,
        })
    }

    /// Decompress the metadata block
    pub fn metadata(&self, codec: &dyn Decompressor) -> Result<Metadata> {
        Metadata::decode(self.metadata_payload, codec)
    }

    /// Frame every chunk of the time-series section
    pub fn chunks(&self) -> Result<Vec<Chunk<'a>>> {
        self.series.collect_chunks()
    }
}

fn read_u32(input: &[u8], offset: usize, field: &'static str) -> Result<u32> {
    let available = input.len().saturating_sub(offset);
    if available < SECTION_LENGTH_BYTES {
        return Err(DecodeError::truncated(field, offset, SECTION_LENGTH_BYTES, available));
    }
    let mut cursor = &input[offset..offset + SECTION_LENGTH_BYTES];
    Ok(cursor.get_u32())
}

/// Fully decoded chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedChunk {
    /// Position in the section
    pub index: usize,
    /// Declared payload length in bytes
    pub byte_length: u16,
    /// Declared sample count
    pub sample_count: u16,
    /// Decoded samples, exactly `sample_count` of them
    pub samples: Vec<Sample>,
}

/// Fully decoded container
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedContainer {
    /// Metadata section length, prefix included
    pub metadata_length: u32,
    /// Decompressed metadata
    pub metadata: Metadata,
    /// Declared time-series section length
    pub series_length: u32,
    /// Chunks in order
    pub chunks: Vec<DecodedChunk>,
}

impl DecodedContainer {
    /// Total number of samples across chunks
    pub fn sample_count(&self) -> usize {
        self.chunks.iter().map(|c| c.samples.len()).sum()
    }
}

/// Parse and decode an entire container
pub fn decode(input: &[u8], config: &DecodeConfig) -> Result<DecodedContainer> {
    let container = Container::parse(input, config)?;
    let metadata = container.metadata(&config.codec)?;

    let chunks = container
        .chunks()?
        .into_iter()
        .map(|chunk| {
            Ok(DecodedChunk {
                index: chunk.index,
                byte_length: chunk.byte_length,
                sample_count: chunk.sample_count,
                samples: chunk.decode_all()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DecodedContainer {
        metadata_length: container.metadata_length,
        metadata,
        series_length: container.series.declared_length,
        chunks,
    })
}
