//! Container assembly

use crate::compression::XorEncoder;
use crate::config::{SAMPLE_COUNT_BYTES, SECTION_LENGTH_BYTES};
use crate::metadata::{Lz4Codec, MetadataCodec};
use crate::{DecodeError, Result, Sample};
use bytes::{BufMut, Bytes, BytesMut};

/// Builder for a complete container
pub struct ContainerWriter {
    metadata_payload: Vec<u8>,
    chunks: Vec<Vec<u8>>,
}

impl ContainerWriter {
    /// Create a writer whose metadata is LZ4-compressed
    pub fn new(metadata: &[u8]) -> Self {
        Self::with_metadata_payload(Lz4Codec::compress(metadata))
    }

    /// Create a writer compressing `metadata` with `codec`
    pub fn with_codec(metadata: &[u8], codec: MetadataCodec) -> Result<Self> {
        Ok(Self::with_metadata_payload(codec.compress(metadata)?))
    }

    /// Create a writer with an already compressed metadata payload
    pub fn with_metadata_payload(payload: Vec<u8>) -> Self {
        Self {
            metadata_payload: payload,
            chunks: Vec::new(),
        }
    }

    /// Encode `samples` as the next chunk
    pub fn push_chunk(&mut self, samples: &[Sample]) -> Result<()> {
        if samples.len() > u16::MAX as usize {
            return Err(DecodeError::Framing(format!(
                "chunk of {} samples exceeds the u16 sample count",
                samples.len()
            )));
        }

        let mut encoder = XorEncoder::new();
        for sample in samples {
            encoder.encode(*sample);
        }
        let block = encoder.finish();

        let mut payload = Vec::with_capacity(SAMPLE_COUNT_BYTES + block.data.len());
        payload.put_u16(block.count as u16);
        payload.put_slice(&block.data);
        self.push_raw_chunk(payload)
    }

    /// Append a chunk payload that already starts with its sample count
    pub fn push_raw_chunk(&mut self, payload: Vec<u8>) -> Result<()> {
        if payload.len() > u16::MAX as usize {
            return Err(DecodeError::Framing(format!(
                "chunk payload of {} bytes exceeds the u16 chunk length",
                payload.len()
            )));
        }
        if self.chunks.len() == u16::MAX as usize {
            return Err(DecodeError::Framing("too many chunks for the u16 chunk count".into()));
        }
        self.chunks.push(payload);
        Ok(())
    }

    /// Number of chunks added so far
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if no chunk was added
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Serialize the container
    pub fn finish(self) -> Result<Bytes> {
        let metadata_length = u32::try_from(SECTION_LENGTH_BYTES + self.metadata_payload.len())
            .map_err(|_| DecodeError::Framing("metadata does not fit a u32 length".into()))?;

        let mut series = BytesMut::new();
        series.put_u16_le(self.chunks.len() as u16);
        for chunk in &self.chunks {
            series.put_u16_le(chunk.len() as u16);
            series.put_slice(chunk);
        }
        let series_length = u32::try_from(series.len())
            .map_err(|_| DecodeError::Framing("time series does not fit a u32 length".into()))?;

        let mut buf =
            BytesMut::with_capacity(metadata_length as usize + SECTION_LENGTH_BYTES + series.len());
        buf.put_u32(metadata_length);
        buf.put_slice(&self.metadata_payload);
        buf.put_u32(series_length);
        buf.put(series);

        Ok(buf.freeze())
    }
}
