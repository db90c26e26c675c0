//! Metadata block codecs
//!
//! The metadata section is an opaque compressed blob. Decoding only needs a
//! byte-to-byte decompressor, so the codec is pluggable. Containers written by
//! the chunk store carry a snappy framed stream.

use crate::{DecodeError, Result};
use bytes::Buf;
use std::borrow::Cow;
use std::io::{Read, Write};

/// Byte-oriented decompressor for the metadata block
pub trait Decompressor {
    /// Restore the original bytes of `payload`
    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// LZ4 block with a little-endian u32 uncompressed size in front
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Codec;

/// Snappy framed stream (stream identifier followed by framed chunks)
#[derive(Debug, Clone, Copy, Default)]
pub struct SnappyCodec;

/// Metadata stored without compression
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

/// Upper bound on the LZ4 expansion ratio
const LZ4_MAX_RATIO: usize = 255;

impl Lz4Codec {
    /// Compress `data` in the size-prepended block format
    pub fn compress(data: &[u8]) -> Vec<u8> {
        lz4_flex::compress_prepend_size(data)
    }
}

impl Decompressor for Lz4Codec {
    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.is_empty() {
            return Ok(Vec::new());
        }
        if payload.len() < 4 {
            return Err(DecodeError::Decompression(format!(
                "LZ4 size prefix needs 4 bytes, got {}",
                payload.len()
            )));
        }

        let mut prefix = &payload[..4];
        let declared = prefix.get_u32_le() as usize;
        if declared == 0 {
            return Ok(Vec::new());
        }
        let block_len = payload.len() - 4;
        if declared > block_len.saturating_mul(LZ4_MAX_RATIO) + 16 {
            return Err(DecodeError::Decompression(format!(
                "LZ4 block of {} bytes cannot expand to {} bytes",
                block_len, declared
            )));
        }

        lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| DecodeError::Decompression(e.to_string()))
    }
}

impl SnappyCodec {
    /// Compress `data` into a snappy framed stream
    pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = snap::write::FrameEncoder::new(Vec::new());
        encoder.write_all(data)?;
        encoder
            .into_inner()
            .map_err(|e| DecodeError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

impl Decompressor for SnappyCodec {
    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        snap::read::FrameDecoder::new(payload)
            .read_to_end(&mut out)
            .map_err(|e| DecodeError::Decompression(format!("snappy stream: {}", e)))?;
        Ok(out)
    }
}

impl Decompressor for IdentityCodec {
    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(payload.to_vec())
    }
}

/// Codec selector carried in [`DecodeConfig`](crate::config::DecodeConfig)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataCodec {
    /// Size-prepended LZ4 block
    #[default]
    Lz4,
    /// Snappy framed stream
    Snappy,
    /// Uncompressed
    Identity,
}

impl MetadataCodec {
    /// Compress `data` so that this codec restores it
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            MetadataCodec::Lz4 => Ok(Lz4Codec::compress(data)),
            MetadataCodec::Snappy => SnappyCodec::compress(data),
            MetadataCodec::Identity => Ok(data.to_vec()),
        }
    }
}

impl Decompressor for MetadataCodec {
    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            MetadataCodec::Lz4 => Lz4Codec.decompress(payload),
            MetadataCodec::Snappy => SnappyCodec.decompress(payload),
            MetadataCodec::Identity => IdentityCodec.decompress(payload),
        }
    }
}

/// Decompressed metadata
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    bytes: Vec<u8>,
}

impl Metadata {
    /// Decompress `payload` with `codec`
    pub fn decode(payload: &[u8], codec: &dyn Decompressor) -> Result<Self> {
        Ok(Self {
            bytes: codec.decompress(payload)?,
        })
    }

    /// Raw decompressed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Metadata as text; invalid UTF-8 is replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Metadata parsed as JSON, when it is JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.bytes).ok()
    }

    /// Decompressed length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lz4_roundtrip() {
        let text = br#"{"fingerprint":42,"metric":{"__name__":"up","job":"node"}}"#;
        let payload = Lz4Codec::compress(text);
        let metadata = Metadata::decode(&payload, &Lz4Codec).unwrap();
        assert_eq!(metadata.as_bytes(), text);
        assert_eq!(metadata.json().unwrap()["fingerprint"], 42);
    }

    #[test]
    fn test_zero_size_prefix_is_empty() {
        let metadata = Metadata::decode(&[0, 0, 0, 0], &Lz4Codec).unwrap();
        assert!(metadata.is_empty());
        assert_eq!(metadata.text(), "");

        let payload = Lz4Codec::compress(b"");
        assert!(Lz4Codec.decompress(&payload).unwrap().is_empty());
    }

    #[test]
    fn test_empty_payload_is_empty() {
        assert!(MetadataCodec::Lz4.decompress(&[]).unwrap().is_empty());
        assert!(MetadataCodec::Snappy.decompress(&[]).unwrap().is_empty());
        assert!(MetadataCodec::Identity.decompress(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_short_prefix_fails() {
        let err = Lz4Codec.decompress(&[1, 0]).unwrap_err();
        assert!(matches!(err, DecodeError::Decompression(_)));
    }

    #[test]
    fn test_implausible_size_fails() {
        let err = Lz4Codec.decompress(&[0xFF, 0xFF, 0xFF, 0x7F, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::Decompression(_)));
    }

    #[test]
    fn test_corrupt_block_fails() {
        let mut payload = Lz4Codec::compress(b"hello hello hello hello hello");
        let last = payload.len() - 1;
        payload.truncate(last - 2);
        assert!(Lz4Codec.decompress(&payload).is_err());
    }

    #[test]
    fn test_identity_and_lossy_text() {
        let metadata = Metadata::decode(&[b'o', b'k', 0xFF], &MetadataCodec::Identity).unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata.text(), "ok\u{FFFD}");
        assert!(metadata.json().is_none());
    }

    #[test]
    fn test_snappy_roundtrip() {
        let text = br#"{"fingerprint":7,"metric":{"__name__":"node_load1"}}"#;
        let payload = MetadataCodec::Snappy.compress(text).unwrap();
        assert_eq!(&payload[..10], b"\xff\x06\x00\x00sNaPpY");

        let metadata = Metadata::decode(&payload, &MetadataCodec::Snappy).unwrap();
        assert_eq!(metadata.as_bytes(), text);
        assert_eq!(metadata.json().unwrap()["fingerprint"], 7);
    }

    #[test]
    fn test_snappy_hand_built_frame() {
        let text = br#"{"fingerprint":1,"metric":{"job":"node"}}"#;
        let checksum = masked_crc32c(text);

        // stream identifier, then one uncompressed chunk: type, 3-byte LE length, CRC, data
        let mut payload = vec![0xFF, 0x06, 0x00, 0x00];
        payload.extend_from_slice(b"sNaPpY");
        let chunk_len = 4 + text.len();
        payload.push(0x01);
        payload.extend_from_slice(&(chunk_len as u32).to_le_bytes()[..3]);
        payload.extend_from_slice(&checksum.to_le_bytes());
        payload.extend_from_slice(text);

        let metadata = Metadata::decode(&payload, &SnappyCodec).unwrap();
        assert_eq!(metadata.as_bytes(), text);
        assert_eq!(metadata.json().unwrap()["metric"]["job"], "node");
    }

    #[test]
    fn test_snappy_corrupt_stream_fails() {
        let err = SnappyCodec.decompress(b"not a snappy stream").unwrap_err();
        assert!(matches!(err, DecodeError::Decompression(_)));
    }

    /// CRC-32C of `data`, masked the way snappy frames store it
    fn masked_crc32c(data: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &byte in data {
            crc ^= byte as u32;
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0x82F6_3B78 & mask);
            }
        }
        let crc = !crc;
        ((crc >> 15) | (crc << 17)).wrapping_add(0xA282_EAD8)
    }
}
