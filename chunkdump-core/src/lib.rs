//! chunkdump core - decoder for Gorilla-compressed time-series chunk containers
//!
//! A container holds a compressed metadata block followed by a time-series
//! section made of independently framed chunks. Each chunk stores its samples
//! with delta-of-delta timestamps and XOR-compressed values.
//!
//! # Architecture
//!
//! - **compression**: MSB-first bit reader/writer and the XOR sample codec
//! - **chunk**: chunk framing inside the time-series section
//! - **container**: splits the input into metadata and time-series sections
//! - **metadata**: pluggable decompressors for the metadata block
//! - **render**: text and JSON dumps of a decoded container
//! - **writer**: assembles containers, mainly for fixtures and benchmarks
//!
//! # Example
//!
//! ```
//! use chunkdump_core::{decode, ContainerWriter, DecodeConfig, Sample};
//!
//! let mut writer = ContainerWriter::new(b"{}");
//! writer.push_chunk(&[Sample::new(1_000, 1.0), Sample::new(2_000, 2.5)]).unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! let decoded = decode(&bytes, &DecodeConfig::default()).unwrap();
//! assert_eq!(decoded.chunks[0].samples[1].value, 2.5);
//! ```

pub mod chunk;
pub mod compression;
pub mod config;
pub mod container;
pub mod metadata;
pub mod render;
pub mod writer;

mod error;
mod types;

pub use chunk::{Chunk, TimeSeriesSection};
pub use config::{DecodeConfig, SectionLengthPolicy};
pub use container::{decode, Container, DecodedChunk, DecodedContainer};
pub use error::{DecodeError, Result};
pub use metadata::{Decompressor, Metadata, MetadataCodec};
pub use render::{render, OutputFormat};
pub use types::*;
pub use writer::ContainerWriter;

/// chunkdump version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
