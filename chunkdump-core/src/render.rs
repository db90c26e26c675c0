//! Human-readable dumps of a decoded container

use crate::container::DecodedContainer;
use crate::{DecodeError, Result};
use serde::Serialize;
use std::io::Write;

/// Output format for [`render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Indented plain text, one sample per line
    #[default]
    Text,
    /// A single pretty-printed JSON document
    Json,
}

/// Write `decoded` to `out` in the requested format
pub fn render<W: Write>(decoded: &DecodedContainer, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Text => render_text(decoded, out),
        OutputFormat::Json => render_json(decoded, out),
    }
}

fn render_text<W: Write>(decoded: &DecodedContainer, out: &mut W) -> Result<()> {
    writeln!(out, "Metadata size: {} bytes", decoded.metadata_length)?;
    let text = decoded.metadata.text();
    if !text.is_empty() {
        writeln!(out, "{}", text)?;
    }
    writeln!(out)?;

    writeln!(out, "Time series size is {} bytes", decoded.series_length)?;
    writeln!(out, "Number of chunks: {}", decoded.chunks.len())?;
    for chunk in &decoded.chunks {
        writeln!(out, "chunk {} size is {} bytes", chunk.index, chunk.byte_length)?;
        writeln!(out, "\tnumber of sample points: {}", chunk.sample_count)?;
        for sample in &chunk.samples {
            writeln!(out, "\t{}", sample)?;
        }
        writeln!(out)?;
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonContainer {
    metadata_length: u32,
    metadata: serde_json::Value,
    series_length: u32,
    chunks: Vec<JsonChunk>,
}

#[derive(Serialize)]
struct JsonChunk {
    index: usize,
    byte_length: u16,
    sample_count: u16,
    samples: Vec<JsonSample>,
}

#[derive(Serialize)]
struct JsonSample {
    timestamp: i64,
    time: Option<String>,
    value: f64,
}

fn render_json<W: Write>(decoded: &DecodedContainer, out: &mut W) -> Result<()> {
    let metadata = decoded
        .metadata
        .json()
        .unwrap_or_else(|| serde_json::Value::String(decoded.metadata.text().into_owned()));

    let document = JsonContainer {
        metadata_length: decoded.metadata_length,
        metadata,
        series_length: decoded.series_length,
        chunks: decoded
            .chunks
            .iter()
            .map(|chunk| JsonChunk {
                index: chunk.index,
                byte_length: chunk.byte_length,
                sample_count: chunk.sample_count,
                samples: chunk
                    .samples
                    .iter()
                    .map(|s| JsonSample {
                        timestamp: s.timestamp,
                        time: s.time().map(|_| s.rfc3339()),
                        value: s.value,
                    })
                    .collect(),
            })
            .collect(),
    };

    serde_json::to_writer_pretty(&mut *out, &document)
        .map_err(|e| DecodeError::InvalidFormat(e.to_string()))?;
    writeln!(out)?;
    Ok(())
}
