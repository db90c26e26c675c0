//! chunkdump - dump the contents of a time-series chunk container

use anyhow::Context;
use chunkdump_core::{
    decode, render, DecodeConfig, MetadataCodec, OutputFormat, SectionLengthPolicy,
};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Decode a chunk container and print its metadata and samples
#[derive(Parser, Debug)]
#[command(name = "chunkdump", version, about)]
struct Cli {
    /// Input file; reads standard input when omitted
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Codec of the metadata block
    #[arg(long, value_enum, default_value_t = Codec::Snappy)]
    codec: Codec,

    /// Frame chunks past the declared time-series length
    #[arg(long)]
    lenient: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Codec {
    Snappy,
    Lz4,
    Identity,
}

impl Cli {
    fn decode_config(&self) -> DecodeConfig {
        let section_length = if self.lenient {
            SectionLengthPolicy::Ignore
        } else {
            SectionLengthPolicy::Enforce
        };
        let codec = match self.codec {
            Codec::Snappy => MetadataCodec::Snappy,
            Codec::Lz4 => MetadataCodec::Lz4,
            Codec::Identity => MetadataCodec::Identity,
        };
        DecodeConfig {
            section_length,
            codec,
        }
    }

    fn output_format(&self) -> OutputFormat {
        match self.format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }

    fn source_name(&self) -> String {
        match &self.file {
            Some(path) => path.display().to_string(),
            None => "standard input".to_string(),
        }
    }
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn read_input(file: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to open file {}", path.display()))
        }
        None => {
            let mut data = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut data)
                .context("failed to read standard input")?;
            Ok(data)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with the dump
    let filter = EnvFilter::builder()
        .with_default_directive(log_level(cli.verbose).into())
        .from_env_lossy();
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let input = read_input(cli.file.as_deref())?;
    info!("Read {} bytes from {}", input.len(), cli.source_name());

    let decoded = decode(&input, &cli.decode_config())
        .with_context(|| format!("failed to decode {}", cli.source_name()))?;
    info!(
        "Decoded {} chunks, {} samples",
        decoded.chunks.len(),
        decoded.sample_count()
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    render(&decoded, cli.output_format(), &mut out)?;
    out.flush()?;

    Ok(())
}
