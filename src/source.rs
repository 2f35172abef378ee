//! Opening the input: plain files, gzip, zstd, or stdin.
//!
//! Compression is detected by file extension (.gz/.gzip → gzip, .zst/.zstd →
//! zstd). Decompression is streamed, so the chunk reader still sees bounded
//! reads.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, BufReader, Read};

/// Path that selects stdin instead of a file.
pub const STDIN_PATH: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".gz") || path.ends_with(".gzip") {
            Compression::Gzip
        } else if path.ends_with(".zst") || path.ends_with(".zstd") {
            Compression::Zstd
        } else {
            Compression::None
        }
    }
}

/// Open `path` for reading, decompressing on the fly when needed.
///
/// Fails if the path does not exist, is not a regular file, or cannot be
/// opened.
pub fn open(path: &str) -> Result<Box<dyn Read>> {
    if path == STDIN_PATH {
        return Ok(Box::new(io::stdin().lock()));
    }

    let file = File::open(path).with_context(|| format!("failed to open file: {path}"))?;
    let meta = file
        .metadata()
        .with_context(|| format!("failed to stat file: {path}"))?;
    if !meta.is_file() {
        bail!("not a regular file: {path}");
    }

    Ok(match Compression::from_path(path) {
        Compression::None => Box::new(file),
        Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(BufReader::new(file))),
        Compression::Zstd => Box::new(
            zstd::Decoder::new(file)
                .with_context(|| format!("failed to initialize zstd decoder for: {path}"))?,
        ),
    })
}
