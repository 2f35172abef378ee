//! Chunked line reader.
//!
//! Reads fixed-size blocks from any `Read` and reassembles complete lines.
//! Bytes after the last newline of a block are carried into the next one, so
//! a line split by a block boundary is emitted exactly once, intact. Memory is
//! bounded by the chunk size plus the longest line, not by the input size.

use std::io::{self, Read};

use memchr::memchr;
use tracing::{trace, warn};

/// Default block size for reads.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Largest accepted block size. Larger requests are clamped.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Block size for reads, overridable with `TAXIQ_CHUNK_SIZE` (in kibibytes,
/// e.g. `TAXIQ_CHUNK_SIZE=1024` for 1 MiB blocks).
pub fn default_chunk_size() -> usize {
    if let Some(val) = std::env::var_os("TAXIQ_CHUNK_SIZE")
        && let Some(kib) = val.to_str().and_then(|s| s.parse::<usize>().ok())
        && kib > 0
    {
        let size = chunk_size_from_kib(kib);
        if size < kib.saturating_mul(1024) {
            warn!(requested_kib = kib, chunk_size = size, "TAXIQ_CHUNK_SIZE clamped");
        }
        return size;
    }
    DEFAULT_CHUNK_SIZE
}

fn chunk_size_from_kib(kib: usize) -> usize {
    kib.saturating_mul(1024).min(MAX_CHUNK_SIZE)
}

/// One line of input, without its terminating `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: Vec<u8>,
    /// True for trailing bytes at end of stream that had no newline.
    pub is_final_fragment: bool,
}

/// Lazy, single-use sequence of lines read in `chunk_size` blocks.
pub fn read_lines<R: Read>(reader: R, chunk_size: usize) -> ChunkLines<R> {
    ChunkLines::new(reader, chunk_size)
}

/// Iterator over the lines of a reader. See [`read_lines`].
///
/// A read error is yielded once; the iterator is fused afterwards.
pub struct ChunkLines<R> {
    reader: R,
    block: Vec<u8>,
    /// Carry-over plus the most recent block. `pending[start..]` is unconsumed.
    pending: Vec<u8>,
    start: usize,
    /// `pending[start..scanned]` is known to contain no newline.
    scanned: usize,
    eof: bool,
    failed: bool,
    chunks_read: u64,
}

impl<R: Read> ChunkLines<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            block: vec![0u8; chunk_size.clamp(1, MAX_CHUNK_SIZE)],
            pending: Vec::new(),
            start: 0,
            scanned: 0,
            eof: false,
            failed: false,
            chunks_read: 0,
        }
    }

    /// Drop consumed bytes and append the next block. Returns bytes read.
    fn refill(&mut self) -> io::Result<usize> {
        self.pending.drain(..self.start);
        self.scanned -= self.start;
        self.start = 0;

        let n = read_fully(&mut self.reader, &mut self.block)?;
        if n < self.block.len() {
            self.eof = true;
        }
        if n > 0 {
            self.chunks_read += 1;
            self.pending.extend_from_slice(&self.block[..n]);
            trace!(
                chunk = self.chunks_read,
                bytes = n,
                carried = self.scanned,
                "read chunk"
            );
        }
        Ok(n)
    }
}

impl<R: Read> Iterator for ChunkLines<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(offset) = memchr(b'\n', &self.pending[self.scanned..]) {
                let end = self.scanned + offset;
                let text = self.pending[self.start..end].to_vec();
                self.start = end + 1;
                self.scanned = self.start;
                return Some(Ok(Line {
                    text,
                    is_final_fragment: false,
                }));
            }
            self.scanned = self.pending.len();

            if self.eof {
                if self.start < self.pending.len() {
                    let text = self.pending[self.start..].to_vec();
                    self.start = self.pending.len();
                    self.scanned = self.start;
                    return Some(Ok(Line {
                        text,
                        is_final_fragment: true,
                    }));
                }
                return None;
            }

            if let Err(e) = self.refill() {
                self.failed = true;
                return Some(Err(e));
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for ChunkLines<R> {}

/// Read until `buf` is full or EOF, handling short reads and EINTR.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
