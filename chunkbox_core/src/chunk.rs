use std::io::{self, ErrorKind, Read};

use crate::error::Result;
use crate::format::CHUNK_SIZE;

/// Pulls fixed-size blocks out of a byte stream.
///
/// Each call to [`read_block`] fills an internal `CHUNK_SIZE` buffer,
/// retrying short reads, so only the final block of a stream can be shorter
/// than `CHUNK_SIZE`. The buffer is allocated once and reused.
///
/// [`read_block`]: ChunkReader::read_block
pub struct ChunkReader<R> {
    inner: R,
    buf: Box<[u8]>,
    done: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_block_size(inner, CHUNK_SIZE)
    }

    fn with_block_size(inner: R, block_size: usize) -> Self {
        Self {
            inner,
            buf: vec![0u8; block_size].into_boxed_slice(),
            done: false,
        }
    }

    /// Read the next block, or `None` once the stream yields no more bytes.
    pub fn read_block(&mut self) -> Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }

        let filled = fill(&mut self.inner, &mut self.buf)?;
        if filled < self.buf.len() {
            self.done = true;
        }

        if filled == 0 {
            return Ok(None);
        }
        Ok(Some(&self.buf[..filled]))
    }
}

/// Read until `buf` is full or the source reports end of stream.
///
/// Returns the number of bytes read; anything less than `buf.len()` means
/// the stream ended. Interrupted reads are retried.
pub(crate) fn fill<R: Read + ?Sized>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
