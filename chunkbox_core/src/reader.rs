use std::io::{self, Read, Write};

use tracing::{info, trace};

use crate::chunk::fill;
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::format::{FrameHeader, HeaderWidth, CHUNK_SIZE};
use crate::stats::PipelineStats;
use crate::writer::write_all;

/// Sequential frame decoder.
///
/// # Read sequence
/// 1. Read `width` header bytes. Zero bytes here is the normal end of the
///    container; any other short read is a truncated stream.
/// 2. Split the header into flag and length and sanity-check the length.
/// 3. Read exactly `length` payload bytes.
/// 4. Raw frames are returned as-is; compressed frames go through the codec
///    into a `CHUNK_SIZE` output buffer.
///
/// Both buffers are owned by the reader and reused for every frame.
pub struct FrameReader<'a, R> {
    inner: R,
    codec: &'a dyn Codec,
    width: HeaderWidth,
    payload: Box<[u8]>,
    block: Box<[u8]>,
    stats: PipelineStats,
}

impl<'a, R: Read> FrameReader<'a, R> {
    pub fn new(inner: R, codec: &'a dyn Codec, width: HeaderWidth) -> Self {
        Self {
            inner,
            codec,
            width,
            payload: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
            block: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
            stats: PipelineStats::default(),
        }
    }

    /// Decode the next frame and return the reconstructed block, or `None` at
    /// a clean end of stream.
    pub fn read_frame(&mut self) -> Result<Option<&[u8]>> {
        let frame = self.stats.blocks;
        let Some(header) = self.read_header()? else {
            return Ok(None);
        };

        let len = header.payload_len();
        let got = fill(&mut self.inner, &mut self.payload[..len])?;
        if got < len {
            return Err(Error::TruncatedStream {
                frame,
                expected: len,
                actual: got,
            });
        }
        let frame_len = self.width.size() + len;

        let block = match header {
            FrameHeader::Raw(_) => &self.payload[..len],
            FrameHeader::Compressed(_) => {
                let decoded = self
                    .codec
                    .decompress_block(&self.payload[..len], &mut self.block)
                    .map_err(|e| Error::CorruptFrame {
                        frame,
                        reason: e.to_string(),
                    })?;
                // The encoder only emits compressed frames that are strictly
                // smaller than their block.
                if decoded <= len {
                    return Err(Error::CorruptFrame {
                        frame,
                        reason: format!(
                            "{len}-byte compressed payload decoded to only {decoded} bytes"
                        ),
                    });
                }
                &self.block[..decoded]
            }
        };

        self.stats.record(header.is_raw(), block.len(), frame_len);
        trace!(
            frame,
            payload_len = len,
            raw_len = block.len(),
            raw = header.is_raw(),
            "frame decoded"
        );
        Ok(Some(block))
    }

    /// Read the next header and skip its payload without decoding it.
    ///
    /// Only raw frames contribute to `raw_bytes` in the stats, since the
    /// decoded size of a compressed frame is not known without decoding it.
    pub fn next_header(&mut self) -> Result<Option<FrameHeader>> {
        let frame = self.stats.blocks;
        let Some(header) = self.read_header()? else {
            return Ok(None);
        };

        let len = header.payload_len();
        let skipped = io::copy(&mut (&mut self.inner).take(len as u64), &mut io::sink())?;
        if skipped < len as u64 {
            return Err(Error::TruncatedStream {
                frame,
                expected: len,
                actual: skipped as usize,
            });
        }

        let raw_len = if header.is_raw() { len } else { 0 };
        self.stats
            .record(header.is_raw(), raw_len, self.width.size() + len);
        Ok(Some(header))
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    fn read_header(&mut self) -> Result<Option<FrameHeader>> {
        let frame = self.stats.blocks;
        let n = self.width.size();
        let mut buf = [0u8; 8];
        let got = fill(&mut self.inner, &mut buf[..n])?;
        if got == 0 {
            return Ok(None);
        }
        if got < n {
            return Err(Error::TruncatedStream {
                frame,
                expected: n,
                actual: got,
            });
        }

        let corrupt = |reason: String| Error::CorruptFrame { frame, reason };
        let header = FrameHeader::decode(self.width, &buf[..n])
            .ok_or_else(|| corrupt("length field out of range".to_string()))?;
        match header {
            FrameHeader::Raw(len) if len as usize > CHUNK_SIZE => Err(corrupt(format!(
                "raw payload of {len} bytes exceeds the {CHUNK_SIZE}-byte chunk size"
            ))),
            FrameHeader::Compressed(len) if len as usize >= CHUNK_SIZE => Err(corrupt(format!(
                "compressed payload of {len} bytes is not smaller than a chunk"
            ))),
            _ => Ok(Some(header)),
        }
    }
}

/// Decode pass: read frames from `input` until a clean end of stream and
/// write the reconstructed blocks to `output`.
pub fn decode_stream<R: Read, W: Write>(
    codec: &dyn Codec,
    width: HeaderWidth,
    input: R,
    mut output: W,
) -> Result<PipelineStats> {
    let mut reader = FrameReader::new(input, codec, width);
    while let Some(block) = reader.read_frame()? {
        write_all(&mut output, block)?;
    }
    output
        .flush()
        .map_err(|source| Error::ShortWrite { source })?;

    let stats = reader.stats();
    info!(
        codec = codec.name(),
        blocks = stats.blocks,
        raw_frames = stats.raw_frames,
        raw_bytes = stats.raw_bytes,
        "decode pass complete"
    );
    Ok(stats)
}
