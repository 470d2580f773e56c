use std::io::{Read, Write};

use tracing::{debug, info, trace};

use crate::chunk::ChunkReader;
use crate::codec::{Codec, CodecError, ScratchArena};
use crate::error::{Error, Result};
use crate::format::{FrameHeader, HeaderWidth, CHUNK_SIZE};
use crate::stats::PipelineStats;

/// Frame encoder.
///
/// # Write contract
/// Call [`write_block`] once per block, in stream order. Each block is
/// compressed into the scratch arena and emitted as a single frame:
///
/// ```text
/// [HEADER: width bytes, LE]  top bit = raw flag, rest = payload length
/// [PAYLOAD: length bytes]    codec output, or the block itself when raw
/// ```
///
/// A block is stored raw whenever the codec output is not strictly shorter
/// than the block, so a frame is never larger than `width + block_len`.
///
/// [`write_block`]: FrameWriter::write_block
pub struct FrameWriter<'a, W> {
    out: W,
    codec: &'a dyn Codec,
    scratch: &'a mut ScratchArena,
    width: HeaderWidth,
    stats: PipelineStats,
}

impl<'a, W: Write> FrameWriter<'a, W> {
    pub fn new(
        out: W,
        codec: &'a dyn Codec,
        scratch: &'a mut ScratchArena,
        width: HeaderWidth,
    ) -> Self {
        Self {
            out,
            codec,
            scratch,
            width,
            stats: PipelineStats::default(),
        }
    }

    /// Compress `raw` and write it as one frame. Returns the header written.
    pub fn write_block(&mut self, raw: &[u8]) -> Result<FrameHeader> {
        let block = self.stats.blocks;
        if raw.len() > CHUNK_SIZE {
            return Err(Error::Usage(format!(
                "block of {} bytes exceeds the {CHUNK_SIZE}-byte chunk size",
                raw.len()
            )));
        }

        let compressed_len = self
            .codec
            .compress_block(raw, self.scratch)
            .map_err(|source| Error::Compression { block, source })?;
        if compressed_len > self.scratch.len() {
            let msg = format!(
                "reported {compressed_len} bytes into a {}-byte arena",
                self.scratch.len()
            );
            return Err(Error::Compression {
                block,
                source: CodecError::new(self.codec.name(), msg),
            });
        }

        // Ties go raw: equal size buys nothing and costs a decode.
        let (header, payload) = if compressed_len < raw.len() {
            (
                FrameHeader::Compressed(compressed_len as u32),
                &self.scratch.as_slice()[..compressed_len],
            )
        } else {
            debug!(block, len = raw.len(), "block is incompressible, storing raw");
            (FrameHeader::Raw(raw.len() as u32), raw)
        };

        let mut header_buf = [0u8; 8];
        let header_len = header.encode(self.width, &mut header_buf);
        write_all(&mut self.out, &header_buf[..header_len])?;
        write_all(&mut self.out, payload)?;

        self.stats
            .record(header.is_raw(), raw.len(), header_len + payload.len());
        trace!(
            block,
            raw_len = raw.len(),
            payload_len = payload.len(),
            raw = header.is_raw(),
            "frame written"
        );
        Ok(header)
    }

    /// Flush the underlying writer and return it with the final counters.
    pub fn finish(mut self) -> Result<(W, PipelineStats)> {
        self.out
            .flush()
            .map_err(|source| Error::ShortWrite { source })?;
        Ok((self.out, self.stats))
    }
}

pub(crate) fn write_all<W: Write + ?Sized>(out: &mut W, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes)
        .map_err(|source| Error::ShortWrite { source })
}

/// Encode pass: chunk `input` into blocks and write one frame per block to
/// `output` until the input is exhausted.
///
/// `scratch` must be at least `codec.scratch_len(CHUNK_SIZE)` bytes; it is
/// reused for every block.
pub fn encode_stream<R: Read, W: Write>(
    codec: &dyn Codec,
    width: HeaderWidth,
    scratch: &mut ScratchArena,
    input: R,
    output: W,
) -> Result<PipelineStats> {
    let mut chunks = ChunkReader::new(input);
    let mut writer = FrameWriter::new(output, codec, scratch, width);

    while let Some(block) = chunks.read_block()? {
        writer.write_block(block)?;
    }

    let (_, stats) = writer.finish()?;
    info!(
        codec = codec.name(),
        blocks = stats.blocks,
        raw_frames = stats.raw_frames,
        raw_bytes = stats.raw_bytes,
        container_bytes = stats.container_bytes,
        "encode pass complete"
    );
    Ok(stats)
}
