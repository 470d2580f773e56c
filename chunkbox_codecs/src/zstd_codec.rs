use chunkbox_core::codec::{Codec, CodecError, CodecState, ScratchArena};
use chunkbox_core::Error;
use zstd::bulk::Compressor;

/// Default Zstandard compression level.
pub const DEFAULT_LEVEL: i32 = 3;

/// Zstandard block codec.
///
/// Each block is compressed independently into the scratch arena at the
/// configured level. One compression context is created per encode pass and
/// kept in the arena; zstd resets it at the start of every block. Every payload is a complete zstd frame with its own
/// magic number, so damaged payloads are usually rejected outright.
///
/// Best for: text, logs, and structured data where ratio matters.
#[derive(Debug)]
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

impl ZstdCodec {
    /// Fails with [`Error::CodecInit`] when `level` is outside the range the
    /// linked zstd library supports.
    pub fn new(level: i32) -> Result<Self, Error> {
        let range = zstd::compression_level_range();
        if !range.contains(&level) {
            return Err(Error::CodecInit(format!(
                "zstd level {level} is outside {}..={}",
                range.start(),
                range.end()
            )));
        }
        Ok(Self { level })
    }
}

impl Codec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn scratch_len(&self, block_len: usize) -> usize {
        zstd::zstd_safe::compress_bound(block_len)
    }

    fn new_state(&self) -> Result<Option<CodecState>, CodecError> {
        let ctx = Compressor::new(self.level).map_err(|e| CodecError::new(self.name(), e))?;
        Ok(Some(Box::new(ctx)))
    }

    fn compress_block(&self, raw: &[u8], scratch: &mut ScratchArena) -> Result<usize, CodecError> {
        let (ctx, out) = scratch.split_mut::<Compressor<'static>>();
        let ctx = ctx.ok_or_else(|| {
            CodecError::new(self.name(), "scratch arena holds no zstd compression context")
        })?;
        ctx.compress_to_buffer(raw, out)
            .map_err(|e| CodecError::new(self.name(), e))
    }

    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
        zstd::bulk::decompress_to_buffer(compressed, out)
            .map_err(|e| CodecError::new(self.name(), e))
    }
}
