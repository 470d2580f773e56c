use chunkbox_core::codec::{Codec, CodecError, ScratchArena};
use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};

/// LZ4 block codec.
///
/// Raw LZ4 blocks with no size prefix: the frame header already carries the
/// payload length, and the decoder bounds the output at one chunk.
///
/// Best for: fast round trips where decode speed matters more than ratio.
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn scratch_len(&self, block_len: usize) -> usize {
        get_maximum_output_size(block_len)
    }

    // lz4_flex builds its 16 KiB hash table inside every `compress_into` call
    // and has no way to hand it a caller-owned one, so there is no state to
    // keep in the arena.
    fn compress_block(&self, raw: &[u8], scratch: &mut ScratchArena) -> Result<usize, CodecError> {
        compress_into(raw, scratch.as_mut_slice()).map_err(|e| CodecError::new(self.name(), e))
    }

    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
        decompress_into(compressed, out).map_err(|e| CodecError::new(self.name(), e))
    }
}
