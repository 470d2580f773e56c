use chunkbox_core::codec::{Codec, CodecError, ScratchArena};

/// No-op codec: "compresses" a block into an exact copy of itself.
///
/// Since the output is never smaller than the input, every frame written
/// with this codec is a raw frame. Useful for checking the container
/// independently of any real codec.
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn scratch_len(&self, block_len: usize) -> usize {
        block_len
    }

    fn compress_block(&self, raw: &[u8], scratch: &mut ScratchArena) -> Result<usize, CodecError> {
        let dst = scratch
            .as_mut_slice()
            .get_mut(..raw.len())
            .ok_or_else(|| CodecError::new(self.name(), "scratch arena smaller than block"))?;
        dst.copy_from_slice(raw);
        Ok(raw.len())
    }

    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
        let dst = out
            .get_mut(..compressed.len())
            .ok_or_else(|| CodecError::new(self.name(), "payload larger than output buffer"))?;
        dst.copy_from_slice(compressed);
        Ok(compressed.len())
    }
}
