use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::error;

/// Failure reported by a codec adapter.
#[derive(Debug, Error)]
#[error("{codec}: {message}")]
pub struct CodecError {
    pub codec: &'static str,
    pub message: String,
}

impl CodecError {
    pub fn new(codec: &'static str, err: impl fmt::Display) -> Self {
        Self {
            codec,
            message: err.to_string(),
        }
    }
}

/// Per-pass codec state kept in the arena, such as a compression context.
pub type CodecState = Box<dyn Any + Send>;

/// Reusable compression working memory.
///
/// Built once per encode pass by [`ScratchArena::for_codec`] and handed to
/// every [`Codec::compress_block`] call of that pass. It holds the output
/// buffer the codec writes into and whatever state the codec asked for in
/// [`Codec::new_state`], so neither is rebuilt per block.
pub struct ScratchArena {
    buf: Vec<u8>,
    state: Option<CodecState>,
}

impl ScratchArena {
    /// Allocate an arena large enough for `codec` to compress blocks of up to
    /// `max_block` bytes, and set up the codec's per-pass state.
    ///
    /// Fails with [`error::Error::CodecInit`] when the codec cannot build its state.
    pub fn for_codec(codec: &dyn Codec, max_block: usize) -> error::Result<Self> {
        let state = codec
            .new_state()
            .map_err(|e| error::Error::CodecInit(e.to_string()))?;
        Ok(Self {
            buf: vec![0u8; codec.scratch_len(max_block)],
            state,
        })
    }

    /// A bare output buffer with no codec state.
    pub fn with_capacity(len: usize) -> Self {
        Self {
            buf: vec![0u8; len],
            state: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Borrow the codec state as `T` together with the output buffer.
    ///
    /// The state is `None` if the arena was built without state or for a
    /// codec whose state has a different type.
    pub fn split_mut<T: 'static>(&mut self) -> (Option<&mut T>, &mut [u8]) {
        let state = self.state.as_mut().and_then(|s| s.downcast_mut::<T>());
        (state, &mut self.buf)
    }
}

/// Block compression primitive used by the container.
///
/// The container treats the codec as a black box. Implementations:
/// - Compress and decompress blocks independently. The only thing shared
///   between calls is the [`ScratchArena`] and the state it holds, which
///   never carries data from one block into the next.
/// - Never fail to compress a well-formed block as long as the arena is at
///   least `scratch_len(raw.len())` bytes.
/// - Fail to decompress when the payload is not a valid encoding, or when it
///   would produce more than `out.len()` bytes.
pub trait Codec: Send + Sync {
    /// Human-readable codec name for CLI display and logs.
    fn name(&self) -> &'static str;

    /// Working memory, in bytes, needed to compress a block of `block_len` bytes.
    fn scratch_len(&self, block_len: usize) -> usize;

    /// State to build once per encode pass and store in the arena.
    fn new_state(&self) -> Result<Option<CodecState>, CodecError> {
        Ok(None)
    }

    /// Compress `raw` into the front of `scratch`, returning the compressed length.
    fn compress_block(&self, raw: &[u8], scratch: &mut ScratchArena) -> Result<usize, CodecError>;

    /// Decompress `compressed` into the front of `out`, returning the decoded length.
    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> Result<usize, CodecError>;
}
