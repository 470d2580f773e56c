pub mod chunk;
pub mod codec;
pub mod error;
pub mod format;
pub mod reader;
pub mod roundtrip;
pub mod stats;
pub mod writer;

pub use chunk::ChunkReader;
pub use codec::{Codec, CodecError, CodecState, ScratchArena};
pub use error::{Error, Result};
pub use format::{FrameHeader, HeaderWidth, CHUNK_SIZE};
pub use reader::{decode_stream, FrameReader};
pub use roundtrip::{RoundTrip, RoundTripReport};
pub use stats::PipelineStats;
pub use writer::{encode_stream, FrameWriter};
