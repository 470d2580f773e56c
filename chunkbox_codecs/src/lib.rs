mod lz4_codec;
mod passthrough;
mod zstd_codec;

pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use zstd_codec::{ZstdCodec, DEFAULT_LEVEL};

use chunkbox_core::{Codec, Error};
use tracing::debug;

/// Codec used when none is named.
pub const DEFAULT_CODEC: &str = "lz4";

/// Resolve a codec from its CLI name.
///
/// The container does not record which codec wrote it, so the same name
/// (and, for zstd, any level) must be given to both passes.
pub fn codec_by_name(name: &str, zstd_level: i32) -> Result<Box<dyn Codec>, Error> {
    let codec: Box<dyn Codec> = match name {
        "lz4" | "l" => Box::new(Lz4Codec),
        "zstd" | "z" => Box::new(ZstdCodec::new(zstd_level)?),
        "passthrough" | "pass" | "none" => Box::new(PassThroughCodec),
        other => {
            return Err(Error::Usage(format!(
                "unknown codec '{other}'. Valid options: lz4, zstd, passthrough"
            )))
        }
    };
    debug!(codec = codec.name(), "codec initialized");
    Ok(codec)
}
