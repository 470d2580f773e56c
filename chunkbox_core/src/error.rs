use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the container can report.
///
/// None of these are recoverable within a pipeline run: the first error
/// aborts the pass and is handed back to the caller, which decides the
/// process exit status through [`Error::exit_code`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("usage: {0}")]
    Usage(String),

    #[error("cannot open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot close {}", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("write failed")]
    ShortWrite {
        #[source]
        source: io::Error,
    },

    #[error("read failed")]
    Io(#[from] io::Error),

    #[error("codec initialization failed: {0}")]
    CodecInit(String),

    /// The codec refused a well-formed block. Its contract says this cannot
    /// happen, so it is reported as an internal error.
    #[error("internal error: compression of block {block} failed")]
    Compression {
        block: u64,
        #[source]
        source: CodecError,
    },

    #[error("frame {frame} is corrupt: {reason}")]
    CorruptFrame { frame: u64, reason: String },

    #[error("stream truncated in frame {frame}: expected {expected} bytes, got {actual}")]
    TruncatedStream {
        frame: u64,
        expected: usize,
        actual: usize,
    },

    #[error("reconstruction differs from input at byte {offset}")]
    Mismatch { offset: u64 },
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Compression { .. } => 2,
            Error::CodecInit(_) => 3,
            _ => 1,
        }
    }
}
