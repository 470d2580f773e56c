use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::info;

use crate::chunk::ChunkReader;
use crate::codec::{Codec, ScratchArena};
use crate::error::{Error, Result};
use crate::format::{HeaderWidth, CHUNK_SIZE};
use crate::reader::decode_stream;
use crate::stats::PipelineStats;
use crate::writer::encode_stream;

/// Self-test: encode a file into a container, then decode the container
/// into a reconstruction file.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub input: PathBuf,
    pub container: PathBuf,
    pub restored: PathBuf,
    pub width: HeaderWidth,
}

/// Block counts and wall-clock time of both passes.
#[derive(Debug, Clone, Copy)]
pub struct RoundTripReport {
    pub encoded: PipelineStats,
    pub decoded: PipelineStats,
    pub encode_time: Duration,
    pub decode_time: Duration,
}

impl RoundTrip {
    /// Run the encode pass followed by the decode pass.
    ///
    /// Every file is closed (flushed and synced) before the next pass starts,
    /// so the decode pass only ever sees what actually reached the disk.
    pub fn run(&self, codec: &dyn Codec) -> Result<RoundTripReport> {
        let t0 = Instant::now();
        let mut scratch = ScratchArena::for_codec(codec, CHUNK_SIZE)?;
        let input = open(&self.input)?;
        let mut container = BufWriter::new(create(&self.container)?);
        let encoded = encode_stream(codec, self.width, &mut scratch, input, &mut container)?;
        close(container, &self.container)?;
        let encode_time = t0.elapsed();

        let t0 = Instant::now();
        let container = BufReader::new(open(&self.container)?);
        let mut restored = BufWriter::new(create(&self.restored)?);
        let decoded = decode_stream(codec, self.width, container, &mut restored)?;
        close(restored, &self.restored)?;
        let decode_time = t0.elapsed();

        info!(
            encoded = encoded.blocks,
            decoded = decoded.blocks,
            encode_ms = encode_time.as_millis() as u64,
            decode_ms = decode_time.as_millis() as u64,
            "round trip complete"
        );
        Ok(RoundTripReport {
            encoded,
            decoded,
            encode_time,
            decode_time,
        })
    }

    /// Compare the reconstruction with the original input byte for byte.
    pub fn verify(&self) -> Result<()> {
        let mut original = ChunkReader::new(open(&self.input)?);
        let mut restored = ChunkReader::new(open(&self.restored)?);
        let mut offset = 0u64;

        loop {
            let a = original.read_block()?;
            let b = restored.read_block()?;
            match (a, b) {
                (None, None) => return Ok(()),
                (Some(a), Some(b)) if a == b => offset += a.len() as u64,
                (Some(a), Some(b)) => {
                    let at = a
                        .iter()
                        .zip(b)
                        .position(|(x, y)| x != y)
                        .unwrap_or_else(|| a.len().min(b.len()));
                    return Err(Error::Mismatch {
                        offset: offset + at as u64,
                    });
                }
                _ => return Err(Error::Mismatch { offset }),
            }
        }
    }
}

/// Open an existing file for reading.
pub fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Create (or truncate) a file for writing.
pub fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Flush buffered data and sync the file to disk.
pub fn close(mut file: BufWriter<File>, path: &Path) -> Result<()> {
    let to_close_err = |source| Error::Close {
        path: path.to_path_buf(),
        source,
    };
    file.flush().map_err(to_close_err)?;
    let file = file.into_inner().map_err(|e| to_close_err(e.into_error()))?;
    file.sync_all().map_err(to_close_err)
}
