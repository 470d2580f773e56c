/// Per-pass counters. Used for reporting only; nothing in the format depends on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Blocks (equivalently frames) processed so far.
    pub blocks: u64,
    /// Frames whose payload is the codec output.
    pub compressed_frames: u64,
    /// Frames whose payload is the original block.
    pub raw_frames: u64,
    /// Uncompressed block bytes.
    pub raw_bytes: u64,
    /// Container bytes: headers plus payloads.
    pub container_bytes: u64,
}

impl PipelineStats {
    /// Compression ratio (raw / container).
    pub fn ratio(&self) -> f64 {
        if self.container_bytes == 0 {
            return 1.0;
        }
        self.raw_bytes as f64 / self.container_bytes as f64
    }

    pub(crate) fn record(&mut self, raw: bool, raw_len: usize, frame_len: usize) {
        self.blocks += 1;
        if raw {
            self.raw_frames += 1;
        } else {
            self.compressed_frames += 1;
        }
        self.raw_bytes += raw_len as u64;
        self.container_bytes += frame_len as u64;
    }
}
