/// Maximum raw bytes per block. Every block except the last one is exactly
/// this long; the last block may be shorter.
pub const CHUNK_SIZE: usize = 64 * 1024;

// ── Header width ───────────────────────────────────────────────────────────

/// Width of the per-frame length header.
///
/// The container has no file header, so the width is not self-describing:
/// the decoder must be configured with the same width the encoder used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderWidth {
    /// 4-byte header, 31 bits of length.
    W32,
    /// 8-byte header, 63 bits of length.
    W64,
}

impl HeaderWidth {
    /// The host's machine word width.
    pub fn native() -> Self {
        if std::mem::size_of::<usize>() >= 8 {
            HeaderWidth::W64
        } else {
            HeaderWidth::W32
        }
    }

    /// Parse a width given in bytes (4 or 8).
    pub fn from_bytes(n: usize) -> Option<Self> {
        match n {
            4 => Some(HeaderWidth::W32),
            8 => Some(HeaderWidth::W64),
            _ => None,
        }
    }

    /// Serialized header size in bytes.
    #[inline]
    pub fn size(self) -> usize {
        match self {
            HeaderWidth::W32 => 4,
            HeaderWidth::W64 => 8,
        }
    }

    #[inline]
    fn flag_bit(self) -> u64 {
        1 << (self.size() * 8 - 1)
    }

    /// Largest payload length the header can express with the flag bit reserved.
    #[inline]
    pub fn max_len(self) -> u64 {
        self.flag_bit() - 1
    }
}

impl Default for HeaderWidth {
    fn default() -> Self {
        Self::native()
    }
}

impl std::fmt::Display for HeaderWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-byte", self.size())
    }
}

// ── Frame header ───────────────────────────────────────────────────────────

/// Decoded representation of a frame header.
///
/// On disk the two variants share one integer: the top bit is the raw flag
/// and the remaining bits hold the payload length. Only [`encode`] and
/// [`decode`] know about that packing.
///
/// [`encode`]: FrameHeader::encode
/// [`decode`]: FrameHeader::decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHeader {
    /// Payload holds codec output of the given length.
    Compressed(u32),
    /// Payload holds the original block bytes verbatim.
    Raw(u32),
}

impl FrameHeader {
    /// Exact number of payload bytes following the header.
    #[inline]
    pub fn payload_len(&self) -> usize {
        match *self {
            FrameHeader::Compressed(n) | FrameHeader::Raw(n) => n as usize,
        }
    }

    #[inline]
    pub fn is_raw(&self) -> bool {
        matches!(self, FrameHeader::Raw(_))
    }

    /// Serialize into `buf[..width.size()]`, little-endian.
    pub fn encode(&self, width: HeaderWidth, buf: &mut [u8; 8]) -> usize {
        let mut word = self.payload_len() as u64;
        if self.is_raw() {
            word |= width.flag_bit();
        }
        let n = width.size();
        buf[..n].copy_from_slice(&word.to_le_bytes()[..n]);
        n
    }

    /// Parse a header from exactly `width.size()` bytes.
    ///
    /// Returns `None` when the length field does not fit a block-sized `u32`;
    /// such a header cannot have been produced by the encoder.
    pub fn decode(width: HeaderWidth, buf: &[u8]) -> Option<Self> {
        let n = width.size();
        let mut word = [0u8; 8];
        word[..n].copy_from_slice(&buf[..n]);
        let word = u64::from_le_bytes(word);

        let raw = word & width.flag_bit() != 0;
        let len = u32::try_from(word & width.max_len()).ok()?;
        Some(if raw {
            FrameHeader::Raw(len)
        } else {
            FrameHeader::Compressed(len)
        })
    }
}
