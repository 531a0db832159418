use crate::header::MemoryOrder;

/// records are buffered up to roughly this many bytes before hitting the file
pub const DEFAULT_BUFFER_BYTES: usize = 256;

/// What sits on disk in the header region until the stream is closed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    /// everything after the version bytes is zeroed, an unfinished file
    /// has a zero dictionary length and will not load
    Zeroed,
    /// the rendered header for `u64::MAX` elements, an unfinished file
    /// loads but declares the maximum count
    MaxCount,
}

impl Default for Placeholder {
    fn default() -> Self {
        Placeholder::Zeroed
    }
}

/// Options fixed when a stream is opened
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// written as the `fortran_order` flag
    pub memory_order: MemoryOrder,
    /// size of the in-memory record buffer, at least one record is kept
    pub buffer_bytes: usize,
    /// header contents until close
    pub placeholder: Placeholder,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            memory_order: MemoryOrder::C,
            buffer_bytes: DEFAULT_BUFFER_BYTES,
            placeholder: Placeholder::Zeroed,
        }
    }
}
