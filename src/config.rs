use crate::data::coords::DEFAULT_GRANULARITY;

/// Default upper bound for the estimated size of an encoded block.
///
/// Half of the 32 MiB limit for uncompressed blobs, so that the encoder
/// estimates stay well inside the limit.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

/// Settings for [`crate::reader::ParallelReader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Number of decode workers.
    ///
    /// Default: `available_parallelism`
    pub threads: usize,

    /// Maximum number of blobs admitted for decoding at the same time.
    ///
    /// This bounds the memory held by blobs that were read but not yet
    /// decoded.
    ///
    /// Default: `threads * 2`
    pub max_in_flight: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        let threads = default_threads();
        Self {
            threads,
            max_in_flight: threads * 2,
        }
    }
}

impl ReaderOptions {
    #[inline]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    #[inline]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }
}

/// Payload encoding of written blobs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    /// zlib with the given level (`0..=9`).
    Zlib(u32),
}

impl Default for Compression {
    #[inline]
    fn default() -> Self {
        Self::Zlib(6)
    }
}

/// Settings for [`crate::writer::ParallelWriter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterOptions {
    /// Number of encode workers.
    ///
    /// Default: `available_parallelism`
    pub threads: usize,

    /// Maximum number of blocks being encoded at the same time.
    ///
    /// Default: `threads * 2`
    pub max_in_flight: usize,

    /// An encoder is flushed into a block once its size estimate reaches
    /// this many bytes.
    ///
    /// Default: [`DEFAULT_MAX_BLOCK_SIZE`]
    pub max_block_size: usize,

    pub compression: Compression,

    /// Coordinate granularity of written node blocks, in nanodegrees.
    ///
    /// Default: `100`
    pub granularity: i32,
}

impl Default for WriterOptions {
    fn default() -> Self {
        let threads = default_threads();
        Self {
            threads,
            max_in_flight: threads * 2,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            compression: Compression::default(),
            granularity: DEFAULT_GRANULARITY,
        }
    }
}

impl WriterOptions {
    #[inline]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    #[inline]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    #[inline]
    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    #[inline]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[inline]
    pub fn with_granularity(mut self, granularity: i32) -> Self {
        self.granularity = granularity;
        self
    }
}
