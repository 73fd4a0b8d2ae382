use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    ProtobufError(#[from] prost::DecodeError),

    #[error(transparent)]
    Utf8Error(#[from] std::str::Utf8Error),

    // The length of the BlobHeader [..] must be less than 64 KiB.
    // https://wiki.openstreetmap.org/wiki/PBF_Format
    #[error("Invalid Format: The size of the `BlobHeader` is to large")]
    BlobHeaderToLarge,

    // The uncompressed length of a Blob [..] must be less than 32 MiB.
    // https://wiki.openstreetmap.org/wiki/PBF_Format
    #[error("Invalid Format: The size of the `Blob` is to large")]
    BlobDataToLarge,

    #[error("The encoding of the Blob is not supported")]
    UnsupportedEncoding,

    #[error("Unexpected Blob-Type {0}")]
    UnexpectedBlobType(String),

    #[error("Unsupported required feature `{0}`")]
    UnsupportedFeature(String),

    #[error("Malformed block: {0}")]
    MalformedBlock(&'static str),

    #[error("Malformed block: string index {0} is out of range")]
    StringIndexOutOfRange(usize),

    #[error("Malformed block: unknown relation member type {0}")]
    UnknownMemberType(i32),

    #[error("Coordinate {0} can not be represented at the block granularity")]
    CoordinateOutOfRange(f64),

    #[error("Delta coded value overflows 64 bit")]
    DeltaOverflow,

    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    #[error("The pipeline has been closed")]
    PipelineClosed,

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("The unit of work was dropped before it produced a result")]
    TaskLost,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<std::io::ErrorKind> for Error {
    #[inline(always)]
    fn from(kind: std::io::ErrorKind) -> Self {
        Error::IoError(kind.into())
    }
}
