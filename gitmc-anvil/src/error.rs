//! Error type for the region-file reader and writer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnvilError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("chunk coordinate out of range: x = {0}, z = {1}")]
    InvalidOffset(i32, i32),

    #[error("region file name {0:?} is not of the form r.<x>.<z>.mca")]
    MalformedFilename(String),

    #[error("region file is too small to hold a header: {0} bytes")]
    TruncatedHeader(u64),

    #[error("region file length {0} is not a multiple of the 4096-byte sector size")]
    Unpadded(u64),

    #[error("no chunk present at the requested coordinate")]
    ChunkNotFound,

    #[error("chunk location table entry points outside the file (sector {0})")]
    IllegalSectorRange(u32),

    #[error("unrecognized compression scheme byte {0}")]
    UnknownCompression(u8),

    #[error("compression backend {0:?} is not registered")]
    UnregisteredCompression(String),

    #[error("chunk payload ({0} bytes) exceeds the 1,048,576-byte in-file limit and the active spill policy forbids an external .mcc file")]
    OversizedChunk(usize),

    #[error("external chunk file {0:?} was expected but is missing")]
    MissingExternalChunk(String),

    #[error(transparent)]
    Nbt(#[from] gitmc_nbt::NbtError),
}

pub type Result<T> = std::result::Result<T, AnvilError>;

/// A non-fatal finding surfaced by [`crate::region::RegionReader::validate`]:
/// something unusual but not fatal to extraction (e.g. two chunks whose
/// declared sector ranges overlap).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    OverlappingSectors { first: (i32, i32), second: (i32, i32) },
    TimestampZero { x: i32, z: i32 },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::OverlappingSectors { first, second } => write!(
                f,
                "chunks {first:?} and {second:?} claim overlapping sectors"
            ),
            ValidationWarning::TimestampZero { x, z } => {
                write!(f, "chunk ({x}, {z}) has a zero last-modified timestamp")
            }
        }
    }
}
