//! Error type for the translation engine, manifest/stamp state, and the
//! operation manager.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Nbt(#[from] gitmc_nbt::NbtError),

    #[error(transparent)]
    Snbt(#[from] gitmc_snbt::SnbtError),

    #[error(transparent)]
    Anvil(#[from] gitmc_anvil::AnvilError),

    #[error("manifest at {0:?} is corrupt: {1}")]
    ManifestCorrupt(std::path::PathBuf, String),

    #[error("stamp at {0:?} is corrupt: {1}")]
    StampCorrupt(std::path::PathBuf, String),

    #[error("region file name {0:?} does not match the expected chunk artifact layout")]
    MalformedArtifactPath(String),

    #[error("another operation already holds the lock for save {0:?}")]
    Busy(std::path::PathBuf),

    #[error("operation was canceled")]
    Canceled,

    #[error("no operation registered with id {0}")]
    UnknownOperation(u64),

    #[error("commit {0:?} does not exist in the target repository")]
    UnknownCommit(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
