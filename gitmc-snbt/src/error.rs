//! Error type for the SNBT parser and serializer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnbtError {
    #[error("malformed snbt: {0}")]
    MalformedSnbt(String),

    #[error("malformed snbt: trailing input was not consumed: {0:?}")]
    TrailingInput(String),

    #[error(transparent)]
    Nbt(#[from] gitmc_nbt::NbtError),
}

pub type Result<T> = std::result::Result<T, SnbtError>;
