//! Error type shared by the NBT value tree and its binary codec.

use thiserror::Error;

/// Errors produced while reading or writing the big-endian binary NBT
/// grammar, or while otherwise manipulating an [`crate::NbtTag`] tree.
#[derive(Debug, Error)]
pub enum NbtError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("binary nbt violates the grammar: {0}")]
    MalformedNbt(String),

    #[error("nbt document has no root compound")]
    NoRootCompound,

    #[error("invalid tag id: {0}")]
    InvalidTagId(u8),

    #[error("string is not valid modified utf-8: {0}")]
    InvalidModifiedUtf8(String),

    #[error("list element type mismatch: list declared as {declared:?}, got {found:?}")]
    ListTypeMismatch {
        declared: crate::TagId,
        found: crate::TagId,
    },
}

pub type Result<T> = std::result::Result<T, NbtError>;
