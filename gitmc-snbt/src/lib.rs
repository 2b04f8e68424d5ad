//! Stringified NBT (SNBT): a textual, round-trippable form of the tree in
//! [`gitmc_nbt`]. [`parse`] reads SNBT text into an [`gitmc_nbt::NbtTag`];
//! [`to_string`] writes one back out under a chosen [`SnbtWriteOptions`].
//!
//! # Example
//! ```
//! use gitmc_nbt::{NbtCompound, NbtTag};
//! use gitmc_snbt::{parse, to_string, SnbtWriteOptions};
//!
//! let mut root = NbtCompound::new();
//! root.insert("xPos", NbtTag::Int(4));
//! let tag = NbtTag::Compound(root);
//!
//! let text = to_string(&tag, &SnbtWriteOptions::default());
//! let parsed = parse(&text).unwrap();
//! assert_eq!(parsed, tag);
//! ```

pub mod error;
mod parser;
mod ser;

pub use error::SnbtError;
pub use gitmc_nbt::NbtTag;
pub use ser::{Mode, NewlineHandling, QuotingPolicy, SnbtWriteOptions};

/// Parses a complete SNBT document into a tag tree.
pub fn parse(input: &str) -> Result<NbtTag, SnbtError> {
    parser::parse_document(input)
}

/// Serializes a tag tree to SNBT text under `opts`.
pub fn to_string(tag: &NbtTag, opts: &SnbtWriteOptions) -> String {
    ser::write(tag, opts)
}

#[cfg(test)]
mod tests;
