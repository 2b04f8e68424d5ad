//! Content hashing for stamps: SHA-256 over raw bytes, base64-encoded for
//! storage in JSON (spec §6 stamp file layout).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

/// The base64 text form a [`crate::model::Stamp`] stores as `OriginalHash`.
pub fn sha256_base64(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    BASE64.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_hashes_to_known_digest() {
        // echo -n '' | sha256sum, base64-encoded.
        assert_eq!(
            sha256_base64(b""),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn different_inputs_hash_differently() {
        assert_ne!(sha256_base64(b"a"), sha256_base64(b"b"));
    }
}
