//! Hashed storage keys.

use sha2::{Digest, Sha256};

/// Compute the storage key for a canonical cache key.
pub fn compute_cache_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
