//! Checksum - deterministic content hashing
//!
//! Checksums are `sha256:` followed by the lowercase hex digest of the
//! UTF-8 content. Empty content has no checksum.

use sha2::{Digest, Sha256};

/// Prefix identifying the hash algorithm in stored checksums
pub const CHECKSUM_PREFIX: &str = "sha256:";

/// Compute the checksum of `content`, or `None` for absent/empty content
pub fn checksum(content: Option<&str>) -> Option<String> {
    let content = content?;
    if content.is_empty() {
        return None;
    }

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Some(format!("{}{:x}", CHECKSUM_PREFIX, hasher.finalize()))
}
