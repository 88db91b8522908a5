//! SHA256 digest utilities for registry content addressing
//!
//! Blobs and manifests are addressed by `sha256:<hex>` digests. This module
//! keeps computing, validating and shortening them in one place.

use crate::error::{PusherError, Result};
use sha2::{Digest, Sha256};

pub const SHA256_PREFIX: &str = "sha256:";

/// Utilities for working with SHA256 content digests
pub struct DigestUtils;

impl DigestUtils {
    /// Compute SHA256 hex digest from byte data
    pub fn compute_sha256(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Compute full content digest (with sha256: prefix)
    pub fn compute_digest(data: &[u8]) -> String {
        format!("{}{}", SHA256_PREFIX, Self::compute_sha256(data))
    }

    /// Validate SHA256 hex string (64 characters, all hex)
    pub fn is_valid_sha256_hex(digest: &str) -> bool {
        digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Validate full digest format (sha256:xxxxx)
    pub fn is_valid_digest(digest: &str) -> bool {
        digest
            .strip_prefix(SHA256_PREFIX)
            .is_some_and(Self::is_valid_sha256_hex)
    }

    /// Verify data matches an expected digest
    pub fn verify_data_integrity(data: &[u8], expected_digest: &str) -> Result<()> {
        if !Self::is_valid_digest(expected_digest) {
            return Err(PusherError::transport(
                "digest verification",
                format!("malformed digest {}", expected_digest),
            ));
        }
        let computed = Self::compute_digest(data);
        if computed != expected_digest {
            return Err(PusherError::transport(
                "digest verification",
                format!("expected {}, computed {}", expected_digest, computed),
            ));
        }
        Ok(())
    }

    /// Format digest for display (truncated for readability)
    pub fn format_digest_short(digest: &str) -> String {
        if digest.len() > 19 {
            format!("{}...", &digest[..19])
        } else {
            digest.to_string()
        }
    }
}
