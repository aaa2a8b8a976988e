//! Content fingerprints.
//!
//! The fingerprint is the hex-encoded BLAKE3 hash of a file's raw bytes.
//! It is only used to detect changes between runs, never as an identity.

/// Length in characters of a hex fingerprint.
pub const FINGERPRINT_LEN: usize = 64;

/// Compute the fingerprint of raw file bytes.
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
