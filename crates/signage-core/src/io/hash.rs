//! Content hashing for blob integrity checks

/// Compute the BLAKE3 digest of a blob
///
/// Returns a hex-encoded string so it can be stored in JSON detail records.
pub fn compute_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}
