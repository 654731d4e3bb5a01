use sha2::{Digest, Sha256};

/// Hex length of a SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 of `payload`
pub fn payload_digest(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}
