use sha2::{Sha256, Digest};

/// Hex SHA-256 of a digit string, used to fingerprint saved results.
pub fn hash_digits(digits: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(digits.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}
