use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of a raw token string.
///
/// Tokens only ever appear in shared-store keys, logs, and monitoring in
/// this form, so a leaked store dump or log line never exposes a usable
/// credential.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
