//! # Local Password Hashing
//!
//! Sha256-based password hashing for local store accounts.
//!
//! This is a single-machine desktop deployment with no network auth
//! surface; the hash only keeps passwords out of plain sight in the
//! database file. Not suitable for a server context.

use sha2::{Digest, Sha256};

/// Hashes a password to a lowercase hex sha256 digest.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    hex::encode(digest)
}

/// Constant-format comparison of a password against a stored digest.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("admin123");
        // Matches the seed row in 003_seed_admin.sql.
        assert_eq!(
            hash,
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
    }
}
