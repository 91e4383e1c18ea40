//! Salted SHA-256 password hashes stored as `salt$hexdigest`.

use sha2::{Digest, Sha256};

const SEPARATOR: char = '$';

pub fn hash_password(password: &str, salt: &str) -> String {
    format!("{salt}{SEPARATOR}{}", digest(salt, password))
}

/// Check a password against a stored hash.
///
/// Hashes without a salt are plain SHA-256 digests from older databases.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let expected = match stored.split_once(SEPARATOR) {
        Some((salt, hash)) => (digest(salt, password), hash),
        None => (digest("", password), stored),
    };
    constant_time_eq(expected.0.as_bytes(), expected.1.as_bytes())
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
