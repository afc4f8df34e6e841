// ABOUTME: Database credential derivation for WordPress stacks.
// ABOUTME: Names come from the domain; the password is fresh OS randomness every time.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

const PASSWORD_BYTES: usize = 16;

pub fn database_name(domain: &str) -> String {
    format!("wp_db_{domain}")
}

/// `wp_user_` plus the first 8 hex digits of the domain's SHA-256.
pub fn database_username(domain: &str) -> String {
    let digest = hex::encode(Sha256::digest(domain.as_bytes()));
    format!("wp_user_{}", &digest[..8])
}

/// 16 random bytes, hex encoded.
pub fn generate_database_password() -> String {
    let mut bytes = [0u8; PASSWORD_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
