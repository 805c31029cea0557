use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure random token (hex-encoded).
pub fn generate_secure_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// SHA-256 hash a token for safe database storage.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// An out-of-band token: the raw value goes to the user, the hash and
/// expiry go to the database.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub raw: String,
    pub hash: String,
    pub expires_at: NaiveDateTime,
}

impl IssuedToken {
    pub fn new(ttl_secs: u64) -> Self {
        let raw = generate_secure_token();
        let hash = hash_token(&raw);
        let expires_at = Utc::now().naive_utc() + Duration::seconds(ttl_secs as i64);
        IssuedToken {
            raw,
            hash,
            expires_at,
        }
    }
}
