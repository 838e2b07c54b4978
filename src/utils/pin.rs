//! Salted transfer-PIN hashing
//!
//! Stored format is versioned: `v1$<salt hex>$<sha256(salt || pin) hex>`.
//! The plaintext PIN never leaves the request that carried it.

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum PinError {
    #[error("Invalid stored pin format")]
    InvalidFormat,
    #[error("Unsupported pin hash version: {0}")]
    UnsupportedVersion(String),
    #[error("Hex decode error: {0}")]
    HexDecode(String),
}

fn digest(salt: &[u8], pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(pin.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a PIN with a fresh random salt.
pub fn hash_pin(pin: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    format!("v1${}${}", hex::encode(salt), digest(&salt, pin))
}

/// Check a presented PIN against a stored hash.
pub fn verify_pin(pin: &str, stored: &str) -> Result<bool, PinError> {
    let mut parts = stored.split('$');
    let version = parts.next().ok_or(PinError::InvalidFormat)?;
    if version != "v1" {
        return Err(PinError::UnsupportedVersion(version.to_string()));
    }
    let salt_hex = parts.next().ok_or(PinError::InvalidFormat)?;
    let digest_hex = parts.next().ok_or(PinError::InvalidFormat)?;
    if parts.next().is_some() {
        return Err(PinError::InvalidFormat);
    }

    let salt = hex::decode(salt_hex).map_err(|e| PinError::HexDecode(e.to_string()))?;
    Ok(digest(&salt, pin) == digest_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_original_pin() {
        let stored = hash_pin("4821");
        assert!(verify_pin("4821", &stored).unwrap());
    }

    #[test]
    fn rejects_a_wrong_pin() {
        let stored = hash_pin("4821");
        assert!(!verify_pin("4822", &stored).unwrap());
    }

    #[test]
    fn salts_are_unique_per_hash() {
        assert_ne!(hash_pin("4821"), hash_pin("4821"));
    }

    #[test]
    fn rejects_malformed_storage() {
        assert!(verify_pin("4821", "not-a-hash").is_err());
        assert!(verify_pin("4821", "v2$00$00").is_err());
    }
}
