//! PIN hashing and verification using Argon2
//!
//! Uses the argon2id variant with default parameters. The PIN never leaves
//! this module in any reversible form.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::types::GalleryError;

/// Hash a PIN using Argon2id
///
/// Returns the PHC-formatted hash string that includes the salt and parameters.
pub fn hash_pin(pin: &str) -> Result<String, GalleryError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GalleryError::Internal(format!("Failed to hash PIN: {e}")))
}

/// Verify a PIN against a stored hash
///
/// A stored hash that does not parse counts as a mismatch: the caller only
/// ever learns "no such identity or wrong PIN".
pub fn verify_pin(pin: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(pin.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored PIN hash is not a PHC string: {e}");
            false
        }
    }
}

/// [`hash_pin`] on the blocking pool
pub async fn hash_pin_blocking(pin: String) -> Result<String, GalleryError> {
    tokio::task::spawn_blocking(move || hash_pin(&pin)).await?
}

/// [`verify_pin`] on the blocking pool
pub async fn verify_pin_blocking(pin: String, hash: String) -> Result<bool, GalleryError> {
    Ok(tokio::task::spawn_blocking(move || verify_pin(&pin, &hash)).await?)
}
