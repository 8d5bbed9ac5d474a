//! Password hashing for filenest.
//!
//! Uses Argon2id; stored hashes are PHC strings carrying salt and parameters.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand_core::OsRng;
use thiserror::Error;

/// Password-related errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Password hash is invalid.
    #[error("invalid password hash format")]
    InvalidHash,

    /// Password verification failed (wrong password).
    #[error("password verification failed")]
    VerificationFailed,
}

/// Create the Argon2 hasher.
///
/// Parameters:
/// - Memory cost: 19 MiB (19456 KiB)
/// - Time cost: 2 iterations
/// - Parallelism: 1 lane
fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params =
        Params::new(19456, 2, 1, None).map_err(|e| PasswordError::HashError(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password using Argon2id.
///
/// Input rules are checked by [`crate::auth::validation`] before this is called.
///
/// # Examples
///
/// ```
/// use filenest::auth::hash_password;
///
/// let hash = hash_password("Secret#123").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = create_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// # Examples
///
/// ```
/// use filenest::auth::{hash_password, verify_password};
///
/// let hash = hash_password("Secret#123").unwrap();
/// assert!(verify_password("Secret#123", &hash).is_ok());
/// assert!(verify_password("secret#123", &hash).is_err());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    // Parameters come from the parsed hash.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Secret#123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Secret#123", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password() {
        let hash = hash_password("Secret#123").unwrap();
        assert!(matches!(
            verify_password("Secret#124", &hash),
            Err(PasswordError::VerificationFailed)
        ));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("Secret#123").unwrap();
        let b = hash_password("Secret#123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hash() {
        assert!(matches!(
            verify_password("x", "not-a-hash"),
            Err(PasswordError::InvalidHash)
        ));
    }
}
