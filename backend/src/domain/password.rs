//! Credential hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};

use super::error::Error;

/// Hash a plaintext password with Argon2id and a fresh random salt.
///
/// The PHC-formatted string it returns is what gets persisted; the
/// plaintext never leaves the request scope.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            tracing::error!(error = %err, "password hashing failed");
            Error::internal()
        })
}
