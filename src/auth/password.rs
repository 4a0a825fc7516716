//! Argon2 credentials for back-office identities.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use tracing::error;

use crate::error::{ApiError, ApiResult};

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    /// Verified against when a login names an unknown email, so both failure paths hash once.
    static ref DECOY_HASH: Option<String> = hash_password("decoy-credential-never-issued").ok();
}

fn argon_failure(context: &'static str, e: argon2::password_hash::Error) -> anyhow::Error {
    error!(error = %e, context, "argon2 failure");
    anyhow::anyhow!("{context}: {e}")
}

/// Policy for passwords set through user provisioning.
pub fn check_new_password(plain: &str) -> ApiResult<()> {
    if plain.trim().is_empty() {
        return Err(ApiError::invalid("Password is required"));
    }
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| argon_failure("hash password", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| argon_failure("parse stored hash", e))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Spends one verification on a throwaway hash. Always a mismatch.
pub fn verify_decoy(plain: &str) {
    if let Some(hash) = DECOY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}
