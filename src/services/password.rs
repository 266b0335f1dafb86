//! Password hashing and policy
//!
//! Argon2id with the argon2 crate's default cost parameters and a fresh
//! random salt per hash. Hashes are PHC strings, so the parameters travel
//! with the hash and verification needs nothing else.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Special characters accepted by the password policy
pub const PASSWORD_SPECIALS: &str = "@#$%^&+=_";

static HAS_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").expect("Invalid digit pattern"));
static HAS_LOWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z]").expect("Invalid lowercase pattern"));
static HAS_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]").expect("Invalid uppercase pattern"));
static HAS_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[@#$%^&+=_]").expect("Invalid special character pattern"));

/// Hash a password using Argon2id.
///
/// # Example
///
/// ```ignore
/// use gallery::services::password::hash_password;
///
/// let hash = hash_password("Tr0ub4dor&3")?;
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored hash is
/// not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}

/// Check a new password against the account password policy.
///
/// At least eight characters with a digit, a lowercase letter, an uppercase
/// letter and one of `@#$%^&+=_`. The error is the message shown to the user.
pub fn check_password_policy(password: &str) -> Result<(), String> {
    let strong = password.chars().count() >= MIN_PASSWORD_LEN
        && HAS_DIGIT.is_match(password)
        && HAS_LOWER.is_match(password)
        && HAS_UPPER.is_match(password)
        && HAS_SPECIAL.is_match(password);

    if strong {
        Ok(())
    } else {
        Err(format!(
            "Password must be at least {} characters long and contain at least one digit, \
             one lowercase letter, one uppercase letter, and one special character ({})",
            MIN_PASSWORD_LEN, PASSWORD_SPECIALS
        ))
    }
}
