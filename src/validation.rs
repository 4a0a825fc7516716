use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trims an optional field, treating blank strings as absent.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Required email field: trimmed, lowercased and shape-checked.
pub fn require_email(value: Option<&str>) -> Result<String, ApiError> {
    let email = present(value)
        .ok_or_else(|| ApiError::invalid("Email is required"))?
        .to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::invalid("Invalid email"));
    }
    Ok(email)
}
