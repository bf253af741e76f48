//! Input validation for API requests.
//!
//! Each validator returns `Err(message)` so handlers can collect several
//! failures with [`ValidationErrorBuilder::check`](super::error::ValidationErrorBuilder::check).

use lazy_static::lazy_static;
use regex::Regex;

use super::error::{ApiError, ValidationErrorBuilder};
use crate::db::RegisterRequest;

lazy_static! {
    /// Usernames: letters, digits and `_ . @ -`
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.@-]+$").unwrap();
}

const MAX_USERNAME_LEN: usize = 64;
const MAX_PASSWORD_LEN: usize = 1024;
const MAX_TEXT_LEN: usize = 10_000;

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(format!(
            "Username is too long (max {} characters)",
            MAX_USERNAME_LEN
        ));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username may only contain letters, digits, underscores, dots, @ and dashes"
                .to_string(),
        );
    }

    Ok(())
}

/// Validate a password. Strength rules are left to the exercises' clients.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(format!(
            "Password is too long (max {} characters)",
            MAX_PASSWORD_LEN
        ));
    }

    Ok(())
}

/// Validate a free-text field that must not be blank
pub fn validate_text(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }

    if value.len() > MAX_TEXT_LEN {
        return Err(format!(
            "{} is too long (max {} characters)",
            label, MAX_TEXT_LEN
        ));
    }

    Ok(())
}

/// Validate an optional free-text field, blank is rejected when present
pub fn validate_optional_text(label: &str, value: &Option<String>) -> Result<(), String> {
    match value {
        Some(v) => validate_text(label, v),
        None => Ok(()),
    }
}

/// Validate a monetary amount that may be zero but not negative
pub fn validate_amount(amount: f64) -> Result<(), String> {
    if !amount.is_finite() {
        return Err("Amount must be a finite number".to_string());
    }

    if amount < 0.0 {
        return Err("Amount must not be negative".to_string());
    }

    Ok(())
}

/// Validate a registration body
pub fn validate_register(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("username", validate_username(&req.username))
        .check("password", validate_password(&req.password))
        .check("full_name", validate_optional_text("Full name", &req.full_name));
    errors.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob_99").is_ok());
        assert!(validate_username("carol.smith@example.com").is_ok());
        assert!(validate_username("d-e").is_ok());
    }

    #[test]
    fn test_invalid_usernames() {
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_passwords() {
        assert!(validate_password("pw1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(1025)).is_err());
    }

    #[test]
    fn test_text_fields() {
        assert!(validate_text("Title", "Buy milk").is_ok());
        assert!(validate_text("Title", "   ").is_err());
        assert_eq!(
            validate_text("Title", "").unwrap_err(),
            "Title is required"
        );
        assert!(validate_optional_text("Description", &None).is_ok());
        assert!(validate_optional_text("Description", &Some(String::new())).is_err());
    }

    #[test]
    fn test_amounts() {
        assert!(validate_amount(0.0).is_ok());
        assert!(validate_amount(12.5).is_ok());
        assert!(validate_amount(-0.01).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_register_collects_all_failures() {
        let req = RegisterRequest {
            username: "bad name".to_string(),
            password: String::new(),
            full_name: None,
            role: None,
            enable_2fa: None,
        };
        let err = validate_register(&req).unwrap_err();
        assert!(err.message().contains("2 fields"));
    }
}
