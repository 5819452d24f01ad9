//! Input validation rules shared by the sign-in and registration forms.
//!
//! Each check returns the first violated rule as a [`DomainError::Validation`]
//! naming the field, so callers can render field-level feedback.

use crate::error::{DomainError, DomainResult};

pub const PASSWORD_MIN_LENGTH: usize = 8;
const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Value must be non-empty after trimming.
pub fn required(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "is required"));
    }
    Ok(())
}

/// Trimmed value length (in chars) must lie in `min..=max`.
pub fn length(field: &'static str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(DomainError::validation(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    if len > max {
        return Err(DomainError::validation(
            field,
            format!("must be less than {max} characters"),
        ));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace.
pub fn email(field: &'static str, value: &str) -> DomainResult<()> {
    let value = value.trim();
    let invalid = || DomainError::validation(field, "invalid email format");

    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

/// Letters, digits and underscores only.
pub fn username(field: &'static str, value: &str) -> DomainResult<()> {
    length(field, value, 3, 50)?;
    if !value.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DomainError::validation(
            field,
            "can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

/// At least [`PASSWORD_MIN_LENGTH`] chars drawn from letters, digits and
/// `@$!%*?&`, with one of each class present.
pub fn strong_password(field: &'static str, value: &str) -> DomainResult<()> {
    required(field, value)?;
    if value.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(DomainError::validation(
            field,
            format!("must be at least {PASSWORD_MIN_LENGTH} characters"),
        ));
    }

    let allowed = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let lower = value.chars().any(|c| c.is_ascii_lowercase());
    let upper = value.chars().any(|c| c.is_ascii_uppercase());
    let digit = value.chars().any(|c| c.is_ascii_digit());
    let special = value.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if !(allowed && lower && upper && digit && special) {
        return Err(DomainError::validation(
            field,
            "must contain uppercase, lowercase, number and special character",
        ));
    }
    Ok(())
}

/// Optional phone number: digits plus `+ - ( )` and spaces, at most 20 chars.
pub fn phone_number(field: &'static str, value: &str) -> DomainResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    if value.chars().count() > 20 {
        return Err(DomainError::validation(field, "must be less than 20 characters"));
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '))
        && value.chars().any(|c| c.is_ascii_digit());
    if !valid {
        return Err(DomainError::validation(field, "invalid phone number format"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(email("email", "alice@example.com").is_ok());
        assert!(email("email", "  alice@example.com ").is_ok());
        assert!(email("email", "alice@example").is_err());
        assert!(email("email", "@example.com").is_err());
        assert!(email("email", "al ice@example.com").is_err());
        assert!(email("email", "alice@@example.com").is_err());
    }

    #[test]
    fn password_requires_every_class() {
        assert!(strong_password("password", "Secret1!").is_ok());
        assert!(strong_password("password", "secret1!").is_err());
        assert!(strong_password("password", "SECRET1!").is_err());
        assert!(strong_password("password", "Secret!!").is_err());
        assert!(strong_password("password", "Secret12").is_err());
        assert!(strong_password("password", "Se1!").is_err());
        assert!(strong_password("password", "Secret1!#").is_err());
    }

    #[test]
    fn username_charset() {
        assert!(username("username", "alice_01").is_ok());
        assert!(username("username", "al").is_err());
        assert!(username("username", "alice-01").is_err());
    }

    #[test]
    fn validation_error_names_field() {
        let err = length("firstName", "A", 2, 50).unwrap_err();
        assert_eq!(err.field(), Some("firstName"));
        assert_eq!(err.to_string(), "firstName: must be at least 2 characters");
    }

    #[test]
    fn phone_is_optional() {
        assert!(phone_number("phoneNumber", "").is_ok());
        assert!(phone_number("phoneNumber", "+84 (90) 123-4567").is_ok());
        assert!(phone_number("phoneNumber", "call me").is_err());
        assert!(phone_number("phoneNumber", "123456789012345678901").is_err());
    }
}
