//! Input validation for sign-up.
//!
//! Messages are user facing and keyed by form field.

use std::collections::HashMap;

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 20;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 32;

/// Field errors keyed by form field name.
pub type FieldErrors = HashMap<String, Vec<String>>;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    #[error("Username required")]
    UsernameRequired,

    /// Username is too short.
    #[error("Username must be at least {MIN_USERNAME_LENGTH} characters long")]
    UsernameTooShort,

    /// Username is too long.
    #[error("Username must be no more than {MAX_USERNAME_LENGTH} characters long")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("Username must only contain letters, numbers, or underscores")]
    UsernameInvalidChars,

    /// Password is empty.
    #[error("Password required")]
    PasswordRequired,

    /// Password is too short.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    PasswordTooShort,

    /// Password is too long.
    #[error("Password must be less than {MAX_PASSWORD_LENGTH} characters long")]
    PasswordTooLong,

    /// Password lacks an uppercase letter.
    #[error("Password must contain at least one uppercase letter")]
    PasswordNoUppercase,

    /// Password lacks a lowercase letter.
    #[error("Password must contain at least one lowercase letter")]
    PasswordNoLowercase,

    /// Password lacks a digit.
    #[error("Password must contain at least one number")]
    PasswordNoDigit,

    /// Password lacks a special character.
    #[error("Password must contain at least one special character")]
    PasswordNoSpecial,

    /// Confirmation does not match.
    #[error("Passwords do not match")]
    PasswordMismatch,
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        use ValidationError::*;
        match self {
            UsernameRequired | UsernameTooShort | UsernameTooLong | UsernameInvalidChars => {
                "username"
            }
            PasswordMismatch => "confirm-password",
            _ => "password",
        }
    }
}

/// Validate a username. The caller trims it first.
///
/// Requirements:
/// - Length: 3-20 characters
/// - Characters: ASCII letters, digits and underscore
///
/// # Examples
///
/// ```
/// use filenest::auth::validation::validate_username;
///
/// assert!(validate_username("ab3_CD").is_ok());
/// assert!(validate_username("ab").is_err()); // too short
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameRequired);
    }

    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if len > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameInvalidChars);
    }

    Ok(())
}

/// Validate a password.
///
/// Requirements:
/// - Length: 8-32 characters
/// - At least one uppercase letter, lowercase letter, digit, and
///   special character (anything but an ASCII letter or digit)
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }

    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordNoUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::PasswordNoLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordNoDigit);
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::PasswordNoSpecial);
    }

    Ok(())
}

/// Validate a full sign-up form.
///
/// Every field is checked; the first failure of each field is reported.
pub fn validate_signup(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), FieldErrors> {
    let mut failures = Vec::new();

    if let Err(e) = validate_username(username.trim()) {
        failures.push(e);
    }
    if let Err(e) = validate_password(password) {
        failures.push(e);
    }
    if password != confirm_password {
        failures.push(ValidationError::PasswordMismatch);
    }

    if failures.is_empty() {
        return Ok(());
    }
    Err(into_field_errors(failures))
}

/// Group validation errors by field.
pub fn into_field_errors(errors: impl IntoIterator<Item = ValidationError>) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for error in errors {
        fields
            .entry(error.field().to_string())
            .or_default()
            .push(error.to_string());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ab3_CD").is_ok());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());

        assert_eq!(validate_username(""), Err(ValidationError::UsernameRequired));
        assert_eq!(validate_username("ab"), Err(ValidationError::UsernameTooShort));
        assert_eq!(
            validate_username(&"a".repeat(21)),
            Err(ValidationError::UsernameTooLong)
        );
        assert_eq!(
            validate_username("bad-name"),
            Err(ValidationError::UsernameInvalidChars)
        );
        assert_eq!(
            validate_username("名前です"),
            Err(ValidationError::UsernameInvalidChars)
        );
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Secret#123").is_ok());
        assert!(validate_password("Abcdefg_1").is_ok());

        assert_eq!(validate_password(""), Err(ValidationError::PasswordRequired));
        assert_eq!(validate_password("Ab#1"), Err(ValidationError::PasswordTooShort));
        assert_eq!(
            validate_password(&format!("Ab#1{}", "x".repeat(30))),
            Err(ValidationError::PasswordTooLong)
        );
        assert_eq!(
            validate_password("secret#123"),
            Err(ValidationError::PasswordNoUppercase)
        );
        assert_eq!(
            validate_password("SECRET#123"),
            Err(ValidationError::PasswordNoLowercase)
        );
        assert_eq!(
            validate_password("Secret#abc"),
            Err(ValidationError::PasswordNoDigit)
        );
        assert_eq!(
            validate_password("Secret1234"),
            Err(ValidationError::PasswordNoSpecial)
        );
    }

    #[test]
    fn test_validate_signup_ok() {
        assert!(validate_signup("  ab3_CD ", "Secret#123", "Secret#123").is_ok());
    }

    #[test]
    fn test_validate_signup_collects_fields() {
        let errors = validate_signup("ab", "short", "other").unwrap_err();

        assert_eq!(
            errors["username"],
            vec!["Username must be at least 3 characters long"]
        );
        assert_eq!(
            errors["password"],
            vec!["Password must be at least 8 characters long"]
        );
        assert_eq!(errors["confirm-password"], vec!["Passwords do not match"]);
    }

    #[test]
    fn test_error_fields() {
        assert_eq!(ValidationError::UsernameTooLong.field(), "username");
        assert_eq!(ValidationError::PasswordNoDigit.field(), "password");
        assert_eq!(ValidationError::PasswordMismatch.field(), "confirm-password");
    }
}
