/// Signup input validation
///
/// Every field is checked and all failures are reported together, one
/// message per field.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ValidationError, ValidationErrors};

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt ignores bytes beyond this
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_NAME_LENGTH: usize = 256;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    ).unwrap();
}

/// Raw signup fields as received from the client
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Signup fields after validation; the email is trimmed and lowercased
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        password_confirm: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            password_confirm: password_confirm.into(),
        }
    }

    /// # Errors
    /// Returns every failing field
    pub fn validate(self) -> Result<ValidSignup, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = match validate_name(&self.name) {
            Ok(name) => name,
            Err(e) => {
                errors.push(e);
                String::new()
            }
        };

        let email = match validate_email(&self.email) {
            Ok(email) => email,
            Err(e) => {
                errors.push(e);
                String::new()
            }
        };

        if let Err(e) = validate_password(&self.password) {
            errors.push(e);
        }

        if self.password_confirm.is_empty() {
            errors.push(ValidationError::EmptyField("passwordConfirm"));
        } else if self.password_confirm != self.password {
            errors.push(ValidationError::Mismatch("passwordConfirm"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidSignup {
            name,
            email,
            password: self.password,
        })
    }
}

pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("name", MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("name"));
    }

    Ok(trimmed.to_string())
}

pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_lowercase())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signup() {
        let signup = SignupInput::new("  Ada Lovelace ", " A@X.com ", "password123", "password123")
            .validate()
            .expect("Signup should be valid");

        assert_eq!(signup.name, "Ada Lovelace");
        assert_eq!(signup.email, "a@x.com");
        assert_eq!(signup.password, "password123");
    }

    #[test]
    fn test_invalid_email_format() {
        for email in ["invalid", "user@", "@example.com", "user@@example.com", "user@localhost"] {
            assert_eq!(
                validate_email(email),
                Err(ValidationError::InvalidFormat("email")),
                "should reject {}",
                email
            );
        }
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(validate_password(""), Err(ValidationError::EmptyField("password")));
        assert_eq!(
            validate_password("short"),
            Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH))
        );
        assert!(validate_password("password").is_ok());
        assert!(validate_password(&"a".repeat(73)).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_name("   "), Err(ValidationError::EmptyField("name")));
        assert!(validate_name("Jean-Pierre O'Brien").is_ok());
        assert!(validate_name("Name\0with\0null").is_err());
        assert!(validate_name(&"a".repeat(257)).is_err());
    }

    #[test]
    fn test_all_failing_fields_are_reported() {
        let errors = SignupInput::new("", "not-an-email", "short", "different")
            .validate()
            .unwrap_err();

        let fields = errors.field_messages();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields["name"], "name is required");
        assert_eq!(fields["email"], "Please provide a valid email");
        assert_eq!(fields["password"], "password must be at least 8 characters");
        assert_eq!(fields["passwordConfirm"], "Passwords do not match");
    }

    #[test]
    fn test_missing_confirmation() {
        let errors = SignupInput::new("Ada", "a@x.com", "password123", "")
            .validate()
            .unwrap_err();

        assert_eq!(
            errors.iter().collect::<Vec<_>>(),
            vec![&ValidationError::EmptyField("passwordConfirm")]
        );
    }
}
