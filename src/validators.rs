/// Input validators for account fields

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_LOCAL_PART_LENGTH: usize = 64;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    let local_part = trimmed.split('@').next().unwrap_or_default();
    if local_part.len() > MAX_LOCAL_PART_LENGTH {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Rejects an empty password; everything else is left to the hasher
pub fn is_valid_password(password: &str) -> Result<&str, ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    Ok(password)
}
