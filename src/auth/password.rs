/// Password Hashing and Verification
///
/// bcrypt at the default cost. A mismatch is reported as
/// `AuthError::InvalidCredentials`, distinct from a digest bcrypt cannot read.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, AuthError, ValidationError};

/// bcrypt ignores input past this many bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if:
/// - Password is longer than bcrypt can hash without truncation
/// - Bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        )));
    }

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// - `AuthError::InvalidCredentials` when the password does not match
/// - `AppError::Internal` when the stored digest is malformed
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
    let matches = verify(password, password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

    if matches {
        Ok(())
    } else {
        Err(AppError::Auth(AuthError::InvalidCredentials))
    }
}
