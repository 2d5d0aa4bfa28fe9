/// Password Hashing and Verification
///
/// Passwords are hashed with bcrypt before they reach the user directory.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hash a password using bcrypt at the given cost
///
/// # Errors
/// Returns error if the cost is out of range or hashing fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a candidate password against a stored bcrypt hash
///
/// A malformed stored hash counts as a mismatch so login failures stay
/// indistinguishable from a wrong password.
pub fn verify_password(candidate: &str, hashed: &str) -> bool {
    match verify(candidate, hashed) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}
