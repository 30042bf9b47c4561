//! Form checks run before any network call.

/// Minimum password length accepted by registration and password change.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("{0} is required")]
    EmptyField(&'static str),
}

/// # Errors
///
/// Returns the first failing check: required fields, then confirmation,
/// then length.
pub fn validate_registration(email: &str, username: &str, password: &str, confirm: &str) -> Result<(), ValidationError> {
    require("Email", email)?;
    require("Username", username)?;
    check_new_password(password, confirm)
}

/// # Errors
///
/// Returns the first failing check: required fields, then confirmation,
/// then length.
pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> Result<(), ValidationError> {
    require("Current password", current)?;
    check_new_password(new, confirm)
}

fn check_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    require("Password", password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
