use super::*;

#[test]
fn valid_registration_passes() {
    assert_eq!(validate_registration("a@b.com", "alice", "secret", "secret"), Ok(()));
}

#[test]
fn registration_requires_fields() {
    assert_eq!(
        validate_registration(" ", "alice", "secret", "secret"),
        Err(ValidationError::EmptyField("Email"))
    );
    assert_eq!(
        validate_registration("a@b.com", "", "secret", "secret"),
        Err(ValidationError::EmptyField("Username"))
    );
}

#[test]
fn short_password_rejected() {
    assert_eq!(
        validate_registration("a@b.com", "alice", "12345", "12345"),
        Err(ValidationError::PasswordTooShort { min: 6 })
    );
}

#[test]
fn mismatched_confirmation_rejected() {
    assert_eq!(
        validate_password_change("old", "secret1", "secret2"),
        Err(ValidationError::PasswordMismatch)
    );
}

#[test]
fn mismatch_reported_before_length() {
    assert_eq!(
        validate_password_change("old", "abc", "abd"),
        Err(ValidationError::PasswordMismatch)
    );
    assert_eq!(
        validate_registration("a@b.com", "alice", "abc", "xyz"),
        Err(ValidationError::PasswordMismatch)
    );
}

#[test]
fn password_change_requires_current() {
    assert_eq!(
        validate_password_change("", "secret1", "secret1"),
        Err(ValidationError::EmptyField("Current password"))
    );
}

#[test]
fn valid_password_change_passes() {
    assert_eq!(validate_password_change("old", "secret1", "secret1"), Ok(()));
}

#[test]
fn messages_are_user_facing() {
    assert_eq!(ValidationError::PasswordMismatch.to_string(), "Passwords do not match");
    assert_eq!(
        ValidationError::PasswordTooShort { min: 6 }.to_string(),
        "Password must be at least 6 characters"
    );
}
