use super::*;

#[test]
fn server_error_message_is_detail() {
    let err = ApiError::Server { status: 400, message: "Email already registered".into() };
    assert_eq!(err.message(), "Email already registered");
    assert_eq!(err.to_string(), "Email already registered");
    assert_eq!(err.status(), Some(400));
}

#[test]
fn unauthorized_reports_401() {
    let err = ApiError::Unauthorized { message: "Invalid credentials".into() };
    assert!(err.is_unauthorized());
    assert!(!err.is_transport());
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "Invalid credentials");
}

#[test]
fn transport_error_has_no_status() {
    let err = ApiError::from(TransportError("connection refused".into()));
    assert!(err.is_transport());
    assert_eq!(err.status(), None);
    assert_eq!(err.message(), "network request failed: connection refused");
}

#[test]
fn decode_error_message() {
    let err = ApiError::Decode("missing field `user`".into());
    assert_eq!(err.message(), "response parse failed: missing field `user`");
    assert!(!err.is_unauthorized());
}
