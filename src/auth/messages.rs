//! Turns login/signup failures into the messages shown to the user.

use super::AuthErrorKind;
use crate::api::errors::ApiError;

pub const LOGIN_FAILED: &str = "Login failed. Please try again.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const SIGNUP_FAILED: &str = "Account creation failed. Please try again.";
pub const EMAIL_ALREADY_REGISTERED: &str =
    "Email already registered. Please use a different email or try logging in.";

/// Marker the backend puts in the `detail` of a duplicate signup.
const DUPLICATE_MARKER: &str = "already registered";

/// Classifies a login failure.
#[must_use]
pub fn login_failure(err: &ApiError) -> (AuthErrorKind, String) {
    if err.status() == Some(401) {
        return (
            AuthErrorKind::InvalidCredentials,
            INVALID_CREDENTIALS.to_string(),
        );
    }

    if let Some(detail) = err.detail() {
        return (AuthErrorKind::Generic, detail.to_string());
    }

    (kind_of(err), message_or(err, LOGIN_FAILED))
}

/// Classifies a signup failure. Only `400` bodies are trusted for details;
/// a `400` without one falls back to the generic message.
#[must_use]
pub fn signup_failure(err: &ApiError) -> (AuthErrorKind, String) {
    if err.status() == Some(400) {
        return match err.detail() {
            Some(detail) if detail.contains(DUPLICATE_MARKER) => (
                AuthErrorKind::DuplicateRegistration,
                EMAIL_ALREADY_REGISTERED.to_string(),
            ),
            Some(detail) => (AuthErrorKind::Generic, detail.to_string()),
            None => (AuthErrorKind::Generic, SIGNUP_FAILED.to_string()),
        };
    }

    (kind_of(err), message_or(err, SIGNUP_FAILED))
}

fn kind_of(err: &ApiError) -> AuthErrorKind {
    match err {
        ApiError::Network(_) | ApiError::Timeout(_) => AuthErrorKind::Network,
        _ => AuthErrorKind::Generic,
    }
}

fn message_or(err: &ApiError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
