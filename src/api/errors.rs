use serde_json::Value;
use thiserror::Error;

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, Error)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http {
        status: u16,
        message: String,
        detail: Option<String>,
    },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Builds an HTTP error from a raw response body, keeping the backend
    /// `detail` when the body is FastAPI-shaped JSON.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Http {
            status,
            message: sanitize_body(body),
            detail: extract_detail(body),
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }
}

/// Maps transport errors into `ApiError` variants with timeout detection.
pub(crate) fn map_request_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        ApiError::Serialization(format!("Failed to build request: {err}"))
    } else if err.is_decode() {
        ApiError::Parse(format!("Failed to decode response: {err}"))
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Trims and truncates an error body for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

/// Reads `detail` from `{"detail": "..."}` or the first `msg` of a
/// validation list `{"detail": [{"msg": "..."}]}`.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;

    let text = match detail {
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(|msg| msg.trim().to_string())?,
        _ => return None,
    };

    // Unlike the body, the detail is never truncated.
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_body_handles_empty_and_long_bodies() {
        assert_eq!(sanitize_body("   "), "Request failed.");
        assert_eq!(sanitize_body("  boom \n"), "boom");
        assert_eq!(sanitize_body(&"x".repeat(500)).len(), MAX_ERROR_CHARS);
    }

    #[test]
    fn extract_detail_reads_string_detail() {
        assert_eq!(
            extract_detail(r#"{"detail": "Email already registered"}"#),
            Some("Email already registered".to_string())
        );
    }

    #[test]
    fn long_detail_is_not_truncated() {
        let detail = format!("{} already registered", "x".repeat(210));
        let body = json!({ "detail": detail }).to_string();
        let err = ApiError::from_response(400, &body);

        assert_eq!(err.detail(), Some(detail.as_str()));
        let ApiError::Http { message, .. } = &err else {
            panic!("expected http error");
        };
        assert_eq!(message.chars().count(), MAX_ERROR_CHARS);
    }

    #[test]
    fn extract_detail_reads_first_validation_message() {
        let body = r#"{"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address"}]}"#;
        assert_eq!(
            extract_detail(body),
            Some("value is not a valid email address".to_string())
        );
    }

    #[test]
    fn extract_detail_ignores_non_json_and_blank() {
        assert_eq!(extract_detail("Internal Server Error"), None);
        assert_eq!(extract_detail(r#"{"detail": "  "}"#), None);
        assert_eq!(extract_detail(r#"{"error": "nope"}"#), None);
    }

    #[test]
    fn from_response_keeps_status_and_detail() {
        let err = ApiError::from_response(400, r#"{"detail":"bad input"}"#);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.detail(), Some("bad input"));
        assert!(!err.is_unauthorized());
        assert_eq!(
            err.to_string(),
            r#"Request failed (400): {"detail":"bad input"}"#
        );
    }

    #[test]
    fn unauthorized_is_detected_by_status() {
        assert!(ApiError::from_response(401, "").is_unauthorized());
        assert!(!ApiError::Network("down".to_string()).is_unauthorized());
        assert_eq!(ApiError::Network("down".to_string()).status(), None);
    }
}
