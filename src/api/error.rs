use serde::Deserialize;
use thiserror::Error;

/// Payload message the backend attaches to a 401 when the access token
/// has expired (as opposed to being missing or plain invalid). This exact
/// string is what triggers the silent refresh-and-retry protocol.
pub const TOKEN_EXPIRED_MESSAGE: &str = "Token has expired";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session expired - signing in again required")]
    AuthExpired,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Structured error payload shape used by the backend. Routes report
/// failures as `{"error": "..."}`; the JWT layer uses `{"msg": "..."}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl ApiError {
    /// Classify a non-2xx response, preferring the server's structured
    /// payload over a generic message.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        Self::from_status_with_fallback(status, body, "request failed")
    }

    /// Like `from_status`, but with a caller-supplied generic message used
    /// when the server gave no structured payload.
    pub fn from_status_with_fallback(
        status: reqwest::StatusCode,
        body: &str,
        fallback: &str,
    ) -> Self {
        let payload = Self::payload_message(body);
        let message = payload
            .clone()
            .unwrap_or_else(|| fallback.to_string());

        match status.as_u16() {
            401 if payload.as_deref() == Some(TOKEN_EXPIRED_MESSAGE) => ApiError::AuthExpired,
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::RequestFailed {
                status: status.as_u16(),
                message: if payload.is_some() {
                    message
                } else if body.trim().is_empty() {
                    message
                } else {
                    Self::truncate_body(body)
                },
            },
        }
    }

    /// True iff this error should trigger the single-shot refresh protocol.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }

    /// Extract the structured message from an error body, if any.
    fn payload_message(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .error
            .or(parsed.msg)
            .filter(|m| !m.trim().is_empty())
    }

    /// Truncate a response body to avoid carrying excessive data in errors
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        // Walk back to a char boundary so multi-byte text cannot panic
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_expired_token_detected() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"msg": "Token has expired"}"#,
        );
        assert!(err.is_auth_expired());
    }

    #[test]
    fn test_plain_401_is_not_expired() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error": "Invalid credentials"}"#,
        );
        assert!(!err.is_auth_expired());
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid credentials"));
    }

    #[test]
    fn test_401_without_payload_is_not_expired() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_error_key_preferred_over_msg() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error": "No active database connection", "msg": "ignored"}"#,
        );
        match err {
            ApiError::RequestFailed { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No active database connection");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_message_used_when_body_unstructured() {
        let err = ApiError::from_status_with_fallback(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>oops</html>",
            "Login failed",
        );
        assert!(matches!(err, ApiError::ServerError(ref m) if m == "Login failed"));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "{}"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "{}"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "{}"),
            ApiError::ServerError(_)
        ));
    }

    #[test]
    fn test_long_bodies_truncated() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(StatusCode::IM_A_TEAPOT, &body);
        match err {
            ApiError::RequestFailed { message, .. } => {
                assert!(message.len() < 600);
                assert!(message.contains("truncated"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncation_lands_on_char_boundary() {
        // 200 euro signs = 600 bytes; byte 500 falls mid-character
        let body = "\u{20ac}".repeat(200);
        let err = ApiError::from_status(StatusCode::IM_A_TEAPOT, &body);
        match err {
            ApiError::RequestFailed { message, .. } => {
                assert!(message.contains("truncated, 600 total bytes"));
                assert!(message.starts_with('\u{20ac}'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
