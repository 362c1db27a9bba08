//! Backend error type.

use thiserror::Error;

/// Errors returned by backend calls.
///
/// `Api` displays the service message verbatim so call sites can surface it
/// to the user unchanged.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The call needs a signed-in session and none is held.
    #[error("not signed in")]
    NotSignedIn,

    /// Realtime websocket failure.
    #[error("realtime: {0}")]
    Realtime(String),

    /// Persisted session could not be read or written.
    #[error("session storage: {0}")]
    Session(String),
}

impl BackendError {
    /// Builds an `Api` error from a status code and raw response body.
    ///
    /// The message is taken from the first of `msg`, `error_description`,
    /// `message` or `error`; otherwise the body (or status) is used.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["msg", "error_description", "message", "error"]
                    .iter()
                    .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
            })
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP {status}")
                } else {
                    trimmed.to_string()
                }
            });
        BackendError::Api { status, message }
    }

    /// Whether the service refused the credentials outright, as opposed to a
    /// transport or server failure worth retrying.
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            BackendError::Api { status, .. } => matches!(status, 400 | 401 | 403),
            BackendError::NotSignedIn => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_msg_field() {
        let err = BackendError::from_response(400, r#"{"code":400,"msg":"Invalid login credentials"}"#);
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_message_falls_back_through_fields() {
        let err = BackendError::from_response(
            400,
            r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#,
        );
        assert_eq!(err.to_string(), "Email not confirmed");

        let err = BackendError::from_response(409, r#"{"message":"duplicate key value"}"#);
        assert_eq!(err.to_string(), "duplicate key value");
    }

    #[test]
    fn test_message_uses_body_or_status() {
        let err = BackendError::from_response(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Bad Gateway");

        let err = BackendError::from_response(500, "  ");
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[test]
    fn test_auth_rejection_excludes_server_and_transport_failures() {
        let rejected = BackendError::from_response(400, r#"{"msg":"Invalid Refresh Token"}"#);
        assert!(rejected.is_auth_rejection());
        assert!(BackendError::from_response(401, "").is_auth_rejection());
        assert!(BackendError::NotSignedIn.is_auth_rejection());

        assert!(!BackendError::from_response(503, "Service Unavailable").is_auth_rejection());
        assert!(!BackendError::Decode("eof".into()).is_auth_rejection());
    }
}
