// ── Core error types ──
//
// What slices, handles and the session store on their state. Unlike the
// transport error these are `Clone`, and they keep the distinction between
// a transient network failure, a backend rejection and a validation failure
// so callers can decide whether a retry makes sense.

use amlctl_api::FieldError;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    /// The backend could not be reached or the connection broke mid-flight.
    #[error("Network error: {message}")]
    Network { message: String },

    // ── Backend ──────────────────────────────────────────────────────
    /// The backend answered and refused the operation.
    #[error("{message}")]
    Backend {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// Field-level rejection, raised either client-side before any request
    /// or by the backend.
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Vec<FieldError>,
    },

    /// Refresh-and-retry gave up; credentials are already cleared.
    #[error("Session expired -- sign in again")]
    SessionExpired,

    // ── Local ────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Single-field client-side validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            field_errors: vec![FieldError::new(field, message.clone())],
            message,
        }
    }

    /// Whether repeating the same operation could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Backend {
                status: Some(status),
                ..
            } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { field_errors, .. } => field_errors,
            _ => &[],
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<amlctl_api::Error> for CoreError {
    fn from(err: amlctl_api::Error) -> Self {
        use amlctl_api::Error as Api;

        match err {
            // A rejected sign-in is an ordinary backend refusal.
            Api::Authentication { message } => CoreError::Backend {
                status: Some(401),
                code: None,
                message,
            },
            Api::SessionExpired => CoreError::SessionExpired,
            Api::Transport(ref e) => match e.status() {
                Some(status) => CoreError::Backend {
                    status: Some(status.as_u16()),
                    code: None,
                    message: e.to_string(),
                },
                None => CoreError::Network {
                    message: e.to_string(),
                },
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::InvalidPathSegment(segment) => {
                CoreError::invalid("id", format!("{segment:?} is not a valid record id"))
            }
            Api::Tls(message) => CoreError::Config {
                message: format!("TLS error: {message}"),
            },
            Api::Api {
                message,
                code,
                status,
            } => CoreError::Backend {
                status: Some(status),
                code,
                message,
            },
            Api::Validation { message, errors } => CoreError::Validation {
                message,
                field_errors: errors,
            },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected response: {message}"))
            }
            Api::CredentialStore(message) => {
                CoreError::Internal(format!("Credential store: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_keep_status_and_code() {
        let err = CoreError::from(amlctl_api::Error::Api {
            message: "Alert already closed".into(),
            code: Some("alert_closed".into()),
            status: 409,
        });
        assert_eq!(
            err,
            CoreError::Backend {
                status: Some(409),
                code: Some("alert_closed".into()),
                message: "Alert already closed".into(),
            }
        );
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Alert already closed");
    }

    #[test]
    fn unaddressable_id_is_a_validation_failure() {
        let err = CoreError::from(amlctl_api::Error::InvalidPathSegment("..".into()));
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field.as_deref(), Some("id"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_failures_are_retryable() {
        let err = CoreError::from(amlctl_api::Error::Api {
            message: "Bad gateway".into(),
            code: None,
            status: 502,
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_carries_field_errors() {
        let err = CoreError::from(amlctl_api::Error::Validation {
            message: "Invalid".into(),
            errors: vec![FieldError::new("email", "Enter a valid email")],
        });
        assert_eq!(err.field_errors().len(), 1);
        assert!(!err.is_retryable());
    }

    #[test]
    fn session_expiry_survives_translation() {
        let err = CoreError::from(amlctl_api::Error::SessionExpired);
        assert!(err.is_session_expired());
    }

    #[test]
    fn invalid_builds_single_field_error() {
        let err = CoreError::invalid("code", "Enter a 6 or 8 digit code");
        assert_eq!(err.field_errors()[0].field.as_deref(), Some("code"));
        assert_eq!(err.to_string(), "Enter a 6 or 8 digit code");
    }
}
