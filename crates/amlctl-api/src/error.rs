use thiserror::Error;

use crate::types::FieldError;

/// Top-level error type for the `amlctl-api` crate.
///
/// Covers every failure mode of a single round trip: transport, backend
/// rejection, field validation, authentication and the refresh-and-retry
/// boundary. `amlctl-core` folds these into its tagged `CoreError`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in or MFA verification rejected by the backend.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The access token expired and could not be renewed. Stored
    /// credentials have already been cleared when this is returned.
    #[error("Session expired -- sign in again")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A record id that cannot be addressed as one URL path segment.
    #[error("Invalid path segment: {0:?}")]
    InvalidPathSegment(String),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Backend-reported failure (non-2xx or `status: "error"` envelope).
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// Backend rejected the payload with field-level errors.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Local state ─────────────────────────────────────────────────
    /// Reading or writing the persisted credential store failed.
    #[error("Credential store error: {0}")]
    CredentialStore(String),
}

impl Error {
    /// Returns `true` if the caller must sign in again.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status reported by the backend, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
