//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use amlctl_config::ConfigError;
use amlctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend: {message}")]
    #[diagnostic(
        code(amlctl::connection_failed),
        help(
            "Check that the backend is running and the profile URLs are right.\n\
             Try: amlctl config show"
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(code(amlctl::not_signed_in), help("Run: amlctl login"))]
    NotSignedIn,

    #[error("Session expired")]
    #[diagnostic(
        code(amlctl::session_expired),
        help("Stored tokens were cleared. Run: amlctl login")
    )]
    SessionExpired,

    #[error("Authentication failed: {message}")]
    #[diagnostic(code(amlctl::auth_failed), help("Check your email and password."))]
    AuthFailed { message: String },

    #[error("No password available for profile '{profile}'")]
    #[diagnostic(
        code(amlctl::no_credentials),
        help(
            "Store one with: amlctl config set-password --profile {profile}\n\
             Or set the AMLCTL_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(amlctl::not_found))]
    NotFound { message: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(amlctl::forbidden),
        help("Your role does not allow this operation.")
    )]
    Forbidden { message: String },

    #[error("{message}")]
    #[diagnostic(code(amlctl::conflict))]
    Conflict { message: String },

    #[error("Backend error ({}): {message}", .status.map_or_else(|| "-".to_owned(), |s| s.to_string()))]
    #[diagnostic(code(amlctl::api_error))]
    Api {
        status: Option<u16>,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(amlctl::validation))]
    Validation { field: String, reason: String },

    #[error("{message}")]
    #[diagnostic(code(amlctl::rejected))]
    Rejected {
        message: String,
        #[help]
        details: Option<String>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(amlctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: amlctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(amlctl::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(amlctl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("{0}")]
    #[diagnostic(code(amlctl::internal))]
    Internal(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotSignedIn
            | Self::SessionExpired
            | Self::AuthFailed { .. }
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Rejected { .. } | Self::NonInteractiveRequiresYes { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { message } => Self::ConnectionFailed { message },
            CoreError::SessionExpired => Self::SessionExpired,
            CoreError::Backend {
                status, message, ..
            } => match status {
                Some(401) => Self::AuthFailed { message },
                Some(403) => Self::Forbidden { message },
                Some(404) => Self::NotFound { message },
                Some(409) => Self::Conflict { message },
                _ => Self::Api { status, message },
            },
            CoreError::Validation {
                message,
                field_errors,
            } => {
                let details = (!field_errors.is_empty()).then(|| {
                    field_errors
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n")
                });
                Self::Rejected { message, details }
            }
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}
