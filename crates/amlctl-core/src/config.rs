// ── Runtime console configuration ──
//
// Describes which backends to talk to and where session credentials live.
// Built by the CLI from a profile; core never reads config files itself.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use amlctl_api::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TlsMode, TransportConfig};
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Additional CA certificate (PEM).
    CustomCa(PathBuf),
    /// Skip verification. Only for local test backends.
    DangerAcceptInvalid,
}

/// Where the access token, refresh token and cached user are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialStorage {
    /// Forgotten when the process exits.
    #[default]
    Memory,
    /// JSON file shared between invocations.
    File(PathBuf),
}

/// Configuration for one console session against a pair of backends.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// General backend (customers, transactions, alerts, cases, devices, analytics, auth).
    pub api_url: Url,
    /// DFSA regulatory reporting backend.
    pub regulatory_url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout. There is no retry policy beyond token refresh.
    pub timeout: Duration,
    pub credentials: CredentialStorage,
}

impl ConsoleConfig {
    /// Both backends at the same origin, everything else default.
    pub fn new(api_url: Url, regulatory_url: Url) -> Self {
        Self {
            api_url,
            regulatory_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            credentials: CredentialStorage::default(),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    pub(crate) fn credential_store(&self) -> Arc<dyn CredentialStore> {
        match &self.credentials {
            CredentialStorage::Memory => Arc::new(MemoryCredentialStore::new()),
            CredentialStorage::File(path) => Arc::new(FileCredentialStore::new(path.clone())),
        }
    }
}
