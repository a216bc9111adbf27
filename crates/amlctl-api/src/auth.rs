// ── Persisted credentials ──
//
// Three keys survive between runs: the access token, the refresh token,
// and the serialised current user. They are written together on sign-in
// and cleared together on sign-out or any unrecoverable auth failure.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Error;
use crate::models::{AuthTokens, User};

/// Snapshot of everything the credential store holds.
#[derive(Debug, Clone, Default)]
pub struct StoredCredentials {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<User>,
}

impl StoredCredentials {
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Merge a freshly issued token pair. A refresh response that omits the
    /// refresh token keeps the old one; a missing user keeps the cached user.
    pub fn apply_tokens(&mut self, tokens: &AuthTokens) {
        self.access_token = Some(tokens.access.clone());
        if let Some(refresh) = &tokens.refresh {
            self.refresh_token = Some(refresh.clone());
        }
        if let Some(user) = &tokens.user {
            self.user = Some(user.clone());
        }
    }
}

/// Key-value storage for the session credentials.
///
/// Shared by the HTTP client (bearer header, refresh) and the session
/// state (initial authentication check). Access is not coordinated across
/// processes; two processes sharing a file may race a refresh.
pub trait CredentialStore: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<StoredCredentials, Error>;
    fn save(&self, credentials: &StoredCredentials) -> Result<(), Error>;
    fn clear(&self) -> Result<(), Error>;
}

/// Events emitted by the client when the authentication picture changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    TokenRefreshed,
    /// Refresh failed or was impossible; credentials are gone.
    SessionExpired,
    SignedOut,
}

// ── In-memory store ─────────────────────────────────────────────────

/// Process-local store, used by tests and one-shot invocations.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<StoredCredentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<StoredCredentials, Error> {
        Ok(self.inner.read().expect("credential lock poisoned").clone())
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), Error> {
        *self.inner.write().expect("credential lock poisoned") = credentials.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.inner.write().expect("credential lock poisoned") = StoredCredentials::default();
        Ok(())
    }
}

// ── File-backed store ───────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

/// JSON file holding `access_token`, `refresh_token` and `user`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, file: &CredentialsFile) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(store_error)?;
        }
        let body = serde_json::to_vec_pretty(file).map_err(store_error)?;
        std::fs::write(&self.path, body).map_err(store_error)?;
        restrict_permissions(&self.path)?;
        trace!(path = %self.path.display(), "credentials written");
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<StoredCredentials, Error> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredCredentials::default());
            }
            Err(e) => return Err(store_error(e)),
        };
        let file: CredentialsFile = serde_json::from_slice(&raw).map_err(store_error)?;
        Ok(StoredCredentials {
            access_token: file.access_token.map(SecretString::from),
            refresh_token: file.refresh_token.map(SecretString::from),
            user: file.user,
        })
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), Error> {
        let file = CredentialsFile {
            access_token: credentials
                .access_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            refresh_token: credentials
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            user: credentials.user.clone(),
        };
        self.write_file(&file)
    }

    fn clear(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "credentials cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_error(e)),
        }
    }
}

fn store_error(err: impl fmt::Display) -> Error {
    Error::CredentialStore(err.to_string())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(store_error)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), Error> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ids::EntityId;

    fn sample() -> StoredCredentials {
        StoredCredentials {
            access_token: Some(SecretString::from("access-1".to_owned())),
            refresh_token: Some(SecretString::from("refresh-1".to_owned())),
            user: Some(User {
                id: EntityId::from("U1"),
                email: "analyst@bank.test".into(),
                first_name: Some("Dana".into()),
                last_name: None,
                role: Some("analyst".into()),
                mfa_enabled: false,
            }),
        }
    }

    #[test]
    fn file_store_persists_all_three_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/credentials.json"));
        store.save(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw["access_token"], "access-1");
        assert_eq!(raw["refresh_token"], "refresh-1");
        assert_eq!(raw["user"]["email"], "analyst@bank.test");

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token.unwrap().expose_secret(), "access-1");
        assert_eq!(loaded.user.unwrap().first_name.as_deref(), Some("Dana"));
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert!(!store.load().unwrap().has_access_token());
        store.clear().unwrap();
    }

    #[test]
    fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&sample()).unwrap();
        store.clear().unwrap();
        let loaded = store.load().unwrap();
        assert!(loaded.access_token.is_none());
        assert!(loaded.refresh_token.is_none());
        assert!(loaded.user.is_none());
    }

    #[test]
    fn apply_tokens_keeps_refresh_when_omitted() {
        let mut creds = sample();
        let tokens: AuthTokens = serde_json::from_str(r#"{"access": "access-2"}"#).unwrap();
        creds.apply_tokens(&tokens);
        assert_eq!(creds.access_token.unwrap().expose_secret(), "access-2");
        assert_eq!(creds.refresh_token.unwrap().expose_secret(), "refresh-1");
        assert!(creds.user.is_some());
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryCredentialStore::new();
        store.save(&sample()).unwrap();
        assert!(store.load().unwrap().has_access_token());
        store.clear().unwrap();
        assert!(!store.load().unwrap().has_access_token());
    }
}
