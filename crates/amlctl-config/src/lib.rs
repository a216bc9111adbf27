//! Shared configuration for amlctl.
//!
//! TOML profiles, backend URL resolution (profile + `AML_API_URL` /
//! `AML_DFSA_API_URL` overrides), password lookup (env, keyring,
//! plaintext) and translation to `amlctl_core::ConsoleConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use amlctl_core::{ConsoleConfig, CredentialStorage, TlsVerification};

/// Environment override for the general backend URL.
pub const API_URL_ENV: &str = "AML_API_URL";
/// Environment override for the DFSA regulatory backend URL.
pub const DFSA_API_URL_ENV: &str = "AML_DFSA_API_URL";
pub const PASSWORD_ENV: &str = "AMLCTL_PASSWORD";
pub const EMAIL_ENV: &str = "AMLCTL_EMAIL";

const KEYRING_SERVICE: &str = "amlctl";
const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit, then configured default.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up `name`. The `default` profile is synthesised when absent so
    /// a bare `AML_API_URL` is enough to run.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile(name.into())),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named pair of backends plus the analyst who signs in to them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// General backend base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// DFSA regulatory backend base URL. Falls back to `api_url`.
    pub regulatory_url: Option<String>,

    /// Sign-in email.
    pub email: Option<String>,

    /// Password (plaintext; prefer keyring or `AMLCTL_PASSWORD`).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,

    /// Where tokens are persisted between runs.
    pub credentials_file: Option<PathBuf>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            regulatory_url: None,
            email: None,
            password: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            credentials_file: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "amlctl", "amlctl")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default token file for a profile.
pub fn default_credentials_path(profile_name: &str) -> PathBuf {
    let dir = project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    );
    if profile_name == "default" {
        dir.join("credentials.json")
    } else {
        dir.join(format!("credentials-{profile_name}.json"))
    }
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("amlctl");
    p
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load config from the canonical path + `AMLCTL_*` environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then `path` (if it exists), then `AMLCTL_*` variables with
/// `__` as the nesting separator (`AMLCTL_DEFAULTS__TIMEOUT=60`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AMLCTL_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Backend URLs ────────────────────────────────────────────────────

/// General and regulatory URLs, with environment overrides applied.
///
/// `lookup` reads an environment variable; pass `|k| std::env::var(k).ok()`.
pub fn resolve_urls(
    profile: &Profile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(Url, Url), ConfigError> {
    let api = lookup(API_URL_ENV).unwrap_or_else(|| profile.api_url.clone());
    let regulatory = lookup(DFSA_API_URL_ENV)
        .or_else(|| profile.regulatory_url.clone())
        .unwrap_or_else(|| api.clone());
    Ok((parse_url("api_url", &api)?, parse_url("regulatory_url", &regulatory)?))
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

// ── Credential resolution ───────────────────────────────────────────

/// Sign-in email: profile, then `AMLCTL_EMAIL`.
pub fn resolve_email(profile: &Profile) -> Option<String> {
    profile
        .email
        .clone()
        .or_else(|| std::env::var(EMAIL_ENV).ok())
}

/// Password: `AMLCTL_PASSWORD`, then system keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .map_err(|e| ConfigError::Keyring(e.to_string()))?;
    entry
        .set_password(password.expose_secret())
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

fn keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ConsoleConfig` from a profile, with environment URL overrides.
pub fn profile_to_console_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let (api_url, regulatory_url) = resolve_urls(profile, |k| std::env::var(k).ok())?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let credentials = profile
        .credentials_file
        .clone()
        .unwrap_or_else(|| default_credentials_path(profile_name));

    Ok(ConsoleConfig {
        api_url,
        regulatory_url,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        credentials: CredentialStorage::File(credentials),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile(api_url: &str, regulatory_url: Option<&str>) -> Profile {
        Profile {
            api_url: api_url.into(),
            regulatory_url: regulatory_url.map(Into::into),
            ..Profile::default()
        }
    }

    #[test]
    fn regulatory_url_falls_back_to_api_url() {
        let (api, reg) = resolve_urls(&profile("https://aml.test/api", None), |_| None).unwrap();
        assert_eq!(api, reg);
    }

    #[test]
    fn environment_overrides_profile_urls() {
        let p = profile("https://aml.test/api", Some("https://dfsa.aml.test/api"));
        let (api, reg) = resolve_urls(&p, |key| match key {
            API_URL_ENV => Some("https://staging.aml.test/api".into()),
            DFSA_API_URL_ENV => Some("https://staging-dfsa.aml.test/api".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(api.as_str(), "https://staging.aml.test/api");
        assert_eq!(reg.as_str(), "https://staging-dfsa.aml.test/api");
    }

    #[test]
    fn non_http_urls_are_rejected() {
        let err = resolve_urls(&profile("ftp://aml.test", None), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn load_reads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "prod"

[defaults]
timeout = 45

[profiles.prod]
api_url = "https://aml.bank.test/api/v1"
regulatory_url = "https://dfsa.bank.test/api/v1"
email = "analyst@bank.test"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.profile_name(None), "prod");
        assert_eq!(cfg.defaults.timeout, 45);
        let prod = cfg.profile("prod").unwrap();
        assert_eq!(prod.email.as_deref(), Some("analyst@bank.test"));
        assert!(matches!(cfg.profile("staging"), Err(ConfigError::UnknownProfile(_))));
    }

    #[test]
    fn missing_default_profile_is_synthesised() {
        let cfg = Config::default();
        let p = cfg.profile("default").unwrap();
        assert_eq!(p.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut cfg = Config::default();
        cfg.profiles
            .insert("default".into(), profile("https://aml.test/api", None));
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].api_url, "https://aml.test/api");
    }

    #[test]
    fn credentials_path_is_per_profile() {
        let default = default_credentials_path("default");
        let other = default_credentials_path("staging");
        assert!(default.ends_with("credentials.json"));
        assert!(other.ends_with("credentials-staging.json"));
    }

    #[test]
    fn console_config_prefers_profile_timeout_and_ca() {
        let mut p = profile("https://aml.test/api", None);
        p.timeout = Some(5);
        p.ca_cert = Some(PathBuf::from("/etc/aml/ca.pem"));
        p.credentials_file = Some(PathBuf::from("/tmp/aml-creds.json"));
        let cfg = profile_to_console_config(&p, "default", &Defaults::default()).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.tls, TlsVerification::CustomCa(PathBuf::from("/etc/aml/ca.pem")));
        assert_eq!(
            cfg.credentials,
            CredentialStorage::File(PathBuf::from("/tmp/aml-creds.json"))
        );
    }
}
