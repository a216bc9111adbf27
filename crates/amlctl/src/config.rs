//! Profile resolution for the running command.
//!
//! File, environment and flag layers meet here; core only ever sees the
//! resulting `ConsoleConfig`.

use amlctl_config::{Config, ConfigError, Profile};
use amlctl_core::{ConsoleConfig, TlsVerification};
use url::Url;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// `--profile` / `AMLCTL_PROFILE`, then the configured default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    cfg.profile_name(global.profile.as_deref())
}

/// Active profile, with a helpful error listing what exists.
pub fn active_profile(global: &GlobalOpts) -> Result<(String, Profile, Config), CliError> {
    let cfg = amlctl_config::load_config()?;
    let name = active_profile_name(global, &cfg);
    match cfg.profile(&name) {
        Ok(profile) => Ok((name, profile, cfg)),
        Err(ConfigError::UnknownProfile(_)) => Err(profile_not_found(&cfg, name)),
        Err(e) => Err(e.into()),
    }
}

pub fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Build a `ConsoleConfig` from the config file, profile, environment and
/// flags, in increasing precedence.
pub fn build_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let (name, mut profile, cfg) = active_profile(global)?;

    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let mut console = amlctl_config::profile_to_console_config(&profile, &name, &cfg.defaults)?;

    if let Some(ref raw) = global.api_url {
        console.api_url = parse_flag_url("api-url", raw)?;
        let regulatory_configured = profile.regulatory_url.is_some()
            || std::env::var_os(amlctl_config::DFSA_API_URL_ENV).is_some();
        if !regulatory_configured {
            console.regulatory_url = console.api_url.clone();
        }
    }
    if let Some(ref raw) = global.dfsa_api_url {
        console.regulatory_url = parse_flag_url("dfsa-api-url", raw)?;
    }
    if global.insecure {
        console.tls = TlsVerification::DangerAcceptInvalid;
    }

    tracing::debug!(
        profile = %name,
        api = %console.api_url,
        regulatory = %console.regulatory_url,
        "console configured"
    );
    Ok(console)
}

fn parse_flag_url(field: &str, raw: &str) -> Result<Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}
