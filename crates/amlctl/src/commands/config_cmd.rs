//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;

use amlctl_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn non_empty(field: &str, value: String) -> Result<String, CliError> {
    if value.trim().is_empty() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(value)
}

/// Apply `key = value` to a profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => profile.api_url = non_empty(key, value)?,
        "regulatory_url" | "regulatory-url" | "dfsa_api_url" | "dfsa-api-url" => {
            profile.regulatory_url = Some(non_empty(key, value)?);
        }
        "email" => profile.email = Some(value),
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "credentials_file" | "credentials-file" => profile.credentials_file = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api_url, regulatory_url, \
                     email, insecure, timeout, ca_cert, credentials_file"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = amlctl_config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n# {e}")),
                |_| amlctl_config::config_path().display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = amlctl_config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_value(profile, &key, value)?;

            amlctl_config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = amlctl_config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: amlctl config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = amlctl_config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            amlctl_config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = amlctl_config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(config::profile_not_found(&cfg, profile_name));
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            let secret = SecretString::from(non_empty("password", secret)?);
            amlctl_config::store_password(&profile_name, &secret)?;

            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

fn init() -> Result<(), CliError> {
    let config_path = amlctl_config::config_path();
    eprintln!("amlctl configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let api_url: String = Input::new()
        .with_prompt("Backend URL")
        .default("http://localhost:8000/api/v1".into())
        .interact_text()
        .map_err(prompt_err)?;

    let regulatory_url: String = Input::new()
        .with_prompt("DFSA regulatory backend URL")
        .default(api_url.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let email: String = Input::new()
        .with_prompt("Sign-in email")
        .interact_text()
        .map_err(prompt_err)?;

    let store_choices = &[
        "Store password in system keyring (recommended)",
        "Prompt for it at every login",
    ];
    let store_selection = Select::new()
        .with_prompt("Password storage")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if store_selection == 0 {
        let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
        let password = SecretString::from(non_empty("password", password)?);
        amlctl_config::store_password(&profile_name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
    }

    let profile = Profile {
        api_url,
        regulatory_url: Some(regulatory_url),
        email: Some(email),
        ..Profile::default()
    };

    let mut cfg: Config = amlctl_config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    amlctl_config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Next: amlctl login");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_updates_known_keys() {
        let mut profile = Profile::default();
        set_profile_value(&mut profile, "regulatory-url", "https://dfsa.test/api".into())
            .unwrap_or_else(|e| panic!("{e}"));
        set_profile_value(&mut profile, "timeout", "90".into()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(profile.regulatory_url.as_deref(), Some("https://dfsa.test/api"));
        assert_eq!(profile.timeout, Some(90));
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut profile = Profile::default();
        assert!(matches!(
            set_profile_value(&mut profile, "site", "x".into()),
            Err(CliError::Validation { ref field, .. }) if field == "site"
        ));
        assert!(set_profile_value(&mut profile, "insecure", "maybe".into()).is_err());
        assert!(set_profile_value(&mut profile, "api_url", "  ".into()).is_err());
    }
}
