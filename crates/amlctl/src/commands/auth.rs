//! Session command handlers: login, logout, whoami, register.

use std::io::IsTerminal;

use dialoguer::Input;
use secrecy::SecretString;

use amlctl_core::model::{RegisterRequest, User};
use amlctl_core::{Console, GuardDecision, Route, SessionHandle, SignInStep};

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn user_detail(u: &User) -> String {
    output::detail(&[
        ("ID", u.id.to_string()),
        ("Name", u.display_name()),
        ("Email", u.email.clone()),
        ("Role", util::or_dash(u.role.as_deref())),
        ("MFA", if u.mfa_enabled { "enabled" } else { "disabled" }.into()),
    ])
}

fn print_user(user: &User, global: &GlobalOpts) {
    let out = output::render_single(&global.output, user, user_detail, |u| u.email.clone());
    output::print_output(&out, global.quiet);
}

/// Already signed in: sign-in and sign-up are pointless.
fn already_signed_in(console: &Console, route: Route, global: &GlobalOpts) -> bool {
    if console.guard(route) != GuardDecision::Redirect(Route::Dashboard) {
        return false;
    }
    if !global.quiet {
        let who = console
            .session()
            .state()
            .user
            .as_ref()
            .map_or_else(|| "an unknown user".into(), User::display_name);
        eprintln!("Already signed in as {who}. Run `amlctl logout` first.");
    }
    true
}

// ── Login ───────────────────────────────────────────────────────────

pub async fn login(console: &Console, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if already_signed_in(console, Route::SignIn, global) {
        return Ok(());
    }
    let (profile_name, profile, _) = config::active_profile(global)?;

    let email = match args.email.or_else(|| amlctl_config::resolve_email(&profile)) {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err)?,
    };
    let password = match amlctl_config::resolve_password(&profile, &profile_name) {
        Ok(password) => password,
        Err(_) if !std::io::stdin().is_terminal() => {
            return Err(CliError::NoCredentials {
                profile: profile_name,
            });
        }
        Err(_) => SecretString::from(
            rpassword::prompt_password(format!("Password for {email}: ")).map_err(prompt_err)?,
        ),
    };

    let session = console.session();
    if session.sign_in(&email, &password).await? == SignInStep::MfaRequired {
        let interactive = std::io::stdin().is_terminal();
        let mut preset = args.code;
        verify_second_factor(session, |attempt| {
            if let Some(code) = preset.take() {
                return Ok(Some(code));
            }
            if !interactive {
                return if attempt == 1 {
                    Err(CliError::Validation {
                        field: "code".into(),
                        reason: "a verification code is required; pass --code".into(),
                    })
                } else {
                    Ok(None)
                };
            }
            Input::<String>::new()
                .with_prompt("Verification code")
                .interact_text()
                .map(Some)
                .map_err(prompt_err)
        })
        .await?;
    }

    let color = output::should_color(&global.color);
    let who = session
        .state()
        .user
        .as_ref()
        .map_or_else(|| email.clone(), User::display_name);
    output::done(&format!("Signed in as {who}"), global.quiet, color);
    Ok(())
}

const MFA_ATTEMPTS: u32 = 3;

/// Submit codes from `next_code` until one is accepted.
///
/// A wrong code leaves the challenge open, so up to `MFA_ATTEMPTS` codes
/// are tried. The challenge is abandoned when the codes run out or the
/// failure is not a rejected code.
async fn verify_second_factor(
    session: &SessionHandle,
    mut next_code: impl FnMut(u32) -> Result<Option<String>, CliError>,
) -> Result<(), CliError> {
    let mut last_error = None;
    for attempt in 1..=MFA_ATTEMPTS {
        let code = match next_code(attempt) {
            Ok(Some(code)) => code,
            Ok(None) => break,
            Err(e) => {
                session.cancel_mfa();
                return Err(e);
            }
        };
        match session.verify_mfa(&code).await {
            Ok(()) => return Ok(()),
            Err(e) if session.state().mfa_required() => {
                tracing::warn!(attempt, error = %e, "verification code rejected");
                if attempt < MFA_ATTEMPTS {
                    eprintln!("{e}");
                }
                last_error = Some(e);
            }
            Err(e) => {
                session.cancel_mfa();
                return Err(e.into());
            }
        }
    }
    session.cancel_mfa();
    Err(last_error.map_or_else(
        || CliError::Internal("no verification code was entered".into()),
        CliError::from,
    ))
}

// ── Logout ──────────────────────────────────────────────────────────

pub async fn logout(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    if let Err(e) = console.sign_out().await {
        tracing::warn!(error = %e, "server did not confirm sign-out");
        if !global.quiet {
            eprintln!("Server did not confirm sign-out ({e}); local session cleared.");
        }
    }
    output::done("Signed out", global.quiet, output::should_color(&global.color));
    Ok(())
}

// ── Whoami ──────────────────────────────────────────────────────────

pub async fn whoami(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    util::require(console, Route::Settings)?;
    let user = console.session().refresh_user().await?;
    print_user(&user, global);
    Ok(())
}

// ── Register ────────────────────────────────────────────────────────

pub async fn register(
    console: &Console,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if already_signed_in(console, Route::SignUp, global) {
        return Ok(());
    }

    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    let confirm = rpassword::prompt_password("Confirm password: ").map_err(prompt_err)?;

    let form = RegisterRequest {
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        organization: args.organization,
        password: SecretString::from(password),
        password_confirm: SecretString::from(confirm),
    };
    let user = console.session().register(&form).await?;
    output::done(
        &format!("Account created for {}. Sign in with: amlctl login", user.email),
        global.quiet,
        output::should_color(&global.color),
    );
    print_user(&user, global);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use amlctl_core::{ConsoleConfig, SessionPhase};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn challenged_console() -> (MockServer, Console) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"mfa_required": true, "user_id": "U9"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/mfa/verify/"))
            .and(body_partial_json(json!({"code": "222222"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": "a-1",
                "refresh": "r-1",
                "user": {"id": "U9", "email": "analyst@bank.test"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/mfa/verify/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid code"})),
            )
            .mount(&server)
            .await;

        let api = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let console = Console::new(&ConsoleConfig::new(api.clone(), api)).unwrap();
        console
            .session()
            .sign_in("analyst@bank.test", &SecretString::from("hunter22".to_owned()))
            .await
            .unwrap();
        (server, console)
    }

    #[tokio::test]
    async fn wrong_code_can_be_retried() {
        let (_server, console) = challenged_console().await;
        let mut codes = vec!["222222", "111111"];

        verify_second_factor(console.session(), |_| Ok(codes.pop().map(String::from)))
            .await
            .unwrap();

        assert!(console.session().state().is_authenticated);
    }

    #[tokio::test]
    async fn challenge_is_abandoned_after_the_last_attempt() {
        let (_server, console) = challenged_console().await;
        let mut asked = 0;

        let err = verify_second_factor(console.session(), |_| {
            asked += 1;
            Ok(Some("111111".into()))
        })
        .await
        .unwrap_err();

        assert_eq!(asked, MFA_ATTEMPTS);
        assert!(err.to_string().contains("Invalid code"), "{err}");
        assert_eq!(console.session().state().phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn running_out_of_codes_cancels_the_challenge() {
        let (_server, console) = challenged_console().await;
        let mut codes = vec!["111111"];

        let err = verify_second_factor(console.session(), |_| Ok(codes.pop().map(String::from)))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Invalid code"), "{err}");
        assert!(!console.session().state().mfa_required());
    }
}
