// Session endpoints
//
// Sign-in (with optional second factor), sign-up, current user and
// sign-out. Credential persistence happens here so every caller sees the
// same three stored keys regardless of which flow issued the tokens.

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::{AuthEvent, StoredCredentials};
use crate::client::{ApiClient, Backend, error_from_body};
use crate::error::Error;
use crate::ids::EntityId;
use crate::models::{AuthTokens, LoginOutcome, RegisterRequest, User};

const LOGIN_PATH: &[&str] = &["auth", "login"];
const MFA_VERIFY_PATH: &[&str] = &["auth", "mfa", "verify"];
const LOGOUT_PATH: &[&str] = &["auth", "logout"];
const ME_PATH: &[&str] = &["auth", "me"];
const REGISTER_PATH: &[&str] = &["auth", "register"];

/// Sign-in response: either a token pair or an MFA challenge.
#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    mfa_required: bool,
    #[serde(default)]
    user_id: Option<EntityId>,
    #[serde(default, alias = "access_token", alias = "token")]
    access: Option<String>,
    #[serde(default, alias = "refresh_token")]
    refresh: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

impl LoginResponse {
    fn into_tokens(self) -> Option<AuthTokens> {
        let access = self.access?;
        Some(AuthTokens {
            access: SecretString::from(access),
            refresh: self.refresh.map(SecretString::from),
            user: self.user,
        })
    }
}

impl ApiClient {
    /// Submit email + password.
    ///
    /// Returns [`LoginOutcome::MfaRequired`] when the account has a second
    /// factor; tokens are only stored once the challenge is passed.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginOutcome, Error> {
        debug!(email, "signing in");
        let request = self
            .request(Method::POST, Backend::General, LOGIN_PATH)?
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))?
            .anonymous();

        let resp: LoginResponse = self.send(&request).await?;

        if resp.mfa_required {
            let user_id = resp.user_id.ok_or_else(|| Error::Deserialization {
                message: "MFA challenge without user_id".into(),
                body: String::new(),
            })?;
            info!(%user_id, "second factor required");
            return Ok(LoginOutcome::MfaRequired {
                user_id: user_id.to_string(),
            });
        }

        let tokens = resp.into_tokens().ok_or_else(|| Error::Deserialization {
            message: "sign-in response carried neither tokens nor an MFA challenge".into(),
            body: String::new(),
        })?;
        self.persist_session(&tokens)?;
        info!("signed in");
        Ok(LoginOutcome::Authenticated(tokens))
    }

    /// Answer an MFA challenge with a TOTP (6 digits) or backup (8 digits) code.
    ///
    /// Code shape is not checked here; callers gate it before the round trip.
    pub async fn verify_mfa(&self, user_id: &str, code: &str) -> Result<AuthTokens, Error> {
        debug!(user_id, "verifying second factor");
        let request = self
            .request(Method::POST, Backend::General, MFA_VERIFY_PATH)?
            .json(&json!({ "user_id": user_id, "code": code }))?
            .anonymous();

        let tokens: AuthTokens = self.send(&request).await?;
        self.persist_session(&tokens)?;
        info!("second factor accepted");
        Ok(tokens)
    }

    /// End the session.
    ///
    /// Local credentials are cleared whatever the server answers; the
    /// returned error only reports the server-side outcome.
    pub async fn logout(&self) -> Result<(), Error> {
        let refresh = self
            .credentials()
            .load()
            .ok()
            .and_then(|c| c.refresh_token)
            .map(|t| t.expose_secret().to_owned());

        let outcome = self.server_logout(refresh).await;
        if let Err(e) = &outcome {
            warn!(error = %e, "server-side sign-out failed, clearing local session anyway");
        }

        self.credentials().clear()?;
        self.emit(AuthEvent::SignedOut);
        info!("signed out");
        outcome
    }

    async fn server_logout(&self, refresh: Option<String>) -> Result<(), Error> {
        let request = self
            .request(Method::POST, Backend::General, LOGOUT_PATH)?
            .json(&json!({ "refresh": refresh }))?
            .without_refresh();
        let resp = self.execute(&request).await?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            // An already-expired token means the server session is gone too.
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }

    /// Fetch the signed-in user and refresh the cached copy.
    pub async fn current_user(&self) -> Result<User, Error> {
        let user: User = self.get(Backend::General, ME_PATH, Vec::new()).await?;
        let mut stored = self.credentials().load()?;
        if stored.has_access_token() {
            stored.user = Some(user.clone());
            self.credentials().save(&stored)?;
        }
        Ok(user)
    }

    /// Create an analyst account. Does not sign in.
    pub async fn register(&self, form: &RegisterRequest) -> Result<User, Error> {
        debug!(email = %form.email, "registering account");
        let request = self
            .request(Method::POST, Backend::General, REGISTER_PATH)?
            .json(&json!({
                "email": form.email,
                "first_name": form.first_name,
                "last_name": form.last_name,
                "organization": form.organization,
                "password": form.password.expose_secret(),
                "password_confirm": form.password_confirm.expose_secret(),
            }))?
            .anonymous();
        self.send(&request).await
    }

    /// Replace stored credentials with a freshly issued token pair.
    fn persist_session(&self, tokens: &AuthTokens) -> Result<(), Error> {
        let mut stored = StoredCredentials::default();
        stored.apply_tokens(tokens);
        self.credentials().save(&stored)?;
        self.emit(AuthEvent::SignedIn);
        Ok(())
    }
}
