// ── Session state machine ──
//
//   Anonymous ──sign_in──▶ Pending ──▶ Authenticated
//                                  ├─▶ MfaChallenged ──verify_mfa──▶ Authenticated
//                                  └─▶ Anonymous + error
//   MfaChallenged ──cancel_mfa──▶ Anonymous
//   Authenticated ──sign_out / expiry──▶ Anonymous
//
// Client-side checks (MFA code shape, registration fields) fail before any
// request is made.

use std::sync::Arc;

use amlctl_api::ApiClient;
use amlctl_api::models::{AuthTokens, LoginOutcome};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{RegisterRequest, User};
use crate::stream::StateStream;

const MIN_PASSWORD_LEN: usize = 8;

/// Observable authentication state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub loading: bool,
    /// Set once stored credentials have been inspected at start-up.
    pub initialized: bool,
    pub error: Option<CoreError>,
    /// User holding an open MFA challenge.
    pub mfa_user_id: Option<String>,
}

/// Coarse phase derived from [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Pending,
    MfaChallenged,
    Authenticated,
}

impl SessionState {
    pub fn mfa_required(&self) -> bool {
        self.mfa_user_id.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated {
            SessionPhase::Authenticated
        } else if self.mfa_required() {
            SessionPhase::MfaChallenged
        } else if self.loading {
            SessionPhase::Pending
        } else {
            SessionPhase::Anonymous
        }
    }

    fn signed_out() -> Self {
        Self {
            initialized: true,
            ..Self::default()
        }
    }
}

/// What a successful credential submission led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStep {
    Authenticated,
    MfaRequired,
}

/// A TOTP code is 6 digits, a backup code 8.
pub fn is_valid_mfa_code(code: &str) -> bool {
    matches!(code.len(), 6 | 8) && code.bytes().all(|b| b.is_ascii_digit())
}

/// Field checks run before a sign-up request is sent.
pub fn validate_registration(form: &RegisterRequest) -> Result<(), CoreError> {
    let mut errors = Vec::new();

    let email = form.email.trim();
    let plausible = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !plausible {
        errors.push(amlctl_api::FieldError::new("email", "Enter a valid email address"));
    }
    if form.first_name.trim().is_empty() {
        errors.push(amlctl_api::FieldError::new("first_name", "First name is required"));
    }
    if form.last_name.trim().is_empty() {
        errors.push(amlctl_api::FieldError::new("last_name", "Last name is required"));
    }
    let password = form.password.expose_secret();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(amlctl_api::FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password != form.password_confirm.expose_secret() {
        errors.push(amlctl_api::FieldError::new("password_confirm", "Passwords do not match"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation {
            message: "Please correct the highlighted fields".into(),
            field_errors: errors,
        })
    }
}

/// Handle over the session state. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    api: Arc<ApiClient>,
    state: Arc<watch::Sender<Arc<SessionState>>>,
}

impl SessionHandle {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(Arc::new(SessionState::default()));
        Self {
            api,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> Arc<SessionState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream<SessionState> {
        StateStream::new(self.state.subscribe())
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.state.send_modify(|state| f(Arc::make_mut(state)));
    }

    fn fail(&self, error: CoreError) -> CoreError {
        let stored = error.clone();
        self.update(|s| {
            s.loading = false;
            s.error = Some(stored);
        });
        error
    }

    /// Initial authentication check against the persisted credentials.
    ///
    /// Does not contact the backend: a stored access token counts as
    /// signed in until a request proves otherwise.
    pub fn restore(&self) -> Arc<SessionState> {
        let restored = match self.api.credentials().load() {
            Ok(stored) if stored.has_access_token() => SessionState {
                user: stored.user,
                is_authenticated: true,
                initialized: true,
                ..SessionState::default()
            },
            Ok(_) => SessionState::signed_out(),
            Err(e) => {
                warn!(error = %e, "could not read stored credentials");
                SessionState::signed_out()
            }
        };
        debug!(authenticated = restored.is_authenticated, "session restored");
        self.state.send_replace(Arc::new(restored));
        self.state()
    }

    /// Submit email and password.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignInStep, CoreError> {
        if email.trim().is_empty() {
            return Err(self.fail(CoreError::invalid("email", "Email is required")));
        }
        if password.expose_secret().is_empty() {
            return Err(self.fail(CoreError::invalid("password", "Password is required")));
        }

        self.update(|s| {
            s.loading = true;
            s.error = None;
            s.mfa_user_id = None;
        });

        match self.api.login(email.trim(), password).await {
            Ok(LoginOutcome::Authenticated(tokens)) => {
                self.complete_sign_in(tokens).await;
                Ok(SignInStep::Authenticated)
            }
            Ok(LoginOutcome::MfaRequired { user_id }) => {
                info!(%user_id, "waiting for verification code");
                self.update(|s| {
                    s.loading = false;
                    s.mfa_user_id = Some(user_id);
                });
                Ok(SignInStep::MfaRequired)
            }
            Err(e) => Err(self.fail(CoreError::from(e))),
        }
    }

    /// Answer the open MFA challenge.
    ///
    /// Codes that are not 6 or 8 digits are rejected without a request.
    /// A backend rejection keeps the challenge open for another attempt.
    pub async fn verify_mfa(&self, code: &str) -> Result<(), CoreError> {
        let Some(user_id) = self.state().mfa_user_id.clone() else {
            return Err(self.fail(CoreError::invalid("code", "No verification in progress")));
        };
        let code = code.trim();
        if !is_valid_mfa_code(code) {
            return Err(self.fail(CoreError::invalid(
                "code",
                "Enter the 6-digit code from your authenticator or an 8-digit backup code",
            )));
        }

        self.update(|s| {
            s.loading = true;
            s.error = None;
        });
        match self.api.verify_mfa(&user_id, code).await {
            Ok(tokens) => {
                self.complete_sign_in(tokens).await;
                Ok(())
            }
            Err(e) => Err(self.fail(CoreError::from(e))),
        }
    }

    /// Abandon the MFA challenge and return to the sign-in form.
    pub fn cancel_mfa(&self) {
        self.update(|s| {
            s.mfa_user_id = None;
            s.error = None;
            s.loading = false;
        });
    }

    /// Sign out. The local session is cleared whatever the server says;
    /// the result only reports the server-side call.
    pub(crate) async fn sign_out(&self) -> Result<(), CoreError> {
        let outcome = self.api.logout().await.map_err(CoreError::from);
        self.state.send_replace(Arc::new(SessionState::signed_out()));
        outcome
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, form: &RegisterRequest) -> Result<User, CoreError> {
        if let Err(e) = validate_registration(form) {
            return Err(self.fail(e));
        }
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });
        match self.api.register(form).await {
            Ok(user) => {
                self.update(|s| s.loading = false);
                info!(email = %user.email, "account registered");
                Ok(user)
            }
            Err(e) => Err(self.fail(CoreError::from(e))),
        }
    }

    /// Re-read the current user from the backend.
    pub async fn refresh_user(&self) -> Result<User, CoreError> {
        match self.api.current_user().await {
            Ok(user) => {
                let cached = user.clone();
                self.update(|s| s.user = Some(cached));
                Ok(user)
            }
            Err(e) => {
                let error = CoreError::from(e);
                if error.is_session_expired() {
                    self.expire();
                }
                Err(error)
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| {
            if state.error.is_none() {
                return false;
            }
            Arc::make_mut(state).error = None;
            true
        });
    }

    /// Credentials were cleared underneath us (failed refresh).
    pub(crate) fn expire(&self) {
        info!("session expired");
        self.state.send_replace(Arc::new(SessionState {
            error: Some(CoreError::SessionExpired),
            ..SessionState::signed_out()
        }));
    }

    async fn complete_sign_in(&self, tokens: AuthTokens) {
        let user = match tokens.user {
            Some(user) => Some(user),
            None => match self.api.current_user().await {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "signed in but could not load the user profile");
                    None
                }
            },
        };
        self.update(|s| {
            s.user = user;
            s.is_authenticated = true;
            s.initialized = true;
            s.loading = false;
            s.error = None;
            s.mfa_user_id = None;
        });
        info!("session authenticated");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            email: "analyst@bank.test".into(),
            first_name: "Dana".into(),
            last_name: "Idris".into(),
            organization: None,
            password: SecretString::from(password.to_owned()),
            password_confirm: SecretString::from(confirm.to_owned()),
        }
    }

    #[test]
    fn mfa_codes_must_be_six_or_eight_digits() {
        assert!(is_valid_mfa_code("123456"));
        assert!(is_valid_mfa_code("12345678"));
        assert!(!is_valid_mfa_code("12345"));
        assert!(!is_valid_mfa_code("1234567"));
        assert!(!is_valid_mfa_code("123456789"));
        assert!(!is_valid_mfa_code("12a456"));
        assert!(!is_valid_mfa_code(""));
    }

    #[test]
    fn registration_accepts_valid_form() {
        assert!(validate_registration(&form("correct-horse", "correct-horse")).is_ok());
    }

    #[test]
    fn registration_collects_every_field_error() {
        let mut bad = form("short", "different");
        bad.email = "not-an-email".into();
        bad.first_name = " ".into();
        let err = validate_registration(&bad).unwrap_err();
        let fields: Vec<_> = err
            .field_errors()
            .iter()
            .filter_map(|e| e.field.as_deref())
            .collect();
        assert_eq!(fields, vec!["email", "first_name", "password", "password_confirm"]);
    }

    #[test]
    fn phase_follows_flags() {
        let mut state = SessionState::default();
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        state.loading = true;
        assert_eq!(state.phase(), SessionPhase::Pending);
        state.mfa_user_id = Some("U9".into());
        assert_eq!(state.phase(), SessionPhase::MfaChallenged);
        state.is_authenticated = true;
        assert_eq!(state.phase(), SessionPhase::Authenticated);
    }
}
