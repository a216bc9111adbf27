// ── Navigation surface and route guard ──

use strum::{Display, EnumIter, IntoStaticStr};

use crate::session::SessionState;

/// Every navigable view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Route {
    SignIn,
    SignUp,
    Dashboard,
    Customers,
    Transactions,
    Alerts,
    Cases,
    Analytics,
    Reports,
    Settings,
    Devices,
    Regulatory,
    Verification,
    Risk,
    Ai,
    Admin,
    Screening,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::SignIn => "/login",
            Self::SignUp => "/register",
            Self::Dashboard => "/dashboard",
            Self::Customers => "/customers",
            Self::Transactions => "/transactions",
            Self::Alerts => "/alerts",
            Self::Cases => "/cases",
            Self::Analytics => "/analytics",
            Self::Reports => "/reports",
            Self::Settings => "/settings",
            Self::Devices => "/settings/devices",
            Self::Regulatory => "/regulatory",
            Self::Verification => "/verification",
            Self::Risk => "/risk",
            Self::Ai => "/ai",
            Self::Admin => "/admin",
            Self::Screening => "/screening",
        }
    }

    /// Reachable without a session.
    pub fn is_public(self) -> bool {
        matches!(self, Self::SignIn | Self::SignUp)
    }

    /// Resolve a path, including nested sub-paths (`/regulatory/dfsa/...`),
    /// to the view that owns it. `/` is the dashboard.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Self::Dashboard);
        }
        <Self as strum::IntoEnumIterator>::iter()
            .filter(|route| {
                let base = route.path();
                trimmed == base
                    || trimmed
                        .strip_prefix(base)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|route| route.path().len())
    }
}

/// What the guard decided for a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(Route),
    /// The initial authentication check has not finished; render nothing.
    Wait,
}

/// Gate a navigation on the session.
///
/// Protected routes redirect to sign-in unless authenticated. A signed-in
/// user visiting sign-in or sign-up lands on the dashboard.
pub fn guard(route: Route, session: &SessionState) -> GuardDecision {
    if !session.initialized {
        return GuardDecision::Wait;
    }
    match (route.is_public(), session.is_authenticated) {
        (true, true) => GuardDecision::Redirect(Route::Dashboard),
        (true, false) | (false, true) => GuardDecision::Render,
        (false, false) => GuardDecision::Redirect(Route::SignIn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(initialized: bool, authenticated: bool) -> SessionState {
        SessionState {
            initialized,
            is_authenticated: authenticated,
            ..SessionState::default()
        }
    }

    #[test]
    fn waits_during_initial_check() {
        assert_eq!(guard(Route::Alerts, &session(false, false)), GuardDecision::Wait);
        assert_eq!(guard(Route::SignIn, &session(false, false)), GuardDecision::Wait);
    }

    #[test]
    fn anonymous_is_sent_to_sign_in() {
        let anon = session(true, false);
        assert_eq!(guard(Route::Cases, &anon), GuardDecision::Redirect(Route::SignIn));
        assert_eq!(guard(Route::SignIn, &anon), GuardDecision::Render);
        assert_eq!(guard(Route::SignUp, &anon), GuardDecision::Render);
    }

    #[test]
    fn mfa_challenge_is_not_authenticated() {
        let mut challenged = session(true, false);
        challenged.mfa_user_id = Some("U9".into());
        assert_eq!(
            guard(Route::Dashboard, &challenged),
            GuardDecision::Redirect(Route::SignIn)
        );
    }

    #[test]
    fn authenticated_renders_protected_routes() {
        let authed = session(true, true);
        assert_eq!(guard(Route::Reports, &authed), GuardDecision::Render);
        assert_eq!(
            guard(Route::SignIn, &authed),
            GuardDecision::Redirect(Route::Dashboard)
        );
    }

    #[test]
    fn nested_paths_resolve_to_owner() {
        assert_eq!(Route::from_path("/regulatory/dfsa/str"), Some(Route::Regulatory));
        assert_eq!(Route::from_path("/settings/devices"), Some(Route::Devices));
        assert_eq!(Route::from_path("/settings"), Some(Route::Settings));
        assert_eq!(Route::from_path("/alerts/?page=2"), Some(Route::Alerts));
        assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/alertsx"), None);
        assert_eq!(Route::from_path("/nowhere"), None);
    }
}
