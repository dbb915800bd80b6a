//! Session guard.
//!
//! Tracks whether an admin is signed in and decides, per route, whether a
//! view renders, waits, or redirects. The guard starts in
//! [`SessionState::Unknown`] and leaves it exactly once, when
//! [`SessionGuard::mount`] resolves the current session. After that it
//! follows every session change the auth service pushes.

use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::auth::{AuthError, AuthEvent, Session, SessionUser};
use crate::client::SiteClient;

/// Pages of the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminPage {
    Overview,
    Hero,
    Portfolio,
    News,
    Messages,
    Users,
    Settings,
}

impl AdminPage {
    /// Dashboard menu order.
    pub const ALL: [Self; 7] = [
        Self::Overview,
        Self::Hero,
        Self::Portfolio,
        Self::News,
        Self::Messages,
        Self::Users,
        Self::Settings,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Overview => "/admin",
            Self::Hero => "/admin/hero",
            Self::Portfolio => "/admin/portfolio",
            Self::News => "/admin/news",
            Self::Messages => "/admin/messages",
            Self::Users => "/admin/users",
            Self::Settings => "/admin/settings",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Hero => "Hero Images",
            Self::Portfolio => "Portfolio",
            Self::News => "News",
            Self::Messages => "Messages",
            Self::Users => "Users",
            Self::Settings => "Settings",
        }
    }
}

/// A navigable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Admin(AdminPage),
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/auth",
            Self::Admin(page) => page.path(),
        }
    }

    /// Route for `path`, ignoring one trailing slash.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        match path {
            "/" => Some(Self::Home),
            "/auth" => Some(Self::Login),
            _ => AdminPage::ALL
                .into_iter()
                .find(|page| page.path() == path)
                .map(Self::Admin),
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin(_))
    }
}

/// What the guard knows about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not resolved yet.
    Unknown,
    Authenticated(SessionUser),
    Unauthenticated,
}

/// What a route should do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Show a loading state; the session is still being resolved.
    Loading,
    Render,
    Redirect(Route),
}

/// Gates admin routes on the current session.
pub struct SessionGuard {
    client: SiteClient,
    state: Arc<watch::Sender<SessionState>>,
    follower: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

fn resolved_state(result: Result<Option<Session>, AuthError>) -> SessionState {
    match result {
        Ok(Some(session)) => SessionState::Authenticated(session.user),
        Ok(None) => SessionState::Unauthenticated,
        Err(e) => {
            warn!(error = %e, "Could not resolve session");
            SessionState::Unauthenticated
        }
    }
}

impl SessionGuard {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            state: Arc::new(watch::channel(SessionState::Unknown).0),
            follower: None,
        }
    }

    /// Resolve the current session and start following session changes.
    /// Mounting twice is a no-op.
    pub async fn mount(&mut self) {
        if self.follower.is_some() {
            return;
        }
        let auth = Arc::clone(self.client.auth());
        // Subscribe first so no change between resolve and follow is lost.
        let mut events = auth.subscribe();
        self.state.send_replace(resolved_state(auth.current_session().await));

        let state = Arc::clone(&self.state);
        self.follower = Some(tokio::spawn(async move {
            loop {
                let next = match events.recv().await {
                    Ok(AuthEvent::SignedIn(session)) => SessionState::Authenticated(session.user),
                    Ok(AuthEvent::SignedOut) => SessionState::Unauthenticated,
                    Err(RecvError::Lagged(_)) => resolved_state(auth.current_session().await),
                    Err(RecvError::Closed) => return,
                };
                debug!(state = ?next, "Session changed");
                state.send_replace(next);
            }
        }));
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait until the session is resolved.
    pub async fn resolved(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        rx.wait_for(|s| *s != SessionState::Unknown)
            .await
            .map_or(SessionState::Unauthenticated, |s| s.clone())
    }

    /// Signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        match &*self.state.borrow() {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// Decide what `route` does in the current state.
    #[must_use]
    pub fn gate(&self, route: Route) -> GateDecision {
        let state = self.state.borrow();
        match (route, &*state) {
            (Route::Admin(_), SessionState::Unknown) => GateDecision::Loading,
            (Route::Admin(_), SessionState::Unauthenticated) => GateDecision::Redirect(Route::Login),
            (Route::Login, SessionState::Authenticated(_)) => {
                GateDecision::Redirect(Route::Admin(AdminPage::Overview))
            }
            _ => GateDecision::Render,
        }
    }

    /// Sign in. Returns where to navigate on success.
    pub async fn login(&self, email: &str, password: &str) -> Option<Route> {
        let notifier = self.client.notifier();
        if email.trim().is_empty() || password.is_empty() {
            notifier.error("Email and password are required");
            return None;
        }
        match self.client.auth().sign_in(email.trim(), password).await {
            Ok(session) => {
                self.state.send_replace(SessionState::Authenticated(session.user));
                notifier.success("Welcome back!");
                Some(Route::Admin(AdminPage::Overview))
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                notifier.error(e.to_string());
                None
            }
        }
    }

    /// Sign out. Returns where to navigate on success.
    pub async fn logout(&self) -> Option<Route> {
        let notifier = self.client.notifier();
        match self.client.auth().sign_out().await {
            Ok(()) => {
                self.state.send_replace(SessionState::Unauthenticated);
                notifier.success("Logged out successfully");
                Some(Route::Home)
            }
            Err(e) => {
                warn!(error = %e, "Sign-out failed");
                notifier.error(e.to_string());
                None
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths_round_trip() {
        for page in AdminPage::ALL {
            assert_eq!(Route::parse(page.path()), Some(Route::Admin(page)));
        }
        assert_eq!(Route::parse("/"), Some(Route::Home));
        assert_eq!(Route::parse("/auth/"), Some(Route::Login));
        assert_eq!(Route::parse("/admin/hero/"), Some(Route::Admin(AdminPage::Hero)));
        assert_eq!(Route::parse("/admin/billing"), None);
    }

    #[test]
    fn test_only_admin_routes_are_admin() {
        assert!(Route::Admin(AdminPage::Users).is_admin());
        assert!(!Route::Login.is_admin());
    }
}
