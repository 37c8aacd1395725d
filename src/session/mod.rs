//! Session state.
//!
//! # Responsibilities
//! - Hold the signed-in user, token, two-factor flag and permission tree
//! - Decide whether calls may be issued (`is_logged_in`)
//! - Tear the session down exactly once on logout
//!
//! # Design Decisions
//! - One `SessionStore` is created at startup and passed around in an `Arc`
//! - The token lives in `SessionStorage`, the rest in memory
//! - Logout decides under a single lock, so concurrent logouts clear once
//! - Remote revocation is best-effort and never blocks the local teardown

pub mod model;
pub mod permissions;
pub mod storage;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::effects::Navigator;
use crate::error::DispatchError;
use crate::resilience::classify::SessionControl;

pub use model::{Action, Page, Permission, Profile, Segment, User};
pub use permissions::{page_permissions, PagePermissions};
pub use storage::{MemoryStorage, SessionStorage, SESSION_TOKEN_KEY};

/// Server-side session invalidation.
#[async_trait]
pub trait SessionRevoker: Send + Sync {
    async fn revoke(&self, token: &str, index: Option<&str>) -> Result<(), DispatchError>;
}

#[derive(Debug, Default, Clone)]
struct SessionState {
    user: Option<User>,
    two_factor: bool,
    last_attempt: Option<String>,
    permissions: Option<Permission>,
}

impl SessionState {
    fn is_empty(&self) -> bool {
        self.user.is_none() && !self.two_factor && self.last_attempt.is_none() && self.permissions.is_none()
    }
}

pub struct SessionStore {
    state: Mutex<SessionState>,
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    revoker: Option<Arc<dyn SessionRevoker>>,
    login_route: String,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            storage,
            navigator,
            revoker: None,
            login_route: "/".to_string(),
        }
    }

    pub fn with_revoker(mut self, revoker: Arc<dyn SessionRevoker>) -> Self {
        self.revoker = Some(revoker);
        self
    }

    /// Where logout navigates to.
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A user is present, two-factor passed and a token is stored.
    pub fn is_logged_in(&self) -> bool {
        let state = self.state();
        state.user.is_some() && state.two_factor && self.storage.get(SESSION_TOKEN_KEY).is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.storage.get(SESSION_TOKEN_KEY)
    }

    pub fn user(&self) -> Option<User> {
        self.state().user.clone()
    }

    pub fn user_index(&self) -> Option<String> {
        self.state().user.as_ref().map(|u| u.index.clone())
    }

    pub fn two_factor(&self) -> bool {
        self.state().two_factor
    }

    pub fn last_attempt(&self) -> Option<String> {
        self.state().last_attempt.clone()
    }

    pub fn permissions(&self) -> Option<Permission> {
        self.state().permissions.clone()
    }

    /// Record a successful password login. Two-factor is still pending.
    pub fn start(&self, token: &str, user: User, last_attempt: Option<String>) {
        let mut state = self.state();
        self.storage.set(SESSION_TOKEN_KEY, token);
        state.user = Some(user);
        state.last_attempt = last_attempt;
        state.two_factor = false;
    }

    /// Seed an already verified session (token obtained elsewhere).
    pub fn restore(&self, token: &str, user: User) {
        let mut state = self.state();
        self.storage.set(SESSION_TOKEN_KEY, token);
        state.user = Some(user);
        state.two_factor = true;
    }

    pub fn set_two_factor(&self, verified: bool) {
        self.state().two_factor = verified;
    }

    pub fn update_user(&self, user: User) {
        self.state().user = Some(user);
    }

    pub fn update_permissions(&self, permissions: Permission) {
        self.state().permissions = Some(permissions);
    }

    pub fn page_permissions(&self, segment: &str, page: &str) -> PagePermissions {
        page_permissions(self.state().permissions.as_ref(), segment, page)
    }

    /// Clear all session state and storage, revoke remotely, return to the
    /// login route. Only the first of several concurrent calls does anything.
    pub async fn logout(&self) -> bool {
        let (previous, token) = {
            let mut state = self.state();
            if state.is_empty() && self.storage.is_empty() {
                tracing::debug!("Logout requested without an active session");
                return false;
            }
            let token = self.storage.get(SESSION_TOKEN_KEY);
            let previous = std::mem::take(&mut *state);
            self.storage.clear();
            (previous, token)
        };

        if let (Some(revoker), Some(token)) = (&self.revoker, token.as_deref()) {
            let index = previous.user.as_ref().map(|u| u.index.as_str());
            if let Err(e) = revoker.revoke(token, index).await {
                tracing::warn!(error = %e, "Remote logout failed; local session already cleared");
            }
        }

        tracing::info!(
            user = previous.user.as_ref().map(|u| u.email.as_str()).unwrap_or(""),
            "Signed out"
        );
        self.navigator.navigate_to(&self.login_route);
        true
    }
}

#[async_trait]
impl SessionControl for SessionStore {
    async fn logout(&self) -> bool {
        SessionStore::logout(self).await
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("logged_in", &self.is_logged_in())
            .field("login_route", &self.login_route)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::History;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn user() -> User {
        User {
            index: "adm-7".into(),
            email: "ops@school.example".into(),
            first_name: "Ops".into(),
            last_name: "Team".into(),
            ..User::default()
        }
    }

    fn store() -> (SessionStore, Arc<MemoryStorage>, Arc<History>) {
        let storage = Arc::new(MemoryStorage::new());
        let history = Arc::new(History::new("/dashboard"));
        (SessionStore::new(storage.clone(), history.clone()), storage, history)
    }

    #[derive(Default)]
    struct CountingRevoker {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SessionRevoker for CountingRevoker {
        async fn revoke(&self, token: &str, index: Option<&str>) -> Result<(), DispatchError> {
            assert_eq!(token, "tok-1");
            assert_eq!(index, Some("adm-7"));
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DispatchError::Transport("backend down".into()))
        }
    }

    #[test]
    fn login_requires_two_factor() {
        let (session, _, _) = store();
        assert!(!session.is_logged_in());

        session.start("tok-1", user(), Some("2026-10-01".into()));
        assert!(!session.is_logged_in());
        assert_eq!(session.token().as_deref(), Some("tok-1"));

        session.set_two_factor(true);
        assert!(session.is_logged_in());
        assert_eq!(session.user_index().as_deref(), Some("adm-7"));
    }

    #[test]
    fn missing_token_means_logged_out() {
        let (session, storage, _) = store();
        session.restore("tok-1", user());
        storage.clear();
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn logout_clears_everything_and_navigates_home() {
        let (session, storage, history) = store();
        let revoker = Arc::new(CountingRevoker::default());
        let session = session.with_revoker(revoker.clone());
        session.restore("tok-1", user());

        assert!(session.logout().await);
        assert!(!session.is_logged_in());
        assert!(session.user().is_none());
        assert!(storage.is_empty());
        assert_eq!(history.current(), "/");
        // a failing revoke does not undo the local logout
        assert_eq!(revoker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_logouts_clear_once() {
        let (session, storage, history) = store();
        let session = Arc::new(session);
        session.restore("tok-1", user());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = session.clone();
                tokio::spawn(async move { session.logout().await })
            })
            .collect();

        let mut cleared = 0;
        for handle in handles {
            if handle.await.unwrap() {
                cleared += 1;
            }
        }

        assert_eq!(cleared, 1);
        assert_eq!(storage.clear_count(), 1);
        assert_eq!(history.entries(), vec!["/dashboard", "/"]);
        assert!(!session.logout().await);
    }

    #[test]
    fn page_permissions_read_stored_tree() {
        let (session, _, _) = store();
        assert!(!session.page_permissions("School", "List").view);

        session.update_permissions(Permission {
            role: "Viewer".into(),
            remark: None,
            data: vec![Segment {
                segment: "School".into(),
                pages: vec![Page {
                    page: "List".into(),
                    actions: vec![Action {
                        id: "1".into(),
                        action: "View".into(),
                    }],
                }],
            }],
        });
        assert!(session.page_permissions("School", "List").view);
    }
}
