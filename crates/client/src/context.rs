//! Shared session context: credential store, auth state, event bus and
//! navigation, plus the side effects that tie them together.

use std::sync::Arc;

use tokio::sync::watch;

use quizhub_events::{EventBus, InMemoryEventBus, Notice, SessionEvent, SignOutReason, Subscription};

use crate::config::Routes;
use crate::navigation::{Navigator, sign_in_redirect};
use crate::state::{AuthAction, AuthState, reduce};
use crate::store::CredentialStore;

pub const UNAUTHORIZED_MESSAGE: &str = "You are not authorized. Please login.";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to access this resource.";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again later.";

pub struct SessionContext {
    store: CredentialStore,
    state: watch::Sender<AuthState>,
    events: Arc<InMemoryEventBus<SessionEvent>>,
    navigator: Arc<dyn Navigator>,
    routes: Routes,
}

impl core::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionContext")
            .field("store", &self.store)
            .field("state", &*self.state.borrow())
            .field("routes", &self.routes)
            .finish()
    }
}

impl SessionContext {
    /// A held credential means an identity fetch is pending, so the session
    /// starts in `Loading`; otherwise it starts signed out.
    pub fn new(
        store: CredentialStore,
        events: Arc<InMemoryEventBus<SessionEvent>>,
        navigator: Arc<dyn Navigator>,
        routes: Routes,
    ) -> Self {
        let initial = if store.has_credential() {
            AuthState::Loading
        } else {
            AuthState::SignedOut
        };
        let (state, _) = watch::channel(initial);

        Self {
            store,
            state,
            events,
            navigator,
            routes,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change from now on.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn dispatch(&self, action: AuthAction) {
        self.state.send_modify(|state| *state = reduce(state, action));
    }

    pub fn events(&self) -> &Arc<InMemoryEventBus<SessionEvent>> {
        &self.events
    }

    pub fn subscribe(&self) -> Subscription<SessionEvent> {
        self.events.subscribe()
    }

    /// A lost event is logged, never surfaced to the operation that raised it.
    pub fn publish(&self, event: SessionEvent) {
        if let Err(err) = self.events.publish(event) {
            tracing::warn!(error = ?err, "failed to publish session event");
        }
    }

    pub fn notify(&self, notice: Notice) {
        self.publish(SessionEvent::Notice(notice));
    }

    /// Terminal handling for a credential that could not be renewed.
    ///
    /// Clears the store, signs out, raises one notice and sends the user to
    /// the login route with the current location as `returnUrl`.
    pub fn expire(&self) {
        tracing::warn!("session expired; signing out");

        self.store.clear();
        self.dispatch(AuthAction::Logout);
        self.publish(SessionEvent::SessionExpired);
        self.publish(SessionEvent::SignedOut {
            reason: SignOutReason::Expired,
        });
        self.notify(Notice::error(UNAUTHORIZED_MESSAGE));

        let target = sign_in_redirect(&self.navigator.current_path(), &self.routes.login);
        self.navigator.redirect(&target);
    }

    /// The user is signed in but lacks access to what they asked for.
    pub fn forbidden(&self) {
        self.notify(Notice::error(FORBIDDEN_MESSAGE));

        let current = self.navigator.current_path();
        if current != self.routes.forbidden {
            self.navigator.redirect(&self.routes.forbidden);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::MemoryNavigator;
    use crate::store::Credential;

    fn context(store: CredentialStore, start: &str) -> (SessionContext, Arc<MemoryNavigator>) {
        let navigator = Arc::new(MemoryNavigator::new(start));
        let ctx = SessionContext::new(
            store,
            Arc::new(InMemoryEventBus::new()),
            navigator.clone(),
            Routes::default(),
        );
        (ctx, navigator)
    }

    #[test]
    fn initial_state_follows_stored_credential() {
        let (ctx, _) = context(CredentialStore::in_memory(), "/");
        assert_eq!(ctx.state(), AuthState::SignedOut);

        let store = CredentialStore::in_memory();
        store.set_credential(&Credential::new("T1")).unwrap();
        let (ctx, _) = context(store, "/");
        assert_eq!(ctx.state(), AuthState::Loading);
    }

    #[test]
    fn expire_clears_and_redirects_once() {
        let store = CredentialStore::in_memory();
        store.set_credential(&Credential::new("T1")).unwrap();
        let (ctx, nav) = context(store.clone(), "/quizzes/3");
        let events = ctx.subscribe();

        ctx.expire();

        assert!(!store.has_credential());
        assert_eq!(ctx.state(), AuthState::SignedOut);
        assert_eq!(nav.history(), vec!["/login?returnUrl=%2Fquizzes%2F3".to_string()]);

        let events = events.drain();
        let notices: Vec<_> = events.iter().filter_map(SessionEvent::notice).collect();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, UNAUTHORIZED_MESSAGE);
        assert!(events.contains(&SessionEvent::SessionExpired));
    }

    #[test]
    fn forbidden_does_not_redirect_in_place() {
        let (ctx, nav) = context(CredentialStore::in_memory(), "/admin");
        ctx.forbidden();
        assert_eq!(nav.current_path(), "/403");

        ctx.forbidden();
        assert_eq!(nav.history(), vec!["/403".to_string()]);
    }

    #[test]
    fn watchers_see_dispatches() {
        let (ctx, _) = context(CredentialStore::in_memory(), "/");
        let mut rx = ctx.watch();
        ctx.dispatch(AuthAction::Start);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::Loading);
    }
}
