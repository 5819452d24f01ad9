//! `quizhub-client`
//!
//! **Responsibility:** client-side session core for the QuizHub API.
//!
//! This crate provides:
//! - A request pipeline that attaches the bearer credential, renews it
//!   (single-flight) on 401 and replays the failed call once
//! - The auth state machine (`SignedOut` / `Loading` / `SignedIn`) behind
//!   login, registration, logout and identity refresh
//! - Route guarding and capability checks on top of `quizhub-auth`
//!
//! The server remains the authority: every client-side authorization answer
//! is a rendering hint.

pub mod auth_api;
pub mod config;
pub mod context;
pub mod dto;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod pipeline;
pub mod renewal;
pub mod session;
pub mod state;
pub mod store;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use quizhub_auth::{
    Access, AuthorizationExplanation, Authorizer, CapabilityGate, Permission, PermissionTable,
};
use quizhub_events::{InMemoryEventBus, SessionEvent, Subscription};

pub use auth_api::AuthApi;
pub use config::{ClientConfig, ConfigError, Endpoints, Routes};
pub use context::SessionContext;
pub use dto::{ApiEnvelope, AuthPayload, LoginRequest, RegisterRequest};
pub use error::{ApiError, ErrorBody, RenewalError};
pub use guard::{RouteDecision, RouteGuard};
pub use navigation::{MemoryNavigator, Navigator};
pub use pipeline::ApiClient;
pub use renewal::RenewalCoordinator;
pub use session::AuthSession;
pub use state::{AuthAction, AuthState};
pub use store::{Credential, CredentialStore, FileStore, KeyValueStore, MemoryStore, StoreError};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fully wired client: one credential store, one renewal coordinator and one
/// state machine shared by every clone of the API handle.
#[derive(Debug, Clone)]
pub struct QuizHubClient {
    api: ApiClient,
    session: AuthSession,
    context: Arc<SessionContext>,
    table: Arc<PermissionTable>,
    routes: Routes,
}

impl QuizHubClient {
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Client over the real HTTP transport with every other part defaulted.
    pub fn new(config: ClientConfig) -> Result<Self, BuildError> {
        Self::builder(config).build()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn state(&self) -> AuthState {
        self.context.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<AuthState> {
        self.context.watch()
    }

    pub fn subscribe(&self) -> Subscription<SessionEvent> {
        self.context.subscribe()
    }

    pub fn permission_table(&self) -> &PermissionTable {
        &self.table
    }

    /// Authorization answers for whoever is signed in right now.
    ///
    /// Built from the live identity only, never from the stored snapshot.
    pub fn authorizer(&self) -> Authorizer {
        let state = self.context.state();
        Authorizer::new(state.identity(), &self.table)
    }

    pub fn check(&self, gate: &CapabilityGate) -> Access {
        let authz = self.authorizer();
        let access = gate.check(&authz);
        if !access.is_granted() {
            for permission in gate.required_permissions() {
                let explanation = authz.explain(&permission, &self.table);
                if !explanation.granted {
                    tracing::debug!(
                        resource = permission.resource(),
                        action = permission.action(),
                        granting_roles = ?explanation.granting_roles,
                        reason = %explanation.reason,
                        "capability denied"
                    );
                }
            }
        }
        access
    }

    /// Why the signed-in identity does or does not hold `permission`.
    pub fn explain(&self, permission: &Permission) -> AuthorizationExplanation {
        self.authorizer().explain(permission, &self.table)
    }

    pub fn guard(&self, guard: &RouteGuard, path: &str) -> RouteDecision {
        guard.decide(&self.context.state(), path, &self.routes, &self.table)
    }

    /// Resolve the initial auth state (fetches the identity if a credential
    /// was persisted).
    pub async fn start(&self) {
        self.session.start().await;
    }
}

pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<CredentialStore>,
    navigator: Option<Arc<dyn Navigator>>,
    table: Option<PermissionTable>,
    events: Option<Arc<InMemoryEventBus<SessionEvent>>>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            navigator: None,
            table: None,
            events: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn store(mut self, store: CredentialStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn permission_table(mut self, table: PermissionTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn events(mut self, events: Arc<InMemoryEventBus<SessionEvent>>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<QuizHubClient, BuildError> {
        let config = self.config;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config)?),
        };

        let store = match (self.store, &config.store_path) {
            (Some(store), _) => store,
            (None, Some(path)) => {
                tracing::debug!(path = %path.display(), "using file credential store");
                CredentialStore::new(Arc::new(FileStore::open(path)?))
            }
            (None, None) => CredentialStore::in_memory(),
        };

        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(MemoryNavigator::default()));
        let events = self.events.unwrap_or_else(|| Arc::new(InMemoryEventBus::new()));
        let table = Arc::new(
            self.table
                .unwrap_or_else(|| PermissionTable::builtin().clone()),
        );

        let context = Arc::new(SessionContext::new(
            store,
            events,
            navigator,
            config.routes.clone(),
        ));
        let renewal = Arc::new(RenewalCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&context),
            config.endpoints.refresh.clone(),
        ));
        let api = ApiClient::new(transport, Arc::clone(&context), renewal, config.endpoints);
        let session = AuthSession::new(api.clone());

        tracing::info!(api_url = %config.api_url, "quizhub client ready");

        Ok(QuizHubClient {
            api,
            session,
            context,
            table,
            routes: config.routes,
        })
    }
}
