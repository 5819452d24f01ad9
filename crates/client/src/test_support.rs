//! Scripted transport and a fully wired client for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use quizhub_events::InMemoryEventBus;

use crate::config::{Endpoints, Routes};
use crate::context::SessionContext;
use crate::navigation::MemoryNavigator;
use crate::pipeline::ApiClient;
use crate::renewal::RenewalCoordinator;
use crate::session::AuthSession;
use crate::store::{Credential, CredentialStore};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

pub(crate) struct StubTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl StubTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            delays: Mutex::new(HashMap::new()),
        }
    }

    /// Hold every response for `path` back by `delay`.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(path.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = self.delays.lock().unwrap().get(&request.path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(&request)
    }
}

pub(crate) fn json_response(status: StatusCode, body: Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(status, body.to_string()))
}

pub(crate) fn envelope(data: Value) -> Result<HttpResponse, TransportError> {
    json_response(
        StatusCode::OK,
        json!({ "status": 200, "message": "ok", "data": data }),
    )
}

pub(crate) fn token_response(token: &str) -> Result<HttpResponse, TransportError> {
    envelope(json!({ "token": token }))
}

pub(crate) fn user_json(username: &str, roles: &[&str]) -> Value {
    json!({
        "id": "0192f0c4-4b5e-7a59-b0a4-1f6cd2e1a001",
        "email": format!("{username}@example.com"),
        "username": username,
        "fullName": format!("{username} tester"),
        "roles": roles,
    })
}

pub(crate) fn auth_response(token: &str, username: &str, roles: &[&str]) -> Result<HttpResponse, TransportError> {
    envelope(json!({
        "token": token,
        "refreshToken": "R1",
        "user": user_json(username, roles),
        "roles": roles,
    }))
}

pub(crate) struct Harness {
    pub transport: Arc<StubTransport>,
    pub navigator: Arc<MemoryNavigator>,
    pub context: Arc<SessionContext>,
    pub renewal: Arc<RenewalCoordinator>,
    pub api: ApiClient,
    pub session: AuthSession,
}

impl Harness {
    pub fn new(
        credential: Option<&str>,
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        let store = CredentialStore::in_memory();
        if let Some(token) = credential {
            store.set_credential(&Credential::new(token)).unwrap();
        }

        let transport = Arc::new(StubTransport::new(handler));
        let navigator = Arc::new(MemoryNavigator::new("/quizzes"));
        let context = Arc::new(SessionContext::new(
            store,
            Arc::new(InMemoryEventBus::new()),
            navigator.clone(),
            Routes::default(),
        ));
        let endpoints = Endpoints::default();
        let renewal = Arc::new(RenewalCoordinator::new(
            transport.clone(),
            context.clone(),
            endpoints.refresh.clone(),
        ));
        let api = ApiClient::new(transport.clone(), context.clone(), renewal.clone(), endpoints);
        let session = AuthSession::new(api.clone());

        Self {
            transport,
            navigator,
            context,
            renewal,
            api,
            session,
        }
    }

    pub fn signed_in(
        token: &str,
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(Some(token), handler)
    }

    pub fn signed_out(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(None, handler)
    }
}
