//! Authentication endpoints.

use quizhub_auth::Identity;

use crate::dto::{AuthPayload, LoginRequest, RegisterRequest};
use crate::error::ApiError;
use crate::pipeline::ApiClient;
use crate::transport::HttpRequest;

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthPayload, ApiError> {
        let path = self.client.endpoints().login.clone();
        self.client.post(&path, request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        let path = self.client.endpoints().register.clone();
        self.client.post(&path, request).await
    }

    /// Invalidate the session server-side (revokes the renewal cookie).
    pub async fn logout(&self) -> Result<(), ApiError> {
        let path = self.client.endpoints().logout.clone();
        self.client.execute(HttpRequest::post(path)).await.map(|_| ())
    }

    pub async fn current_identity(&self) -> Result<Identity, ApiError> {
        let path = self.client.endpoints().me.clone();
        self.client.get(&path).await
    }
}
