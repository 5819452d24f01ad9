//! Request pipeline.
//!
//! Every outbound call goes through [`ApiClient::execute`]:
//!
//! 1. attach the stored credential as a bearer header
//! 2. send
//! 3. on a recoverable 401, renew (single-flight) and replay once with the
//!    `x-no-retry` marker
//! 4. classify any remaining failure and apply its side effect (notice,
//!    redirect, session expiry)

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use quizhub_events::Notice;

use crate::config::Endpoints;
use crate::context::{GENERIC_ERROR_MESSAGE, NOT_FOUND_MESSAGE, SessionContext};
use crate::dto::ApiEnvelope;
use crate::error::ApiError;
use crate::renewal::RenewalCoordinator;
use crate::store::Credential;
use crate::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    context: Arc<SessionContext>,
    renewal: Arc<RenewalCoordinator>,
    endpoints: Arc<Endpoints>,
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("context", &self.context)
            .field("renewal", &self.renewal)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        context: Arc<SessionContext>,
        renewal: Arc<RenewalCoordinator>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            transport,
            context,
            renewal,
            endpoints: Arc::new(endpoints),
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send `request` and return the successful response.
    ///
    /// Any non-2xx outcome is returned as an [`ApiError`] after its side
    /// effects have run. Transport failures (including timeouts) are returned
    /// untouched and never retried.
    pub async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let sent_with = self.context.store().credential();
        if let Some(credential) = &sent_with {
            request.set_bearer(credential);
        }
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authenticated = sent_with.is_some(),
            "sending request"
        );

        let response = self.transport.send(request.clone()).await?;
        if response.status.is_success() {
            return Ok(response);
        }

        if response.status == StatusCode::UNAUTHORIZED && self.is_recoverable(&request) {
            return self.replay(request, &response, sent_with).await;
        }

        Err(self.fail(&request, &response))
    }

    /// Execute and decode the envelope's `data`.
    pub async fn data<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        let envelope: ApiEnvelope<T> = self.envelope(request).await?;
        envelope
            .data
            .ok_or_else(|| ApiError::Decode("response envelope carried no data".to_string()))
    }

    /// Execute and decode the full envelope.
    pub async fn envelope<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let response = self.execute(request).await?;
        response.json().map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.data(HttpRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.data(HttpRequest::post(path).json(to_value(body)?)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.data(HttpRequest::put(path).json(to_value(body)?)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(HttpRequest::delete(path)).await.map(|_| ())
    }

    /// Login failures mean bad credentials, and marked calls were already
    /// replayed once.
    fn is_recoverable(&self, request: &HttpRequest) -> bool {
        request.path != self.endpoints.login && !request.is_no_retry()
    }

    async fn replay(
        &self,
        mut request: HttpRequest,
        rejected: &HttpResponse,
        sent_with: Option<Credential>,
    ) -> Result<HttpResponse, ApiError> {
        let credential = match (self.context.store().credential(), &sent_with) {
            // Another call already renewed since this one was sent.
            (Some(current), sent) if sent.as_ref() != Some(&current) => {
                tracing::debug!(path = %request.path, "credential superseded; replaying");
                current
            }
            // Another call's renewal failed and already ended the session.
            (None, Some(_)) => {
                tracing::debug!(path = %request.path, "session ended while request was in flight");
                return Err(ApiError::from_response(rejected));
            }
            _ => self.renewal.renew().await?,
        };

        request.mark_no_retry();
        request.set_bearer(&credential);
        tracing::debug!(path = %request.path, "replaying request with renewed credential");

        let response = self.transport.send(request.clone()).await?;
        if response.status.is_success() {
            return Ok(response);
        }
        Err(self.fail(&request, &response))
    }

    fn fail(&self, request: &HttpRequest, response: &HttpResponse) -> ApiError {
        let error = ApiError::from_response(response);
        tracing::debug!(
            path = %request.path,
            status = response.status.as_u16(),
            "request failed"
        );

        match response.status {
            StatusCode::UNAUTHORIZED => {
                // A concurrent replay may already have expired the session
                // this request was sent with.
                let held = self.context.store().credential();
                if request.path != self.endpoints.login {
                    if held.as_ref().map(Credential::as_str) == request.bearer() {
                        self.context.expire();
                    } else {
                        tracing::debug!(path = %request.path, "session already expired");
                    }
                }
            }
            StatusCode::FORBIDDEN => {
                if self.context.store().has_credential() {
                    self.context.forbidden();
                }
            }
            StatusCode::NOT_FOUND => self.context.notify(Notice::error(NOT_FOUND_MESSAGE)),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT => {}
            _ => self.context.notify(Notice::error(GENERIC_ERROR_MESSAGE)),
        }

        error
    }
}

fn to_value<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}
