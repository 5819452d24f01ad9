//! Single-flight credential renewal.
//!
//! At most one renewal call is outstanding per process. The first caller to
//! hit a 401 starts it; every caller arriving while it is in flight awaits the
//! same outcome. Once it settles the slot is emptied, so the next wave of 401s
//! starts a fresh renewal.
//!
//! The renewal itself runs on its own task. A caller that is cancelled while
//! waiting does not cancel the renewal other callers depend on.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use quizhub_events::SessionEvent;

use crate::context::SessionContext;
use crate::dto::{ApiEnvelope, TokenPayload};
use crate::error::{ErrorBody, RenewalError};
use crate::store::Credential;
use crate::transport::{HttpRequest, Transport};

type Outcome = Result<Credential, RenewalError>;
type Ticket = watch::Receiver<Option<Outcome>>;

pub struct RenewalCoordinator {
    transport: Arc<dyn Transport>,
    context: Arc<SessionContext>,
    refresh_path: String,
    in_flight: Mutex<Option<Ticket>>,
}

impl core::fmt::Debug for RenewalCoordinator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenewalCoordinator")
            .field("refresh_path", &self.refresh_path)
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

fn lock(slot: &Mutex<Option<Ticket>>) -> MutexGuard<'_, Option<Ticket>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Empties the slot when the renewal task ends, including by panic.
struct ClearOnDrop<'a>(&'a Mutex<Option<Ticket>>);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        lock(self.0).take();
    }
}

impl RenewalCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        context: Arc<SessionContext>,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            context,
            refresh_path: refresh_path.into(),
            in_flight: Mutex::new(None),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Obtain a fresh credential, joining the renewal in flight if any.
    ///
    /// On failure the session has already been expired exactly once by the
    /// renewal task; callers only propagate the error.
    pub async fn renew(self: &Arc<Self>) -> Result<Credential, RenewalError> {
        let mut ticket = {
            let mut slot = lock(&self.in_flight);
            match slot.as_ref() {
                Some(ticket) => {
                    tracing::debug!("joining in-flight credential renewal");
                    ticket.clone()
                }
                None => {
                    let (tx, ticket) = watch::channel(None);
                    *slot = Some(ticket.clone());
                    let this = Arc::clone(self);
                    tokio::spawn(async move { this.lead(tx).await });
                    ticket
                }
            }
        };

        let settled = ticket
            .wait_for(Option::is_some)
            .await
            .map_err(|_| RenewalError::Aborted)?;

        match &*settled {
            Some(outcome) => outcome.clone(),
            None => Err(RenewalError::Aborted),
        }
    }

    async fn lead(&self, tx: watch::Sender<Option<Outcome>>) {
        let guard = ClearOnDrop(&self.in_flight);
        tracing::info!(path = %self.refresh_path, "renewing credential");

        let outcome = self.refresh().await;
        match &outcome {
            Ok(_) => {
                tracing::info!("credential renewed");
                self.context.publish(SessionEvent::CredentialRenewed);
            }
            Err(err) => {
                tracing::warn!(error = %err, "credential renewal failed");
                self.context.expire();
            }
        }

        drop(guard);
        tx.send_replace(Some(outcome));
    }

    async fn refresh(&self) -> Outcome {
        let mut request = HttpRequest::post(self.refresh_path.as_str());
        request.mark_no_retry();
        if let Some(current) = self.context.store().credential() {
            request.set_bearer(&current);
        }

        let response = self.transport.send(request).await?;
        if !response.status.is_success() {
            return Err(RenewalError::Rejected {
                status: response.status.as_u16(),
                message: ErrorBody::parse(&response.body).message,
            });
        }

        let envelope: ApiEnvelope<TokenPayload> = response
            .json()
            .map_err(|_| RenewalError::MissingCredential)?;
        let token = envelope
            .data
            .and_then(|payload| payload.token)
            .filter(|token| !token.is_empty())
            .ok_or(RenewalError::MissingCredential)?;

        let credential = Credential::new(token);
        self.context
            .store()
            .set_credential(&credential)
            .map_err(|err| RenewalError::Store(err.to_string()))?;
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use reqwest::StatusCode;

    use crate::context::UNAUTHORIZED_MESSAGE;
    use crate::test_support::{Harness, json_response, token_response};
    use crate::transport::NO_RETRY_HEADER;

    #[tokio::test]
    async fn concurrent_callers_share_one_renewal() {
        let harness = Harness::signed_in("T1", |req| match req.path.as_str() {
            "/auth/refresh" => token_response("T2"),
            _ => json_response(StatusCode::NOT_FOUND, serde_json::json!({})),
        });
        harness.transport.delay("/auth/refresh", Duration::from_millis(50));
        let events = harness.context.subscribe();

        let (a, b, c) = tokio::join!(
            harness.renewal.renew(),
            harness.renewal.renew(),
            harness.renewal.renew()
        );

        for outcome in [a, b, c] {
            assert_eq!(outcome.unwrap(), Credential::new("T2"));
        }
        assert_eq!(harness.transport.count("/auth/refresh"), 1);
        assert_eq!(harness.context.store().credential(), Some(Credential::new("T2")));
        assert!(!harness.renewal.is_in_flight());

        let renewed = events
            .drain()
            .into_iter()
            .filter(|e| *e == SessionEvent::CredentialRenewed)
            .count();
        assert_eq!(renewed, 1);
    }

    #[tokio::test]
    async fn renewal_request_is_marked_and_authenticated() {
        let harness = Harness::signed_in("T1", |_| token_response("T2"));

        harness.renewal.renew().await.unwrap();

        let sent = harness.transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, reqwest::Method::POST);
        assert!(sent[0].headers.contains_key(NO_RETRY_HEADER));
        assert_eq!(sent[0].bearer(), Some("T1"));
    }

    #[tokio::test]
    async fn failed_renewal_expires_once_for_all_waiters() {
        let harness = Harness::signed_in("T1", |_| {
            json_response(StatusCode::UNAUTHORIZED, serde_json::json!({ "message": "expired" }))
        });
        harness.transport.delay("/auth/refresh", Duration::from_millis(20));
        let events = harness.context.subscribe();

        let (a, b) = tokio::join!(harness.renewal.renew(), harness.renewal.renew());

        for outcome in [a, b] {
            assert!(matches!(
                outcome,
                Err(RenewalError::Rejected { status: 401, .. })
            ));
        }
        assert!(!harness.context.store().has_credential());

        let notices: Vec<_> = events
            .drain()
            .into_iter()
            .filter_map(|e| e.notice().map(|n| n.message.clone()))
            .collect();
        assert_eq!(notices, vec![UNAUTHORIZED_MESSAGE.to_string()]);
        assert_eq!(harness.navigator.history().len(), 1);
    }

    #[tokio::test]
    async fn envelope_without_token_is_a_failure() {
        let harness = Harness::signed_in("T1", |_| {
            json_response(StatusCode::OK, serde_json::json!({ "status": 200, "message": "ok" }))
        });

        let err = harness.renewal.renew().await.unwrap_err();
        assert_eq!(err, RenewalError::MissingCredential);
        assert!(!harness.context.store().has_credential());
    }

    #[tokio::test]
    async fn later_wave_starts_a_new_renewal() {
        let harness = Harness::signed_in("T1", |_| token_response("T2"));

        harness.renewal.renew().await.unwrap();
        harness.renewal.renew().await.unwrap();

        assert_eq!(harness.transport.count("/auth/refresh"), 2);
    }

    #[tokio::test]
    async fn cancelled_leader_does_not_cancel_the_renewal() {
        let harness = Harness::signed_in("T1", |_| token_response("T2"));
        harness.transport.delay("/auth/refresh", Duration::from_millis(30));

        let renewal = Arc::clone(&harness.renewal);
        let leader = tokio::spawn(async move { renewal.renew().await });
        tokio::task::yield_now().await;
        leader.abort();

        let joined = harness.renewal.renew().await;
        assert_eq!(joined.unwrap(), Credential::new("T2"));
        assert_eq!(harness.transport.count("/auth/refresh"), 1);
    }
}
