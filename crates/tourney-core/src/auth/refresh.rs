//! Single-flight renewal of the access token.
//!
//! Any number of callers may ask for a fresh access token at once. The first
//! one performs the refresh exchange; everyone who arrives while it is in
//! flight is queued on the same attempt and receives the same outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{CredentialPair, CredentialStore, Session, SessionEndReason};
use crate::api::{ApiError, Endpoint};

pub(crate) const REFRESH_PATH: &str = "/users/token/refresh/";

/// Token body returned by the login and refresh endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(alias = "access_token")]
    pub access: String,
    #[serde(alias = "refresh_token", default)]
    pub refresh: Option<String>,
}

/// What every caller attached to one refresh attempt observes
#[derive(Debug, Clone)]
enum RefreshOutcome {
    Renewed(String),
    Expired,
}

impl RefreshOutcome {
    fn into_result(self) -> Result<String, ApiError> {
        match self {
            RefreshOutcome::Renewed(token) => Ok(token),
            RefreshOutcome::Expired => Err(ApiError::SessionExpired),
        }
    }
}

/// Callers waiting on the outstanding attempt. `None` means no attempt.
type AttemptSlot = Option<Vec<oneshot::Sender<RefreshOutcome>>>;

pub struct RefreshCoordinator {
    endpoint: Endpoint,
    store: Arc<dyn CredentialStore>,
    session: Arc<Session>,
    slot: Mutex<AttemptSlot>,
    exchanges: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(endpoint: Endpoint, store: Arc<dyn CredentialStore>, session: Arc<Session>) -> Self {
        Self {
            endpoint,
            store,
            session,
            slot: Mutex::new(None),
            exchanges: AtomicU64::new(0),
        }
    }

    /// Number of refresh exchanges sent to the server so far
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock_slot().is_some()
    }

    /// Return a renewed access token, sharing any refresh already in flight.
    ///
    /// Fails with `ApiError::SessionExpired` when the session cannot be
    /// renewed. By then the credential store has been cleared and the
    /// session has ended.
    pub async fn ensure_fresh_access_token(&self) -> Result<String, ApiError> {
        loop {
            let waiter = {
                let mut slot = self.lock_slot();
                match slot.as_mut() {
                    Some(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        Some(rx)
                    }
                    None => {
                        *slot = Some(Vec::new());
                        None
                    }
                }
            };

            let Some(rx) = waiter else {
                break;
            };
            debug!("Waiting on in-flight token refresh");
            match rx.await {
                Ok(outcome) => return outcome.into_result(),
                // The leading caller was cancelled; the first waiter back takes over
                Err(_) => debug!("Token refresh abandoned by its leader, retrying"),
            }
        }

        let attempt = Attempt { coordinator: self, settled: false };
        let outcome = self.exchange().await;
        attempt.settle(outcome.clone());
        outcome.into_result()
    }

    async fn exchange(&self) -> RefreshOutcome {
        let Some(pair) = self.store.load() else {
            warn!("No refresh token available, ending session");
            self.session.end(SessionEndReason::Expired);
            return RefreshOutcome::Expired;
        };

        self.exchanges.fetch_add(1, Ordering::Relaxed);
        match self.request_tokens(&pair.refresh_token).await {
            Ok(tokens) => {
                // Servers without refresh rotation return only the access token
                let renewed = CredentialPair {
                    access_token: tokens.access,
                    refresh_token: tokens.refresh.unwrap_or(pair.refresh_token),
                };
                self.store.save(&renewed);
                info!("Access token refreshed");
                RefreshOutcome::Renewed(renewed.access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.store.clear();
                self.session.end(SessionEndReason::Expired);
                RefreshOutcome::Expired
            }
        }
    }

    async fn request_tokens(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let response = self
            .endpoint
            .client()
            .post(self.endpoint.url(REFRESH_PATH))
            .json(&json!({ "refresh": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e))
        })
    }

    fn lock_slot(&self) -> MutexGuard<'_, AttemptSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the attempt slot for the leading caller. Dropping it unsettled
/// (the leader was cancelled mid-exchange) frees the slot and drops the
/// waiters' senders, so they start a new attempt instead of hanging.
struct Attempt<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl Attempt<'_> {
    fn settle(mut self, outcome: RefreshOutcome) {
        self.settled = true;
        let waiters = self.coordinator.lock_slot().take().unwrap_or_default();
        if !waiters.is_empty() {
            debug!(waiters = waiters.len(), "Resolving callers queued on token refresh");
        }
        for waiter in waiters {
            // The waiter may have been dropped; nothing to deliver then
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Token refresh abandoned before completion");
            self.coordinator.lock_slot().take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStore, SessionEvent, SessionState};
    use std::time::Duration;

    fn coordinator(store: Arc<dyn CredentialStore>, session: Arc<Session>) -> RefreshCoordinator {
        // Port 9 (discard) is never contacted by these tests
        let endpoint = Endpoint::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        RefreshCoordinator::new(endpoint, store, session)
    }

    #[tokio::test]
    async fn test_missing_refresh_token_expires_without_network() {
        let session = Arc::new(Session::new());
        let mut events = session.subscribe();
        let coordinator = coordinator(Arc::new(MemoryStore::new()), session.clone());

        let result = coordinator.ensure_fresh_access_token().await;
        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert_eq!(coordinator.exchange_count(), 0);
        assert!(!coordinator.is_refreshing());
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Ended { reason: SessionEndReason::Expired }
        );
    }

    #[tokio::test]
    async fn test_abandoned_attempt_hands_over_to_waiter() {
        use wiremock::matchers::{body_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(json!({ "refresh": "r" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "a2" })))
            .expect(1)
            .mount(&server)
            .await;

        let session = Arc::new(Session::new());
        let mut events = session.subscribe();
        let store: Arc<dyn CredentialStore> =
            Arc::new(MemoryStore::with_pair(CredentialPair::new("a", "r")));
        let endpoint = Endpoint::new(server.uri(), Duration::from_secs(5)).unwrap();
        let coordinator = RefreshCoordinator::new(endpoint, store.clone(), session.clone());

        // A leader that took the slot and was then cancelled
        let attempt = {
            *coordinator.lock_slot() = Some(Vec::new());
            Attempt { coordinator: &coordinator, settled: false }
        };
        let waiter = coordinator.ensure_fresh_access_token();
        tokio::pin!(waiter);
        assert!(futures::poll!(waiter.as_mut()).is_pending());

        drop(attempt);
        assert_eq!(waiter.await.unwrap(), "a2");
        assert_eq!(coordinator.exchange_count(), 1);
        assert!(!coordinator.is_refreshing());
        assert_eq!(store.load(), Some(CredentialPair::new("a2", "r")));
        assert_eq!(session.state(), SessionState::Unknown);
        assert!(events.try_recv().is_err());
        server.verify().await;
    }

    #[test]
    fn test_token_response_accepts_both_field_styles() {
        let short: TokenResponse = serde_json::from_str(r#"{"access":"a","refresh":"r"}"#).unwrap();
        assert_eq!(short.refresh.as_deref(), Some("r"));

        let long: TokenResponse = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(long.access, "a");
        assert!(long.refresh.is_none());
    }
}
