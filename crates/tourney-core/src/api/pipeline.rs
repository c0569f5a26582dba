use std::sync::Arc;

use chrono::Duration;
use reqwest::{Response, StatusCode};
use tracing::{debug, warn};

use super::{ApiError, ApiRequest, Endpoint};
use crate::auth::{decode_access_claims, CredentialStore, RefreshCoordinator};

/// Sends every API call with the stored bearer token and recovers once from
/// an expired or rejected token.
#[derive(Clone)]
pub struct RequestPipeline {
    endpoint: Endpoint,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    refresh_skew: Duration,
}

impl RequestPipeline {
    pub fn new(
        endpoint: Endpoint,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            endpoint,
            store,
            coordinator,
            refresh_skew: Duration::zero(),
        }
    }

    /// Refresh proactively when the stored token expires within `skew`.
    /// A zero skew only refreshes after the server rejects a token.
    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }

    /// Send a request, attaching the stored access token.
    ///
    /// A `401` triggers at most one refresh and one resend. Any other status
    /// is returned to the caller unchanged.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let token = self.attach_token().await?;
        let response = self.dispatch(request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(
            method = %request.method(),
            path = request.path(),
            "Request unauthenticated, renewing token"
        );
        let renewed = match self.store.access_token() {
            // Another caller already stored a newer token while this one was in flight
            Some(current) if token.as_deref() != Some(current.as_str()) => current,
            _ => self.coordinator.ensure_fresh_access_token().await?,
        };

        let response = self.dispatch(request, Some(&renewed)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(path = request.path(), "Request rejected again after token renewal");
            return Err(ApiError::Unauthorized);
        }
        Ok(response)
    }

    /// Send a request without credentials and without expiry recovery.
    /// Used for login, registration, and password reset.
    pub async fn send_public(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        self.dispatch(request, None).await
    }

    /// Send a request with an explicit token and without expiry recovery
    pub async fn send_with_token(
        &self,
        request: &ApiRequest,
        token: &str,
    ) -> Result<Response, ApiError> {
        self.dispatch(request, Some(token)).await
    }

    async fn attach_token(&self) -> Result<Option<String>, ApiError> {
        let Some(token) = self.store.access_token() else {
            return Ok(None);
        };
        if self.refresh_skew <= Duration::zero() {
            return Ok(Some(token));
        }

        // Undecodable tokens are sent as-is and left for the server to judge
        match decode_access_claims(&token) {
            Ok(claims) if claims.is_expired(self.refresh_skew) => {
                debug!("Access token near expiry, renewing before send");
                self.coordinator.ensure_fresh_access_token().await.map(Some)
            }
            _ => Ok(Some(token)),
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let response = request.build(&self.endpoint, token).send().await?;
        debug!(
            method = %request.method(),
            path = request.path(),
            status = response.status().as_u16(),
            authenticated = token.is_some(),
            "API response"
        );
        Ok(response)
    }
}
