//! API client for the tournament server.
//!
//! `ApiClient` ties together the credential store, the session, the refresh
//! coordinator and the request pipeline. UI code talks to the server only
//! through it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::auth::bootstrap::{self, BootstrapPlan};
use crate::auth::refresh::TokenResponse;
use crate::auth::{
    CredentialPair, CredentialStore, RefreshCoordinator, Session, SessionEndReason, SessionEvent,
    SessionState,
};
use crate::config::Config;
use crate::models::{ActionMessage, NewUser, ProfileUpdate, UserProfile};

use super::{ApiError, ApiRequest, Endpoint, RequestPipeline};

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/users/token/";
const PROFILE_PATH: &str = "/users/profile/";
const REGISTER_PATH: &str = "/users/register/";
const PASSWORD_RESET_PATH: &str = "/users/password-reset/";
const PASSWORD_RESET_CONFIRM_PATH: &str = "/users/password-reset/confirm/";

/// API client for the tournament server.
/// Clone is cheap - all shared state lives behind `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    store: Arc<dyn CredentialStore>,
    session: Arc<Session>,
    coordinator: Arc<RefreshCoordinator>,
    pipeline: RequestPipeline,
    refresh_skew: chrono::Duration,
    bootstrapped: Arc<AtomicBool>,
}

impl ApiClient {
    /// Create a client with the given credential store
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let endpoint = Endpoint::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let refresh_skew = chrono::Duration::seconds(config.refresh_skew_secs.max(0));
        Ok(Self::with_endpoint(endpoint, store, refresh_skew))
    }

    /// Create a client using the credential backend named in the config
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = config.store.open()?;
        Ok(Self::new(config, store)?)
    }

    pub fn with_endpoint(
        endpoint: Endpoint,
        store: Arc<dyn CredentialStore>,
        refresh_skew: chrono::Duration,
    ) -> Self {
        let session = Arc::new(Session::new());
        let coordinator = Arc::new(RefreshCoordinator::new(
            endpoint.clone(),
            store.clone(),
            session.clone(),
        ));
        let pipeline = RequestPipeline::new(endpoint, store.clone(), coordinator.clone())
            .with_refresh_skew(refresh_skew);

        Self {
            store,
            session,
            coordinator,
            pipeline,
            refresh_skew,
            bootstrapped: Arc::new(AtomicBool::new(false)),
        }
    }

    // ===== Session =====

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.session.watch()
    }

    /// Subscribe to session-end events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Reconcile stored credentials with the session state.
    ///
    /// Runs once per client; later calls wait for and return the state the
    /// first call resolved to.
    pub async fn bootstrap(&self) -> SessionState {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return self.session.wait_resolved().await;
        }

        match bootstrap::plan(self.store.as_ref(), Utc::now(), self.refresh_skew) {
            BootstrapPlan::Anonymous => self.session.mark_anonymous(),
            BootstrapPlan::Discard => {
                self.store.clear();
                self.session.mark_anonymous();
            }
            BootstrapPlan::FetchProfile { access_token } => {
                match self.fetch_profile_with(&access_token).await {
                    Ok(profile) => self.session.authenticate(profile),
                    Err(e) => {
                        debug!(error = %e, "Profile fetch failed, trying token refresh");
                        self.refresh_and_fetch_profile().await;
                    }
                }
            }
            BootstrapPlan::RefreshFirst => self.refresh_and_fetch_profile().await,
        }

        let state = self.session.state();
        info!(authenticated = state.is_authenticated(), "Session bootstrap complete");
        state
    }

    async fn refresh_and_fetch_profile(&self) {
        // On failure the coordinator has already cleared credentials and ended the session
        let Ok(token) = self.coordinator.ensure_fresh_access_token().await else {
            return;
        };

        match self.fetch_profile_with(&token).await {
            Ok(profile) => self.session.authenticate(profile),
            Err(e) => {
                warn!(error = %e, "Profile fetch failed after token refresh");
                self.store.clear();
                self.session.mark_anonymous();
            }
        }
    }

    async fn fetch_profile_with(&self, token: &str) -> Result<UserProfile, ApiError> {
        let response = self
            .pipeline
            .send_with_token(&ApiRequest::get(PROFILE_PATH), token)
            .await?;
        parse_json(check_response(response).await?).await
    }

    // ===== Authentication =====

    /// Log in with email and password, storing the issued token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .json(&json!({ "email": email, "password": password }))?;
        let response = self.pipeline.send_public(&request).await?;

        let status = response.status();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            info!("Login rejected");
            return Err(ApiError::InvalidCredentials);
        }
        let tokens: TokenResponse = parse_json(check_response(response).await?).await?;
        let refresh_token = tokens.refresh.ok_or_else(|| {
            ApiError::InvalidResponse("Login response is missing the refresh token".to_string())
        })?;

        // The stored pair and session stay as they were unless the new tokens
        // yield a profile
        let profile = self.fetch_profile_with(&tokens.access).await?;
        self.store.save(&CredentialPair::new(tokens.access, refresh_token));
        self.bootstrapped.store(true, Ordering::SeqCst);
        self.session.authenticate(profile.clone());
        Ok(profile)
    }

    /// Clear credentials and end the session. Never fails.
    pub fn logout(&self) {
        self.store.clear();
        self.bootstrapped.store(true, Ordering::SeqCst);
        if self.session.end(SessionEndReason::LoggedOut) {
            info!("Logged out");
        }
    }

    /// Create an account, then log in with it
    pub async fn register(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).json(user)?;
        let response = self.pipeline.send_public(&request).await?;
        check_response(response).await?;
        info!(username = %user.username, "Account registered");
        self.login(&user.email, &user.password).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<ActionMessage, ApiError> {
        let request = ApiRequest::post(PASSWORD_RESET_PATH).json(&json!({ "email": email }))?;
        let response = self.pipeline.send_public(&request).await?;
        parse_json(check_response(response).await?).await
    }

    pub async fn confirm_password_reset(
        &self,
        uidb64: &str,
        token: &str,
        password: &str,
    ) -> Result<ActionMessage, ApiError> {
        let request = ApiRequest::post(PASSWORD_RESET_CONFIRM_PATH).json(&json!({
            "uidb64": uidb64,
            "token": token,
            "password": password,
        }))?;
        let response = self.pipeline.send_public(&request).await?;
        parse_json(check_response(response).await?).await
    }

    // ===== Profile =====

    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get_json(ApiRequest::get(PROFILE_PATH)).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let profile: UserProfile = self.patch_json(PROFILE_PATH, update).await?;
        self.session.update_profile(profile.clone());
        Ok(profile)
    }

    // ===== Request Helpers =====

    /// Send any request through the authenticated pipeline
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        self.pipeline.send(request).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.pipeline.send(&request).await?;
        parse_json(check_response(response).await?).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::post(path).json(body)?;
        let response = self.pipeline.send(&request).await?;
        parse_json(check_response(response).await?).await
    }

    pub async fn patch_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::patch(path).json(body)?;
        let response = self.pipeline.send(&request).await?;
        parse_json(check_response(response).await?).await
    }

    /// POST without a body to an action endpoint (`.../read/`, `.../approve/`)
    pub async fn post_empty(&self, path: &str) -> Result<ActionMessage, ApiError> {
        let response = self.pipeline.send(&ApiRequest::post(path)).await?;
        let response = check_response(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(ActionMessage::default());
        }
        parse_json(response).await
    }
}

/// Check if response is successful, returning an error with body if not.
async fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let url = response.url().path().to_string();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e)))
}
