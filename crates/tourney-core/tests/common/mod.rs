#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde_json::{json, Value};
use tourney_core::api::Endpoint;
use tourney_core::auth::{CredentialPair, CredentialStore, MemoryStore};
use tourney_core::ApiClient;
use wiremock::MockServer;

/// An unsigned JWT whose `exp` is `offset_secs` from now
pub fn jwt(offset_secs: i64, jti: &str) -> String {
    let exp = Utc::now().timestamp() + offset_secs;
    let payload = json!({ "token_type": "access", "exp": exp, "jti": jti, "user_id": 1 });
    format!(
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.signature",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn profile_json() -> Value {
    json!({
        "id": 1,
        "username": "ana",
        "email": "ana@example.com",
        "avatar": null,
        "num_whatsapp": null,
        "is_verified": true,
        "date_joined": "2024-01-01T00:00:00Z"
    })
}

pub fn store_with(access: &str, refresh: &str) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_pair(CredentialPair::new(access, refresh)))
}

pub fn client(server: &MockServer, store: Arc<MemoryStore>) -> ApiClient {
    let endpoint = Endpoint::new(server.uri(), Duration::from_secs(5)).unwrap();
    let store: Arc<dyn CredentialStore> = store;
    ApiClient::with_endpoint(endpoint, store, chrono::Duration::zero())
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}
