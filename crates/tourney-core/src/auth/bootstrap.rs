//! Startup reconciliation of stored credentials with the session state.
//!
//! [`plan`] decides locally, without touching the network, what the client
//! has to do with whatever the credential store holds. `ApiClient::bootstrap`
//! carries the plan out.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::token::decode_access_claims;
use super::CredentialStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapPlan {
    /// Nothing stored; the session is anonymous
    Anonymous,
    /// The stored access token cannot be decoded; drop the credentials
    Discard,
    /// The access token looks valid; fetch the profile with it
    FetchProfile { access_token: String },
    /// The access token has expired; refresh before fetching the profile
    RefreshFirst,
}

pub fn plan(store: &dyn CredentialStore, now: DateTime<Utc>, skew: Duration) -> BootstrapPlan {
    let Some(pair) = store.load() else {
        debug!("No stored credentials");
        return BootstrapPlan::Anonymous;
    };

    match decode_access_claims(&pair.access_token) {
        Ok(claims) if claims.is_expired_at(now, skew) => {
            debug!(exp = claims.exp, "Stored access token has expired");
            BootstrapPlan::RefreshFirst
        }
        Ok(_) => BootstrapPlan::FetchProfile {
            access_token: pair.access_token,
        },
        Err(e) => {
            warn!(error = %e, "Stored access token is malformed");
            BootstrapPlan::Discard
        }
    }
}
