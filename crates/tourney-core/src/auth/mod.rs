//! Authentication module for managing credentials and the user session.
//!
//! This module provides:
//! - `CredentialStore`: durable storage for the access/refresh token pair
//! - `Session`: observable session state and the session-end event
//! - `RefreshCoordinator`: single-flight access token renewal
//! - `bootstrap`: startup reconciliation of stored credentials
//! - `token`: local decoding of access token expiry

pub mod bootstrap;
pub mod credentials;
pub mod refresh;
pub mod session;
pub mod token;

pub use bootstrap::BootstrapPlan;
pub use credentials::{CredentialPair, CredentialStore, FileStore, KeyringStore, MemoryStore};
pub use refresh::RefreshCoordinator;
pub use session::{Session, SessionEndReason, SessionEvent, SessionState};
pub use token::{decode_access_claims, AccessClaims, TokenError};
