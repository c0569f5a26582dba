//! Core library for tourney.
//!
//! Provides an authenticated client for the tournament server:
//! - `auth`: credential storage, session state, token refresh
//! - `api`: request pipeline, login/logout, typed resource calls
//! - `models`: server resource types
//! - `config`: user configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest};
pub use auth::{
    CredentialPair, CredentialStore, Session, SessionEndReason, SessionEvent, SessionState,
};
pub use config::{Config, StoreBackend};
