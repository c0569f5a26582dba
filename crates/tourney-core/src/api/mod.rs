//! REST API client module for the tournament server.
//!
//! This module provides the `ApiClient` for talking to the server, and the
//! `RequestPipeline` underneath it that attaches bearer credentials and
//! recovers from expired access tokens.
//!
//! The server issues JWT access/refresh token pairs from `/users/token/`.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod pipeline;
pub mod request;
mod resources;

pub use client::ApiClient;
pub use endpoint::Endpoint;
pub use error::ApiError;
pub use pipeline::RequestPipeline;
pub use request::ApiRequest;
