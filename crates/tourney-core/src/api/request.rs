use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use super::{ApiError, Endpoint};

/// A replayable description of an API call.
///
/// The pipeline may send the same request twice (once more after a token
/// refresh), so it is kept as plain data and turned into a `reqwest`
/// request per attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn build(&self, endpoint: &Endpoint, token: Option<&str>) -> RequestBuilder {
        let mut builder = endpoint
            .client()
            .request(self.method.clone(), endpoint.url(&self.path));
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        if let Some(ref body) = self.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}
