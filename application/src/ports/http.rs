//! HTTP client port backing the `fetch` capability.
//!
//! - **Port**: [`HttpClientPort`] - defined here in application layer
//! - **Adapter**: `ReqwestHttpClient` - implemented in infrastructure
//!
//! The request and response shapes are exactly what expressions pass to
//! and receive from `fetch(...)`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fetch request as constructed by an expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpCallRequest {
    /// HTTP method; empty means GET.
    pub method: String,
    pub url: String,
    pub header: BTreeMap<String, String>,
    pub body: String,
}

/// A fetch response as handed back to the expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpCallResponse {
    pub status_code: u16,
    /// Human-readable status line, e.g. `200 OK`.
    pub status: String,
    /// Response headers; names are lowercase, values keep arrival order.
    pub header: BTreeMap<String, Vec<String>>,
    pub body: String,
}

/// Error from performing a fetch.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("failed to create request: {0}")]
    InvalidRequest(String),

    #[error("failed to execute request: {0}")]
    RequestFailed(String),
}

/// Port for the outbound HTTP client.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn fetch(&self, request: &HttpCallRequest) -> Result<HttpCallResponse, HttpError>;
}
