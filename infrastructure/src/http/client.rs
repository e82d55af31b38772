//! Outbound HTTP client backing the `fetch` capability.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Request, StatusCode, Url};
use toolgate_application::{HttpCallRequest, HttpCallResponse, HttpClientPort, HttpError};
use tracing::debug;

/// Applied to every fetch; expressions have no way to wait longer.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`HttpClientPort`] adapter over a shared [`reqwest::Client`].
///
/// Cookies persist across fetches within one evaluation process, so a login
/// call followed by an API call behaves like a browser session.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HttpError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    fn build(&self, call: &HttpCallRequest) -> Result<Request, HttpError> {
        let method = if call.method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(call.method.as_bytes())
                .map_err(|e| HttpError::InvalidRequest(format!("invalid method: {e}")))?
        };
        let url = Url::parse(&call.url)
            .map_err(|e| HttpError::InvalidRequest(format!("invalid url: {e}")))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &call.header {
            builder = builder.header(name, value);
        }
        if !call.body.is_empty() {
            builder = builder.body(call.body.clone());
        }
        builder
            .build()
            .map_err(|e| HttpError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttpClient {
    async fn fetch(&self, call: &HttpCallRequest) -> Result<HttpCallResponse, HttpError> {
        let request = self.build(call)?;
        debug!(method = %request.method(), url = %request.url(), "performing fetch");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| HttpError::RequestFailed(e.to_string()))?;

        let status_code = response.status().as_u16();
        let status = status_line(response.status());
        let mut header: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in response.headers() {
            header
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).to_string());
        }
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::RequestFailed(e.to_string()))?;

        Ok(HttpCallResponse {
            status_code,
            status,
            header,
            body,
        })
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
