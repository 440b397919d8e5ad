//! Blocking `Transport` on top of `ureq`.
//!
//! Status codes are returned as data (`http_status_as_error(false)`), so 4xx
//! and 5xx responses reach the engine, which turns them into `RemoteError`s
//! with the platform's error envelope intact. Only failures that produced no
//! response become `TransportError`s.

use std::fmt;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{ApiRequest, HttpMethod, HttpResponse, Transport};

/// Header carrying the platform API key.
pub const API_KEY_HEADER: &str = "apiKey";

#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout()))
            .build()
            .new_agent();

        let mut headers = vec![("user-agent".to_string(), config.user_agent.clone())];
        if let Some(key) = &config.api_key {
            headers.push((API_KEY_HEADER.to_string(), key.clone()));
        }

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        let http = request.to_http(&self.base_url);
        let headers: Vec<(String, String)> = self
            .headers
            .iter()
            .chain(http.headers.iter())
            .cloned()
            .collect();
        debug!(method = http.method.as_str(), url = %http.url, "dispatching over ureq");

        let url = http.url.as_str();
        let response = match (http.method, http.body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), &headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), &headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(url), &headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), &headers).send_empty(),
            (HttpMethod::Patch, Some(body)) => {
                with_headers(self.agent.patch(url), &headers).send(body.as_bytes())
            }
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url), &headers).send_empty(),
        };
        let mut response = response.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn transport_error(err: ureq::Error) -> TransportError {
    match &err {
        ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
        _ => TransportError::Connection(err.to_string()),
    }
}
