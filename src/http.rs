//! HTTP transport shared by every adapter
//!
//! Adapters build an [`ApiRequest`] and hand it to a [`JsonTransport`]. The
//! production transport wraps a `reqwest::Client`; tests swap in
//! [`crate::test_support::StubTransport`].

use crate::config::HttpConfig;
use crate::{Result, TravelError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Query parameters whose values never show up in logs
const SECRET_PARAMS: [&str; 2] = ["appid", "apikey"];

/// A GET request against one of the upstream services
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Short service name used in logs and errors ("openweathermap")
    pub service: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(service: &'static str, url: impl Into<String>) -> Self {
        Self {
            service,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// URL with API keys masked
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let Some((base, query)) = self.url.split_once('?') else {
            return self.url.clone();
        };

        let pairs: Vec<String> = query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some((key, _)) if SECRET_PARAMS.contains(&key) => format!("{key}=***"),
                _ => pair.to_string(),
            })
            .collect();

        format!("{base}?{}", pairs.join("&"))
    }
}

/// The configured key for `service`, or a configuration error
pub(crate) fn require_key<'a>(service: &str, key: &'a Option<String>) -> Result<&'a str> {
    key.as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| TravelError::config(format!("Missing {service} API key")))
}

/// Fetches a JSON document. Non-2xx answers are errors.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn get_json(&self, request: &ApiRequest) -> Result<Value>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TravelError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl JsonTransport for ReqwestTransport {
    #[instrument(
        skip(self, request),
        fields(service = request.service, url = %request.redacted_url())
    )]
    async fn get_json(&self, request: &ApiRequest) -> Result<Value> {
        let start_time = Instant::now();

        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            warn!("Network error calling {}: {}", request.service, e);
            TravelError::transport(format!("{} request failed: {e}", request.service))
        })?;

        let status = response.status();
        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let reason = match status.as_u16() {
                401 => "invalid or missing API key".to_string(),
                404 => "resource not found".to_string(),
                429 => "rate limit exceeded".to_string(),
                _ => status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            };
            warn!("{} answered HTTP {}: {}", request.service, status, reason);
            return Err(TravelError::status(request.service, status.as_u16(), reason));
        }

        let body: Value = response.json().await.map_err(|e| {
            TravelError::parse(format!("{} returned invalid JSON: {e}", request.service))
        })?;

        let total = start_time.elapsed();
        if total.as_secs() > 5 {
            warn!("Slow {} response: {:.3}s", request.service, total.as_secs_f64());
        }

        Ok(body)
    }
}
