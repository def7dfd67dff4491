//! reqwest-backed transport.
//!
//! ```toml
//! [dependencies]
//! tonglian-lib = { version = "0.1", features = ["http-transport"] }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use super::{HttpTransport, TransportResponse};
use crate::config::GatewayConfig;
use crate::{GatewayError, Result};

/// [`HttpTransport`] over a pooled `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ReqwestTransport {
    /// Build a transport with the given timeout and TLS verification setting.
    pub fn new(timeout_secs: u64, verify_ssl: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .map_err(|e| {
                GatewayError::configuration("http_client", format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Build a transport from the client configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::new(config.timeout_secs, config.verify_ssl)
    }

    fn describe_error(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("timed out after {}s", self.timeout_secs)
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            format!("request failed: {e}")
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        body: String,
        headers: &[(String, String)],
    ) -> TransportResponse {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return TransportResponse::failed(self.describe_error(&e)),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        match response.text().await {
            Ok(body) => TransportResponse {
                status,
                headers,
                body,
                transport_error: None,
            },
            Err(e) => TransportResponse {
                status,
                headers,
                body: String::new(),
                transport_error: Some(self.describe_error(&e)),
            },
        }
    }
}
