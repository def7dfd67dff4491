use std::sync::Arc;

use async_trait::async_trait;

/// Outcome of one HTTP round-trip.
///
/// A network failure is reported in `transport_error` rather than as an
/// `Err`, so implementations never have to invent a gateway error type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code, `0` when no response was received.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Raw response body.
    pub body: String,
    /// Network-level failure description.
    pub transport_error: Option<String>,
}

impl TransportResponse {
    /// Successful response with a body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            ..Self::default()
        }
    }

    /// Response with an arbitrary status.
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Self::default()
        }
    }

    /// Network failure without any response.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            transport_error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Returns true if no network error occurred and the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.transport_error
            .as_deref()
            .map_or(true, |e| e.is_empty())
            && (200..300).contains(&self.status)
    }

    /// Look up a header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Outbound HTTP used by the gateway client.
///
/// Timeouts, retries and connection reuse belong to the implementation.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `body` to `url` with the given headers.
    async fn post(&self, url: &str, body: String, headers: &[(String, String)])
        -> TransportResponse;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn post(
        &self,
        url: &str,
        body: String,
        headers: &[(String, String)],
    ) -> TransportResponse {
        (**self).post(url, body, headers).await
    }
}
