//! Error types for gateway operations.
//!
//! Every variant keeps the structured context a caller needs to log or branch
//! on (offending field, target URL, raw gateway response, attempted
//! parameters) so nothing has to be recovered from the message text.

use serde_json::Value;

use crate::params::ParameterSet;

/// Stable numeric error codes, grouped by failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum GatewayErrorCode {
    /// Declared algorithm that has no implementation
    Unimplemented = 1000,
    /// Missing or invalid client configuration
    Configuration = 1001,
    /// Invalid call parameters
    Validation = 2000,
    /// Statement requested before its availability window
    BillNotAvailable = 2001,
    /// Network failure or non-2xx HTTP status
    Transport = 3000,
    /// Non-zero gateway result code
    Business = 4000,
    /// Response or notification signature did not verify
    Signature = 5000,
    /// Notification failed identity, state or amount checks
    Notification = 6000,
    /// Encoding or decoding failure
    Serialization = 7000,
    /// Error raised by the caller's business callback
    Callback = 8000,
}

/// Why an inbound notification was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationFailure {
    /// The payload could not be parsed into a flat field set.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// A field required for the re-query or the checks is absent, from the
    /// notification or from the authoritative record.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// `mchNo` does not match the configured merchant.
    #[error("merchant mismatch: expected {expected}, received {received}")]
    MerchantMismatch {
        /// Configured merchant number
        expected: String,
        /// Value carried by the notification
        received: String,
    },

    /// `appId` does not match the configured application.
    #[error("application mismatch: expected {expected}, received {received}")]
    AppMismatch {
        /// Configured application id
        expected: String,
        /// Value carried by the notification
        received: String,
    },

    /// The authoritative order is not in a state that confirms the claim.
    #[error("authoritative state {state} does not confirm the notification")]
    UnexpectedState {
        /// Raw state code returned by the re-query
        state: i64,
    },

    /// The authoritative amount differs from the claimed amount.
    #[error("amount mismatch: claimed {claimed}, authoritative {authoritative}")]
    AmountMismatch {
        /// Amount carried by the notification
        claimed: String,
        /// Amount returned by the re-query
        authoritative: String,
    },
}

/// Error type for every gateway operation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Algorithm is declared by the gateway but has no implementation here.
    #[error("{0} is not implemented yet")]
    Unimplemented(&'static str),

    /// Missing or invalid setting; raised at client construction.
    #[error("invalid configuration `{field}`: {reason}")]
    Configuration {
        /// Setting name
        field: String,
        /// Reason for rejection
        reason: String,
    },

    /// Call parameter rejected before any network access.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Parameter name as sent on the wire
        field: String,
        /// Reason for rejection
        reason: String,
    },

    /// Statement for `day` is not retrievable yet.
    #[error("statement for {day} is not available until {available_at}")]
    BillNotAvailable {
        /// Requested statement day (`YYYY-MM-DD`)
        day: String,
        /// First instant the statement can be fetched (RFC 3339)
        available_at: String,
    },

    /// Network failure or non-2xx response.
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// Target URL
        url: String,
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Transport-level description
        reason: String,
        /// Raw response body, when one was received
        body: Option<String>,
        /// Signed parameters that were submitted
        params: Box<ParameterSet>,
    },

    /// Gateway answered with a non-zero result code.
    #[error("{operation} rejected by gateway (code {code}): {message}")]
    Business {
        /// Operation name
        operation: &'static str,
        /// Gateway result code
        code: i64,
        /// Gateway message
        message: String,
        /// Full decoded response body
        response: Value,
        /// Signed parameters that were submitted
        params: Box<ParameterSet>,
    },

    /// A signature did not verify, or could not be produced.
    #[error("signature check failed for {context}")]
    Signature {
        /// What was being signed or verified
        context: String,
    },

    /// Inbound notification rejected.
    #[error("notification rejected: {0}")]
    Notification(#[from] NotificationFailure),

    /// Encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The caller's business callback failed; the original error is the source.
    #[error("business callback failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GatewayError {
    /// Get the numeric error code.
    pub fn code(&self) -> GatewayErrorCode {
        match self {
            Self::Unimplemented(_) => GatewayErrorCode::Unimplemented,
            Self::Configuration { .. } => GatewayErrorCode::Configuration,
            Self::Validation { .. } => GatewayErrorCode::Validation,
            Self::BillNotAvailable { .. } => GatewayErrorCode::BillNotAvailable,
            Self::Transport { .. } => GatewayErrorCode::Transport,
            Self::Business { .. } => GatewayErrorCode::Business,
            Self::Signature { .. } => GatewayErrorCode::Signature,
            Self::Notification(_) => GatewayErrorCode::Notification,
            Self::Serialization(_) => GatewayErrorCode::Serialization,
            Self::Callback(_) => GatewayErrorCode::Callback,
        }
    }

    /// Returns true when the call was rejected locally, before any network access.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::BillNotAvailable { .. })
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// The client never retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Raw gateway response attached to a business failure.
    pub fn response(&self) -> Option<&Value> {
        match self {
            Self::Business { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Signed parameters attached to a transport or business failure.
    pub fn params(&self) -> Option<&ParameterSet> {
        match self {
            Self::Transport { params, .. } | Self::Business { params, .. } => Some(params),
            _ => None,
        }
    }

    /// Create a configuration error.
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a signature error.
    pub fn signature(context: impl Into<String>) -> Self {
        Self::Signature {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
