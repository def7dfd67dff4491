//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use tonglian_lib::prelude::*;
//! ```

// Client and configuration
pub use crate::client::GatewayClient;
pub use crate::config::GatewayConfig;

// Error handling
pub use crate::errors::{GatewayError, GatewayErrorCode, NotificationFailure};
pub use crate::Result;

// Signing
pub use crate::params::ParameterSet;
pub use crate::signing::{SignType, Signer};

// Operations
pub use crate::operations::{
    AppletUrlRequest, DownloadBillRequest, OrderState, PayWayCode, QueryBalanceRequest,
    QueryOrderRequest, QueryRefundRequest, RefundRequest, RefundState, UnifiedOrderRequest,
};

// Notifications
pub use crate::notify::{NotificationRequest, NotifyAck};

// Seams
pub use crate::clock::Clock;
pub use crate::transport::HttpTransport;

#[cfg(feature = "http-transport")]
pub use crate::transport::ReqwestTransport;
