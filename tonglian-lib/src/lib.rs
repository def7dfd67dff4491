//! Tonglian (Allinpay) payment gateway client.
//!
//! The crate builds signed requests, verifies signed responses and inbound
//! notifications, and exposes the gateway's operations as typed calls. It
//! keeps no state between calls; HTTP and time are injected through the
//! [`HttpTransport`] and [`Clock`] traits.
//!
//! # Features
//!
//! - **Canonical signing**: MD5 shared-secret and RSA-SHA256 signatures over
//!   a byte-ordered canonical string
//! - **Typed operations**: orders, refunds, queries, statements and balances
//! - **Notification verification**: signature, identity and authoritative
//!   re-query before any business logic runs
//! - **`http-transport`**: optional reqwest-backed [`HttpTransport`]
//!
//! # Testing
//!
//! The reqwest transport tests only build with the feature enabled:
//!
//! ```bash
//! cargo test -p tonglian-lib --features http-transport
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use tonglian_lib::prelude::*;
//!
//! let config = GatewayConfig::new("https://tp.allinpay.com/pay/api", "M1", SignType::Md5)
//!     .with_app_id("A1")
//!     .with_merchant_key("secret");
//! let client = GatewayClient::from_config(config)?;
//!
//! let order = client
//!     .query_order(&QueryOrderRequest::by_mch_order_no("O20240301001"))
//!     .await?;
//! println!("state: {:?}", order.state);
//! ```

pub mod canonical;
pub mod client;
pub mod clock;
pub mod config;
pub mod errors;
pub mod notify;
pub mod operations;
pub mod params;
pub mod prelude;
pub mod signing;
pub mod transport;

pub use client::{GatewayClient, PROTOCOL_VERSION};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::GatewayConfig;
pub use errors::{GatewayError, GatewayErrorCode, NotificationFailure};
pub use notify::{NotificationRequest, NotifyAck, PayNotification, RefundNotification, NOTIFY_ACK};
pub use params::ParameterSet;
pub use signing::{SignType, SignatureContext, Signer};
pub use transport::{HttpTransport, TransportResponse};

#[cfg(feature = "http-transport")]
pub use transport::ReqwestTransport;

/// Common result alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
