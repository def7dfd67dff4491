//! HTTP transport seam.
//!
//! The client only needs [`HttpTransport::post`]. Bring your own
//! implementation, or enable the `http-transport` feature for
//! [`ReqwestTransport`].

#[cfg(feature = "http-transport")]
mod http;
mod traits;

#[cfg(feature = "http-transport")]
pub use http::ReqwestTransport;
pub use traits::{HttpTransport, TransportResponse};
