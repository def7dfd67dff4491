//! Typed gateway operations.
//!
//! Each request type knows its endpoint, checks its own required fields
//! before anything touches the network, and renders its operation-specific
//! fields. Common fields, channel extras and the signature are added by
//! [`GatewayClient`](crate::GatewayClient).

mod balance;
mod bill;
mod order;
mod refund;
mod way_code;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

use crate::params::ParameterSet;
use crate::Result;

pub use balance::{BalanceInfo, QueryBalanceRequest};
pub use bill::{available_at, BillFile, DownloadBillRequest};
pub use order::{
    AppletLink, AppletUrlRequest, OrderCreated, OrderInfo, OrderState, QueryOrderRequest,
    UnifiedOrderRequest,
};
pub use refund::{
    QueryRefundRequest, RefundDiagnostic, RefundInfo, RefundOutcome, RefundRequest, RefundState,
};
pub use way_code::PayWayCode;

/// An outbound gateway call.
pub trait GatewayRequest {
    /// Operation name used in logs and errors.
    const OPERATION: &'static str;

    /// Endpoint path relative to the configured base URL.
    const PATH: &'static str;

    /// Whether client-level channel extras apply when the call has none.
    const INHERITS_CHANNEL_EXTRA: bool = true;

    /// Check required fields. Runs before any network access.
    fn validate(&self) -> Result<()>;

    /// Time-dependent checks against the client clock. Also runs before any
    /// network access.
    fn check_preconditions(&self, _now: DateTime<FixedOffset>) -> Result<()> {
        Ok(())
    }

    /// Operation-specific fields.
    fn to_params(&self) -> ParameterSet;

    /// Call-level channel extras; `None` means "not given".
    fn channel_extra(&self) -> Option<&Map<String, Value>> {
        None
    }
}

/// Returns the value when it is present and not blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Lenient deserializers for fields the gateway sends as either numbers or strings.
pub(crate) mod de {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::params::render_value;

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected an integer, found {n}"))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected an integer, found {s:?}"))),
            Some(other) => Err(D::Error::custom(format!("expected an integer, found {other}"))),
        }
    }

    pub fn i64_code<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        opt_i64(d)?.ok_or_else(|| D::Error::custom("missing state code"))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(render_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "de::opt_i64")]
        amount: Option<i64>,
        #[serde(default, deserialize_with = "de::opt_string")]
        label: Option<String>,
    }

    #[test]
    fn test_lenient_integers() {
        let probe: Probe = serde_json::from_value(json!({"amount": "100"})).unwrap();
        assert_eq!(probe.amount, Some(100));
        let probe: Probe = serde_json::from_value(json!({"amount": 100})).unwrap();
        assert_eq!(probe.amount, Some(100));
        let probe: Probe = serde_json::from_value(json!({"amount": ""})).unwrap();
        assert_eq!(probe.amount, None);
        let probe: Probe = serde_json::from_value(json!({})).unwrap();
        assert_eq!(probe.amount, None);
        assert!(serde_json::from_value::<Probe>(json!({"amount": "ten"})).is_err());
    }

    #[test]
    fn test_lenient_strings() {
        let probe: Probe = serde_json::from_value(json!({"label": 0.05})).unwrap();
        assert_eq!(probe.label.as_deref(), Some("0.05"));
        let probe: Probe = serde_json::from_value(json!({"label": ""})).unwrap();
        assert_eq!(probe.label, None);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("x")), Some("x"));
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
    }
}
