//! Refunds and refund queries.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::order::require_positive_amount;
use super::{de, non_blank, GatewayRequest};
use crate::params::ParameterSet;
use crate::{GatewayError, Result};

const DEFAULT_REFUND_CURRENCY: &str = "cny";

/// Refund an order (`/refund/refundOrder`).
#[derive(Clone, Debug, Default)]
pub struct RefundRequest {
    /// Merchant refund reference, unique per merchant.
    pub mch_refund_no: String,
    /// Merchant order reference. One of this or `pay_order_id` is required.
    pub mch_order_no: Option<String>,
    /// Gateway order id.
    pub pay_order_id: Option<String>,
    /// Amount in minor units (fen).
    pub refund_amount: i64,
    /// Currency code. Defaults to `cny`.
    pub currency: Option<String>,
    pub refund_reason: String,
    pub client_ip: Option<String>,
    pub notify_url: Option<String>,
    /// Echoed back in refund notifications.
    pub ext_param: Option<String>,
    pub channel_extra: Option<Map<String, Value>>,
}

impl RefundRequest {
    /// Refund against a merchant order reference.
    pub fn for_mch_order(
        mch_refund_no: impl Into<String>,
        mch_order_no: impl Into<String>,
        refund_amount: i64,
        refund_reason: impl Into<String>,
    ) -> Self {
        Self {
            mch_refund_no: mch_refund_no.into(),
            mch_order_no: Some(mch_order_no.into()),
            refund_amount,
            refund_reason: refund_reason.into(),
            ..Self::default()
        }
    }

    /// Refund against a gateway order id.
    pub fn for_pay_order(
        mch_refund_no: impl Into<String>,
        pay_order_id: impl Into<String>,
        refund_amount: i64,
        refund_reason: impl Into<String>,
    ) -> Self {
        Self {
            mch_refund_no: mch_refund_no.into(),
            pay_order_id: Some(pay_order_id.into()),
            refund_amount,
            refund_reason: refund_reason.into(),
            ..Self::default()
        }
    }

    pub fn with_notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    pub fn with_ext_param(mut self, ext_param: impl Into<String>) -> Self {
        self.ext_param = Some(ext_param.into());
        self
    }

    pub fn with_channel_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.channel_extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

impl GatewayRequest for RefundRequest {
    const OPERATION: &'static str = "refund";
    const PATH: &'static str = "/refund/refundOrder";

    fn validate(&self) -> Result<()> {
        if self.mch_refund_no.trim().is_empty() {
            return Err(GatewayError::validation("mchRefundNo", "must not be empty"));
        }
        if non_blank(self.mch_order_no.as_deref()).is_none()
            && non_blank(self.pay_order_id.as_deref()).is_none()
        {
            return Err(GatewayError::validation(
                "mchOrderNo/payOrderId",
                "one of the two must be given",
            ));
        }
        require_positive_amount("refundAmount", self.refund_amount)?;
        if self.refund_reason.trim().is_empty() {
            return Err(GatewayError::validation("refundReason", "must not be empty"));
        }
        Ok(())
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        params
            .insert("mchRefundNo", self.mch_refund_no.as_str())
            .insert_opt("mchOrderNo", self.mch_order_no.as_deref())
            .insert_opt("payOrderId", self.pay_order_id.as_deref())
            .insert("refundAmount", self.refund_amount)
            .insert(
                "currency",
                non_blank(self.currency.as_deref()).unwrap_or(DEFAULT_REFUND_CURRENCY),
            )
            .insert("refundReason", self.refund_reason.as_str())
            .insert_opt("clientIp", self.client_ip.as_deref())
            .insert_opt("notifyUrl", self.notify_url.as_deref())
            .insert_opt("extParam", self.ext_param.as_deref());
        params
    }

    fn channel_extra(&self) -> Option<&Map<String, Value>> {
        self.channel_extra.as_ref()
    }
}

/// Query a refund (`/refund/query`).
#[derive(Clone, Debug, Default)]
pub struct QueryRefundRequest {
    pub refund_order_id: Option<String>,
    pub mch_refund_no: Option<String>,
}

impl QueryRefundRequest {
    /// Query by gateway refund id.
    pub fn by_refund_order_id(refund_order_id: impl Into<String>) -> Self {
        Self {
            refund_order_id: Some(refund_order_id.into()),
            mch_refund_no: None,
        }
    }

    /// Query by merchant refund reference.
    pub fn by_mch_refund_no(mch_refund_no: impl Into<String>) -> Self {
        Self {
            refund_order_id: None,
            mch_refund_no: Some(mch_refund_no.into()),
        }
    }
}

impl GatewayRequest for QueryRefundRequest {
    const OPERATION: &'static str = "query_refund";
    const PATH: &'static str = "/refund/query";

    fn validate(&self) -> Result<()> {
        if non_blank(self.refund_order_id.as_deref()).is_none()
            && non_blank(self.mch_refund_no.as_deref()).is_none()
        {
            return Err(GatewayError::validation(
                "refundOrderId/mchRefundNo",
                "one of the two must be given",
            ));
        }
        Ok(())
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        params
            .insert_opt("refundOrderId", self.refund_order_id.as_deref())
            .insert_opt("mchRefundNo", self.mch_refund_no.as_deref());
        params
    }
}

/// Refund lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefundState {
    Generated,
    Refunding,
    Success,
    Failed,
    Closed,
    /// Refund of a WeChat pre-consumption order.
    PreConsumption,
    /// A code this client does not know.
    Unknown(i64),
}

impl RefundState {
    /// Numeric state code.
    pub fn code(&self) -> i64 {
        match self {
            Self::Generated => 0,
            Self::Refunding => 1,
            Self::Success => 2,
            Self::Failed => 3,
            Self::Closed => 4,
            Self::PreConsumption => 6,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns true once the refund can no longer change on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Closed | Self::PreConsumption
        )
    }

    /// States in which a refund notification is passed to business logic.
    pub fn is_notification_actionable(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::PreConsumption)
    }
}

impl From<i64> for RefundState {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Generated,
            1 => Self::Refunding,
            2 => Self::Success,
            3 => Self::Failed,
            4 => Self::Closed,
            6 => Self::PreConsumption,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for RefundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated => f.write_str("generated"),
            Self::Refunding => f.write_str("refunding"),
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
            Self::Closed => f.write_str("closed"),
            Self::PreConsumption => f.write_str("pre-consumption"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

impl Serialize for RefundState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for RefundState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        de::i64_code(deserializer).map(Self::from)
    }
}

/// Authoritative refund record returned by `/refund/refundOrder` and `/refund/query`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundInfo {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub mch_no: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub app_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub refund_order_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pay_order_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub mch_refund_no: Option<String>,
    /// Original payment amount in minor units.
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub pay_amount: Option<i64>,
    /// Refunded amount in minor units.
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub refund_amount: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub currency: Option<String>,
    #[serde(default)]
    pub state: Option<RefundState>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub channel_order_no: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub err_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub err_msg: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub ext_param: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub success_time: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub channel_fee_amount: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Channel error details reported for a failed or closed refund.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDiagnostic {
    pub err_code: Option<String>,
    pub err_msg: Option<String>,
}

/// Result of a refund call.
///
/// A refund the gateway accepted but reports as failed or closed is still an
/// `Ok` outcome; the caller decides what to do with it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefundOutcome {
    /// Refund record as returned by the gateway.
    pub info: RefundInfo,
    /// Reported state, `None` when the gateway omitted it.
    pub state: Option<RefundState>,
    /// True when the refund reached a terminal state the caller should act on.
    pub should_notify_caller: bool,
    /// Present for failed and closed refunds.
    pub diagnostic: Option<RefundDiagnostic>,
}

impl RefundOutcome {
    /// Classify a refund record.
    pub fn from_info(info: RefundInfo) -> Self {
        let state = info.state;
        let should_notify_caller = state.is_some_and(|s| s.is_terminal());
        let diagnostic = match state {
            Some(RefundState::Failed | RefundState::Closed) => Some(RefundDiagnostic {
                err_code: info.err_code.clone(),
                err_msg: info.err_msg.clone(),
            }),
            _ => None,
        };
        Self {
            info,
            state,
            should_notify_caller,
            diagnostic,
        }
    }

    /// Returns true if the refund went through.
    pub fn is_success(&self) -> bool {
        matches!(
            self.state,
            Some(RefundState::Success | RefundState::PreConsumption)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> RefundRequest {
        RefundRequest::for_mch_order("R1", "O1", 100, "customer request")
    }

    #[test]
    fn test_refund_validation() {
        assert!(request().validate().is_ok());

        for amount in [0, -1] {
            let err = RefundRequest {
                refund_amount: amount,
                ..request()
            }
            .validate()
            .unwrap_err();
            assert!(matches!(err, GatewayError::Validation { ref field, .. } if field == "refundAmount"));
        }

        let err = RefundRequest {
            mch_refund_no: String::new(),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, GatewayError::Validation { ref field, .. } if field == "mchRefundNo"));

        let err = RefundRequest {
            mch_order_no: None,
            ..request()
        }
        .validate()
        .unwrap_err();
        assert!(err.is_validation());

        let err = RefundRequest {
            refund_reason: " ".into(),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, GatewayError::Validation { ref field, .. } if field == "refundReason"));
    }

    #[test]
    fn test_refund_params() {
        let params = request().with_ext_param("x").to_params();
        assert_eq!(params.get("refundAmount"), Some(&json!(100)));
        assert_eq!(params.get_str("currency").as_deref(), Some("cny"));
        assert_eq!(params.get_str("payOrderId"), None);
        assert_eq!(params.get_str("extParam").as_deref(), Some("x"));
    }

    #[test]
    fn test_query_refund_validation() {
        assert!(QueryRefundRequest::default().validate().is_err());
        let params = QueryRefundRequest::by_refund_order_id("RF1").to_params();
        assert_eq!(params.get_str("refundOrderId").as_deref(), Some("RF1"));
        assert!(params.contains_key("mchRefundNo"));
    }

    #[test]
    fn test_refund_states() {
        assert_eq!(RefundState::from(6), RefundState::PreConsumption);
        assert_eq!(RefundState::from(5), RefundState::Unknown(5));
        assert!(RefundState::Closed.is_terminal());
        assert!(!RefundState::Closed.is_notification_actionable());
        assert!(RefundState::Failed.is_notification_actionable());
        assert!(!RefundState::Refunding.is_terminal());
    }

    #[test]
    fn test_outcome_classification() {
        let info: RefundInfo = serde_json::from_value(json!({
            "refundOrderId": "RF1",
            "state": 3,
            "errCode": "E01",
            "errMsg": "insufficient balance"
        }))
        .unwrap();
        let outcome = RefundOutcome::from_info(info);
        assert!(outcome.should_notify_caller);
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.diagnostic.and_then(|d| d.err_code).as_deref(),
            Some("E01")
        );

        let info: RefundInfo = serde_json::from_value(json!({"state": 1})).unwrap();
        let outcome = RefundOutcome::from_info(info);
        assert!(!outcome.should_notify_caller);
        assert!(outcome.diagnostic.is_none());

        let outcome = RefundOutcome::from_info(RefundInfo::default());
        assert_eq!(outcome.state, None);
        assert!(!outcome.should_notify_caller);
    }
}
