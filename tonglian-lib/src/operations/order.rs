//! Order placement and order queries.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{de, non_blank, GatewayRequest, PayWayCode};
use crate::params::ParameterSet;
use crate::{GatewayError, Result};

const DEFAULT_ORDER_CURRENCY: &str = "CNY";
const DEFAULT_URL_TYPE: &str = "URL_Common";
const DEFAULT_BUSI_TYPE: &str = "1";

/// Place an order (`/pay/unifiedOrder`).
#[derive(Clone, Debug, Default)]
pub struct UnifiedOrderRequest {
    /// Merchant order reference, unique per merchant.
    pub mch_order_no: String,
    /// Payment method, usually a [`PayWayCode`].
    pub way_code: String,
    /// Amount in minor units (fen).
    pub amount: i64,
    /// Currency code. Defaults to `CNY`.
    pub currency: Option<String>,
    pub client_ip: Option<String>,
    pub notify_url: Option<String>,
    /// Goods description.
    pub body: Option<String>,
    /// Call-level channel extras.
    pub channel_extra: Option<Map<String, Value>>,
}

impl UnifiedOrderRequest {
    pub fn new(mch_order_no: impl Into<String>, way_code: PayWayCode, amount: i64) -> Self {
        Self {
            mch_order_no: mch_order_no.into(),
            way_code: way_code.into(),
            amount,
            ..Self::default()
        }
    }

    pub fn with_notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_channel_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.channel_extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

impl GatewayRequest for UnifiedOrderRequest {
    const OPERATION: &'static str = "unified_order";
    const PATH: &'static str = "/pay/unifiedOrder";

    fn validate(&self) -> Result<()> {
        require_order_no(&self.mch_order_no)?;
        require_positive_amount("amount", self.amount)
    }

    fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        params
            .insert("mchOrderNo", self.mch_order_no.as_str())
            .insert("wayCode", self.way_code.as_str())
            .insert("amount", self.amount.to_string())
            .insert(
                "currency",
                self.currency.as_deref().unwrap_or(DEFAULT_ORDER_CURRENCY),
            )
            .insert_opt("clientIp", self.client_ip.as_deref())
            .insert_opt("notifyUrl", self.notify_url.as_deref())
            .insert_opt("body", self.body.as_deref());
        params
    }

    fn channel_extra(&self) -> Option<&Map<String, Value>> {
        self.channel_extra.as_ref()
    }
}

/// Obtain a mini-program payment link (`/applet/getAppletUrl`).
#[derive(Clone, Debug, Default)]
pub struct AppletUrlRequest {
    pub mch_order_no: String,
    /// Amount in minor units (fen).
    pub amount: i64,
    pub notify_url: Option<String>,
    pub body: Option<String>,
    /// Link type. Defaults to `URL_Common`.
    pub url_type: Option<String>,
    pub channel_extra: Option<Map<String, Value>>,
}

impl AppletUrlRequest {
    pub fn new(mch_order_no: impl Into<String>, amount: i64) -> Self {
        Self {
            mch_order_no: mch_order_no.into(),
            amount,
            ..Self::default()
        }
    }

    pub fn with_notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl GatewayRequest for AppletUrlRequest {
    const OPERATION: &'static str = "applet_url";
    const PATH: &'static str = "/applet/getAppletUrl";

    fn validate(&self) -> Result<()> {
        require_order_no(&self.mch_order_no)?;
        require_positive_amount("amount", self.amount)
    }

    fn to_params(&self) -> ParameterSet {
        let url_type = non_blank(self.url_type.as_deref()).unwrap_or(DEFAULT_URL_TYPE);
        let mut params = ParameterSet::new();
        params
            .insert("mchOrderNo", self.mch_order_no.as_str())
            .insert("amount", self.amount.to_string())
            .insert_opt("notifyUrl", self.notify_url.as_deref())
            .insert_opt("body", self.body.as_deref())
            .insert("urlType", url_type);
        params
    }

    fn channel_extra(&self) -> Option<&Map<String, Value>> {
        self.channel_extra.as_ref()
    }
}

/// Query an order (`/pay/query`). Channel extras are never sent.
#[derive(Clone, Debug, Default)]
pub struct QueryOrderRequest {
    pub mch_order_no: Option<String>,
    pub pay_order_id: Option<String>,
    /// Business type: `1` payment, `4` withdrawal, `5` transfer. Defaults to `1`.
    pub busi_type: Option<String>,
}

impl QueryOrderRequest {
    /// Query by merchant order reference.
    pub fn by_mch_order_no(mch_order_no: impl Into<String>) -> Self {
        Self {
            mch_order_no: Some(mch_order_no.into()),
            ..Self::default()
        }
    }

    /// Query by gateway order id.
    pub fn by_pay_order_id(pay_order_id: impl Into<String>) -> Self {
        Self {
            pay_order_id: Some(pay_order_id.into()),
            ..Self::default()
        }
    }

    pub fn with_busi_type(mut self, busi_type: impl Into<String>) -> Self {
        self.busi_type = Some(busi_type.into());
        self
    }
}

impl GatewayRequest for QueryOrderRequest {
    const OPERATION: &'static str = "query_order";
    const PATH: &'static str = "/pay/query";
    const INHERITS_CHANNEL_EXTRA: bool = false;

    fn validate(&self) -> Result<()> {
        if non_blank(self.mch_order_no.as_deref()).is_none()
            && non_blank(self.pay_order_id.as_deref()).is_none()
        {
            return Err(GatewayError::validation(
                "mchOrderNo/payOrderId",
                "one of the two must be given",
            ));
        }
        Ok(())
    }

    fn to_params(&self) -> ParameterSet {
        let busi_type = non_blank(self.busi_type.as_deref()).unwrap_or(DEFAULT_BUSI_TYPE);
        let mut params = ParameterSet::new();
        params
            .insert_opt("mchOrderNo", self.mch_order_no.as_deref())
            .insert_opt("payOrderId", self.pay_order_id.as_deref())
            .insert("busiType", busi_type);
        params
    }
}

/// Order lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderState {
    Generated,
    Paying,
    Success,
    Failed,
    Cancelled,
    Refunded,
    Closed,
    /// A code this client does not know.
    Unknown(i64),
}

impl OrderState {
    /// Numeric state code.
    pub fn code(&self) -> i64 {
        match self {
            Self::Generated => 0,
            Self::Paying => 1,
            Self::Success => 2,
            Self::Failed => 3,
            Self::Cancelled => 4,
            Self::Refunded => 5,
            Self::Closed => 6,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns true once the order can no longer change on its own.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Cancelled | Self::Refunded | Self::Closed
        )
    }
}

impl From<i64> for OrderState {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Generated,
            1 => Self::Paying,
            2 => Self::Success,
            3 => Self::Failed,
            4 => Self::Cancelled,
            5 => Self::Refunded,
            6 => Self::Closed,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated => f.write_str("generated"),
            Self::Paying => f.write_str("paying"),
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Refunded => f.write_str("refunded"),
            Self::Closed => f.write_str("closed"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

impl Serialize for OrderState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for OrderState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        de::i64_code(deserializer).map(Self::from)
    }
}

/// Result of placing an order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pay_order_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub mch_order_no: Option<String>,
    #[serde(default)]
    pub order_state: Option<OrderState>,
    /// How to interpret `pay_data` (e.g. `payurl`, `codeUrl`).
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pay_data_type: Option<String>,
    /// Payment payload handed to the payer.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pay_data: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub err_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub err_msg: Option<String>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of requesting a mini-program link.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppletLink {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pay_order_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub mch_order_no: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Authoritative order record returned by `/pay/query`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub mch_no: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub app_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pay_order_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub mch_order_no: Option<String>,
    /// Payment interface.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub if_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub way_code: Option<String>,
    /// Amount in minor units (fen).
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub amount: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub currency: Option<String>,
    #[serde(default)]
    pub state: Option<OrderState>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub channel_order_no: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub err_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub err_msg: Option<String>,
    /// Merchant extension echoed back by the gateway.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub ext_param: Option<String>,
    /// Creation time, Unix milliseconds.
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub created_at: Option<i64>,
    /// Payment time, Unix milliseconds.
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub success_time: Option<i64>,
    /// Channel fee in minor units.
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub channel_fee_amount: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn require_order_no(mch_order_no: &str) -> Result<()> {
    if mch_order_no.trim().is_empty() {
        return Err(GatewayError::validation("mchOrderNo", "must not be empty"));
    }
    Ok(())
}

pub(super) fn require_positive_amount(field: &str, amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(GatewayError::validation(
            field,
            format!("must be greater than 0, got {amount}"),
        ));
    }
    Ok(())
}
