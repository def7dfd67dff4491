//! Payment method catalogue.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{GatewayError, Result};

/// Payment methods accepted in `wayCode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayWayCode {
    /// WeChat pre-consumption.
    #[serde(rename = "WX_TRANS")]
    WxTrans,
    /// WeChat mini program.
    #[serde(rename = "WX_LITE")]
    WxLite,
    /// WeChat official account.
    #[serde(rename = "WX_JSAPI")]
    WxJsapi,
    /// Alipay official account.
    #[serde(rename = "ALI_JSAPI")]
    AliJsapi,
    /// Alipay merchant-presented QR.
    #[serde(rename = "ALI_QR")]
    AliQr,
    /// WeChat merchant-presented QR.
    #[serde(rename = "WX_NATIVE")]
    WxNative,
    /// WeChat enterprise pay.
    #[serde(rename = "YUNST2_WQF_ZZHK")]
    Yunst2WqfZzhk,
    /// Hosted H5 cashier page.
    #[serde(rename = "H5_CASHIER")]
    H5Cashier,
    /// Customer-presented barcode.
    #[serde(rename = "AUTO_BAR")]
    AutoBar,
    /// B2B order payment.
    #[serde(rename = "B2B_ORDER_PAY")]
    B2bOrderPay,
    /// Cloud WeChat pay.
    #[serde(rename = "YW_PAY")]
    YwPay,
    /// JD Baitiao instalments.
    #[serde(rename = "JDBT_PAY")]
    JdbtPay,
}

impl PayWayCode {
    /// Every known payment method.
    pub const ALL: [PayWayCode; 12] = [
        Self::WxTrans,
        Self::WxLite,
        Self::WxJsapi,
        Self::AliJsapi,
        Self::AliQr,
        Self::WxNative,
        Self::Yunst2WqfZzhk,
        Self::H5Cashier,
        Self::AutoBar,
        Self::B2bOrderPay,
        Self::YwPay,
        Self::JdbtPay,
    ];

    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WxTrans => "WX_TRANS",
            Self::WxLite => "WX_LITE",
            Self::WxJsapi => "WX_JSAPI",
            Self::AliJsapi => "ALI_JSAPI",
            Self::AliQr => "ALI_QR",
            Self::WxNative => "WX_NATIVE",
            Self::Yunst2WqfZzhk => "YUNST2_WQF_ZZHK",
            Self::H5Cashier => "H5_CASHIER",
            Self::AutoBar => "AUTO_BAR",
            Self::B2bOrderPay => "B2B_ORDER_PAY",
            Self::YwPay => "YW_PAY",
            Self::JdbtPay => "JDBT_PAY",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WxTrans => "WeChat pre-consumption",
            Self::WxLite => "WeChat mini program",
            Self::WxJsapi => "WeChat official account",
            Self::AliJsapi => "Alipay official account",
            Self::AliQr => "Alipay QR",
            Self::WxNative => "WeChat native QR",
            Self::Yunst2WqfZzhk => "WeChat enterprise pay",
            Self::H5Cashier => "H5 cashier",
            Self::AutoBar => "Barcode",
            Self::B2bOrderPay => "B2B order payment",
            Self::YwPay => "Cloud WeChat pay",
            Self::JdbtPay => "Baitiao instalments",
        }
    }

    /// `channelExtra` keys this method expects.
    pub fn channel_extra_fields(&self) -> &'static [&'static str] {
        match self {
            Self::WxTrans | Self::WxLite | Self::WxJsapi => &["openid", "subAppid"],
            Self::AliJsapi => &["buyerUserId"],
            Self::AliQr | Self::WxNative | Self::H5Cashier => &[],
            Self::Yunst2WqfZzhk => &["goodsinfo", "frontCallbackUrl"],
            Self::AutoBar => &["authcode", "terminfo"],
            Self::B2bOrderPay => &["goodsinfo", "acctno", "acctname", "accttype", "bankcode"],
            Self::YwPay => &["apptype", "appname", "truename", "idno", "extendparams"],
            Self::JdbtPay => &["fqnum"],
        }
    }
}

impl fmt::Display for PayWayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayWayCode {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GatewayError::validation("wayCode", format!("unknown payment method: {s}")))
    }
}

impl From<PayWayCode> for String {
    fn from(code: PayWayCode) -> Self {
        code.as_str().to_string()
    }
}
