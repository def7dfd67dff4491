//! Channel balance query.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{de, GatewayRequest};
use crate::params::ParameterSet;
use crate::{GatewayError, Result};

/// Query a channel balance (`/balance/query`).
///
/// `allinpay` needs `orgid`/`cusid` in the channel extras; `yunst2isv` needs
/// `bizUserId` and `acctType`.
#[derive(Clone, Debug, Default)]
pub struct QueryBalanceRequest {
    /// Channel: `allinpay` or `yunst2isv`.
    pub chan_no: String,
    pub channel_extra: Option<Map<String, Value>>,
}

impl QueryBalanceRequest {
    pub fn new(chan_no: impl Into<String>) -> Self {
        Self {
            chan_no: chan_no.into(),
            channel_extra: None,
        }
    }

    pub fn with_channel_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.channel_extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

impl GatewayRequest for QueryBalanceRequest {
    const OPERATION: &'static str = "query_balance";
    const PATH: &'static str = "/balance/query";

    fn validate(&self) -> Result<()> {
        if self.chan_no.trim().is_empty() {
            return Err(GatewayError::validation("chanNo", "must not be empty"));
        }
        Ok(())
    }

    fn to_params(&self) -> ParameterSet {
        ParameterSet::new().with("chanNo", self.chan_no.as_str())
    }

    fn channel_extra(&self) -> Option<&Map<String, Value>> {
        self.channel_extra.as_ref()
    }
}

/// Balances in major units (yuan), as decimal strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceInfo {
    /// Total balance.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub amount: Option<String>,
    /// Sub-merchant id (`allinpay`).
    #[serde(default, deserialize_with = "de::opt_string")]
    pub cusid: Option<String>,
    /// Available balance (`yunst2isv`).
    #[serde(default, deserialize_with = "de::opt_string")]
    pub available_amt: Option<String>,
    /// In-transit balance (`yunst2isv`).
    #[serde(default, deserialize_with = "de::opt_string")]
    pub transit_amt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_channel() {
        assert!(QueryBalanceRequest::new("").validate().unwrap_err().is_validation());
        assert!(QueryBalanceRequest::new("allinpay").validate().is_ok());
    }

    #[test]
    fn test_balance_decodes_numbers() {
        let info: BalanceInfo =
            serde_json::from_value(json!({"amount": 0.05, "cusid": "C1"})).unwrap();
        assert_eq!(info.amount.as_deref(), Some("0.05"));
        assert_eq!(info.cusid.as_deref(), Some("C1"));
        assert_eq!(info.available_amt, None);
    }
}
