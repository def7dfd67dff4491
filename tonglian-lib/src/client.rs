//! Gateway client: envelope construction, dispatch and response checks.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::GatewayConfig;
use crate::operations::{
    AppletLink, AppletUrlRequest, BalanceInfo, BillFile, DownloadBillRequest, GatewayRequest,
    OrderCreated, OrderInfo, QueryBalanceRequest, QueryOrderRequest, QueryRefundRequest,
    RefundInfo, RefundOutcome, RefundRequest, RefundState, UnifiedOrderRequest,
};
use crate::params::{merge_channel_extra, render_value, ParameterSet};
use crate::signing::Signer;
use crate::transport::HttpTransport;
use crate::{GatewayError, Result};

/// Value of the `version` field on every request.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Client for one merchant configuration.
///
/// Holds no per-call state; one instance can serve concurrent calls.
pub struct GatewayClient<T, C = SystemClock> {
    config: GatewayConfig,
    signer: Signer,
    transport: T,
    clock: C,
}

impl<T: HttpTransport> GatewayClient<T> {
    /// Create a client using the system clock.
    ///
    /// Fails if the configuration is invalid or its key material does not
    /// match the selected algorithm.
    pub fn new(config: GatewayConfig, transport: T) -> Result<Self> {
        Self::with_clock(config, transport, SystemClock)
    }
}

#[cfg(feature = "http-transport")]
impl GatewayClient<crate::transport::ReqwestTransport> {
    /// Create a client with a reqwest transport built from the configuration.
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let transport = crate::transport::ReqwestTransport::from_config(&config)?;
        Self::new(config, transport)
    }
}

impl<T: HttpTransport, C: Clock> GatewayClient<T, C> {
    /// Create a client with an explicit clock.
    pub fn with_clock(config: GatewayConfig, transport: T, clock: C) -> Result<Self> {
        let signer = config.build_signer()?;
        debug!(
            merchant_id = %config.merchant_id,
            sign_type = %signer.sign_type(),
            "gateway client ready"
        );
        Ok(Self {
            config,
            signer,
            transport,
            clock,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Validate a request and produce the signed parameter set that would be sent.
    ///
    /// Field checks and clock-dependent preconditions both run here, so no
    /// request reaches the transport without passing them.
    pub fn build_envelope<R: GatewayRequest>(&self, request: &R) -> Result<ParameterSet> {
        request.validate()?;
        request.check_preconditions(self.clock.now())?;

        let mut params = request.to_params();
        params
            .insert("mchNo", self.config.merchant_id.as_str())
            .insert("orgId", self.config.org_id.as_str())
            .insert("appId", self.config.app_id.as_str())
            .insert("reqTime", self.clock.now_millis().to_string())
            .insert("version", PROTOCOL_VERSION)
            .insert("signType", self.signer.sign_type().as_str());

        let no_extras = Map::new();
        let call_extra = if R::INHERITS_CHANNEL_EXTRA {
            request.channel_extra()
        } else {
            Some(&no_extras)
        };
        let channel_extra = merge_channel_extra(&self.config.channel_extra, call_extra)?;
        params.insert("channelExtra", channel_extra);

        self.signer.seal(params)
    }

    /// Run a request and return the verified `data` payload.
    pub async fn execute<R: GatewayRequest>(&self, request: &R) -> Result<Value> {
        let params = self.build_envelope(request)?;
        let url = self.config.endpoint(R::PATH);
        debug!(operation = R::OPERATION, url = %url, "sending gateway request");

        self.dispatch(R::OPERATION, &url, params)
            .await
            .inspect_err(|e| {
                error!(
                    operation = R::OPERATION,
                    url = %url,
                    code = ?e.code(),
                    error = %e,
                    "gateway request failed"
                )
            })
    }

    async fn dispatch(&self, operation: &'static str, url: &str, params: ParameterSet) -> Result<Value> {
        let body = serde_json::to_string(&params)?;
        let headers = [("Content-Type".to_string(), "application/json".to_string())];
        let response = self.transport.post(url, body, &headers).await;

        if !response.is_success() {
            let reason = match response.transport_error.as_deref().filter(|e| !e.is_empty()) {
                Some(e) => e.to_string(),
                None => format!("HTTP status {}", response.status),
            };
            return Err(GatewayError::Transport {
                url: url.to_string(),
                status: (response.status != 0).then_some(response.status),
                reason,
                body: (!response.body.is_empty()).then_some(response.body),
                params: Box::new(params),
            });
        }

        let decoded: Value = serde_json::from_str(&response.body).map_err(|e| {
            GatewayError::Serialization(format!("{operation}: response is not JSON: {e}"))
        })?;
        let Value::Object(mut object) = decoded else {
            return Err(GatewayError::Serialization(format!(
                "{operation}: response is not a JSON object"
            )));
        };

        // a signed payload is checked before the result code is looked at
        if let (Some(data), Some(sign)) = (present(&object, "data"), present(&object, "sign")) {
            self.verify_payload(operation, data, sign)?;
        }

        let code = object.get("code").and_then(result_code).ok_or_else(|| {
            GatewayError::Serialization(format!("{operation}: response has no result code"))
        })?;
        if code != 0 {
            let message = object.get("msg").and_then(render_value).unwrap_or_default();
            return Err(GatewayError::Business {
                operation,
                code,
                message,
                response: Value::Object(object),
                params: Box::new(params),
            });
        }

        Ok(object.remove("data").unwrap_or(Value::Null))
    }

    fn verify_payload(&self, operation: &str, data: &Value, sign: &Value) -> Result<()> {
        let context = format!("{operation} response");
        let Value::Object(fields) = data else {
            return Err(GatewayError::signature(format!("{context}: signed data is not an object")));
        };
        let sign = render_value(sign).unwrap_or_default();
        let payload = ParameterSet::from_object(fields.clone());
        if self.signer.verify(&payload, &sign)? {
            Ok(())
        } else {
            Err(GatewayError::signature(context))
        }
    }

    async fn call<R: GatewayRequest, D: DeserializeOwned>(&self, request: &R) -> Result<D> {
        let data = self.execute(request).await?;
        decode(R::OPERATION, data)
    }

    /// Place an order.
    pub async fn unified_order(&self, request: &UnifiedOrderRequest) -> Result<OrderCreated> {
        self.call(request).await
    }

    /// Obtain a mini-program payment link.
    pub async fn applet_url(&self, request: &AppletUrlRequest) -> Result<AppletLink> {
        self.call(request).await
    }

    /// Request a refund.
    ///
    /// Failed and closed refunds are reported through the outcome, not as errors.
    pub async fn refund(&self, request: &RefundRequest) -> Result<RefundOutcome> {
        let info: RefundInfo = self.call(request).await?;
        let outcome = RefundOutcome::from_info(info);

        let refund_order_id = outcome.info.refund_order_id.as_deref().unwrap_or_default();
        let mch_refund_no = outcome.info.mch_refund_no.as_deref().unwrap_or_default();
        match outcome.state {
            Some(RefundState::Success) => info!(
                refund_order_id,
                mch_refund_no,
                amount = ?outcome.info.refund_amount,
                "refund succeeded"
            ),
            Some(RefundState::Failed) => error!(
                refund_order_id,
                mch_refund_no,
                amount = ?outcome.info.refund_amount,
                err_code = ?outcome.info.err_code,
                err_msg = ?outcome.info.err_msg,
                "refund failed"
            ),
            Some(RefundState::Closed) => warn!(refund_order_id, mch_refund_no, "refund closed"),
            Some(RefundState::PreConsumption) => {
                info!(refund_order_id, mch_refund_no, "pre-consumption refund")
            }
            state => info!(
                refund_order_id,
                mch_refund_no,
                state = ?state,
                "refund in progress"
            ),
        }

        Ok(outcome)
    }

    /// Query an order.
    pub async fn query_order(&self, request: &QueryOrderRequest) -> Result<OrderInfo> {
        self.call(request).await
    }

    /// Query a refund.
    pub async fn query_refund(&self, request: &QueryRefundRequest) -> Result<RefundInfo> {
        self.call(request).await
    }

    /// Fetch the statement file link for a day.
    ///
    /// Rejected locally with [`GatewayError::BillNotAvailable`] before 11:00
    /// on the following day.
    pub async fn download_bill(&self, request: &DownloadBillRequest) -> Result<BillFile> {
        let file: BillFile = self.call(request).await?;
        info!(day = %request.day, file_url = ?file.file_url, "statement link retrieved");
        Ok(file)
    }

    /// Query a channel balance.
    pub async fn query_balance(&self, request: &QueryBalanceRequest) -> Result<BalanceInfo> {
        self.call(request).await
    }
}

/// Decode a `data` payload; a missing payload decodes as an empty object.
fn decode<D: DeserializeOwned>(operation: &str, data: Value) -> Result<D> {
    let data = match data {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(data)
        .map_err(|e| GatewayError::Serialization(format!("{operation}: unexpected data: {e}")))
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn result_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
