//! Inbound payment and refund notifications.
//!
//! A notification is never trusted on its own. Each one goes through, in
//! order and stopping at the first failure:
//!
//! 1. signature check over the claim (minus `sign`);
//! 2. merchant and application identity check;
//! 3. re-query of the authoritative order or refund;
//! 4. state and amount check against the authoritative record;
//! 5. the caller's business callback.
//!
//! The surrounding server framework builds a [`NotificationRequest`] from the
//! raw HTTP request, calls a handler, and answers the gateway with
//! [`NotifyAck::as_str`] on `Ok`, or with an error response otherwise.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::client::GatewayClient;
use crate::clock::Clock;
use crate::errors::NotificationFailure;
use crate::operations::{
    OrderInfo, OrderState, QueryOrderRequest, QueryRefundRequest, RefundInfo, RefundState,
};
use crate::params::ParameterSet;
use crate::transport::HttpTransport;
use crate::{GatewayError, Result};

/// Body the gateway expects after a notification was handled.
pub const NOTIFY_ACK: &str = "success";

/// Raw inbound notification as received by the HTTP server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Raw query string, with or without the leading `?`.
    pub query: String,
    /// Raw request body.
    pub body: String,
    /// `Content-Type` header value.
    pub content_type: String,
}

impl NotificationRequest {
    /// Notification carried entirely in the query string.
    pub fn from_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Notification with a JSON body.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: "application/json".to_string(),
            ..Self::default()
        }
    }

    /// Notification with a form-encoded body.
    pub fn form(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: "application/x-www-form-urlencoded".to_string(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    fn is_json(&self) -> bool {
        self.content_type
            .to_ascii_lowercase()
            .contains("application/json")
    }

    /// Merge query and body fields into one set; body fields win on collision.
    pub fn claim(&self) -> Result<ParameterSet> {
        let mut claim = parse_form(self.query.trim_start_matches('?'));

        let body = self.body.trim();
        if !body.is_empty() {
            let fields = if self.is_json() {
                parse_json(body)?
            } else {
                parse_form(body)
            };
            claim.extend(fields);
        }
        Ok(claim)
    }
}

fn parse_form(input: &str) -> ParameterSet {
    url::form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

fn parse_json(input: &str) -> Result<ParameterSet> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(object)) => Ok(ParameterSet::from_object(object)),
        Ok(_) => Err(NotificationFailure::Malformed("JSON body is not an object".into()).into()),
        Err(e) => Err(NotificationFailure::Malformed(e.to_string()).into()),
    }
}

/// What a handler did with an accepted notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyAck {
    /// Verified and passed to the business callback.
    Processed,
    /// Verified, but the refund is not in an actionable state yet; the
    /// callback was not invoked.
    Deferred(Option<RefundState>),
}

impl NotifyAck {
    /// Body to return to the gateway.
    pub fn as_str(&self) -> &'static str {
        NOTIFY_ACK
    }

    /// Returns true if the business callback ran.
    pub fn callback_invoked(&self) -> bool {
        matches!(self, Self::Processed)
    }
}

impl fmt::Display for NotifyAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified payment notification.
#[derive(Clone, Debug, PartialEq)]
pub struct PayNotification {
    /// Notification fields, without `sign`.
    pub claim: ParameterSet,
    /// Authoritative order record.
    pub order: OrderInfo,
}

/// Verified refund notification.
#[derive(Clone, Debug, PartialEq)]
pub struct RefundNotification {
    /// Notification fields, without `sign`.
    pub claim: ParameterSet,
    /// Authoritative refund record.
    pub refund: RefundInfo,
}

impl RefundNotification {
    /// Returns true if the authoritative state should reach business logic.
    pub fn is_actionable(&self) -> bool {
        self.refund
            .state
            .is_some_and(|s| s.is_notification_actionable())
    }
}

impl<T: HttpTransport, C: Clock> GatewayClient<T, C> {
    /// Verify a payment notification and run `callback` on it.
    ///
    /// Errors from `callback` are returned as [`GatewayError::Callback`] with
    /// the original error as the source.
    pub async fn handle_pay_notify<F, Fut, E>(
        &self,
        request: &NotificationRequest,
        callback: F,
    ) -> Result<NotifyAck>
    where
        F: FnOnce(PayNotification) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let notification = self
            .verify_pay_notification(request)
            .await
            .inspect_err(|e| error!(error = %e, "pay notification rejected"))?;

        info!(
            pay_order_id = ?notification.order.pay_order_id,
            mch_order_no = ?notification.order.mch_order_no,
            amount = ?notification.order.amount,
            "pay notification verified"
        );

        run_callback(callback, notification).await?;
        Ok(NotifyAck::Processed)
    }

    /// Verify a refund notification and run `callback` on it.
    ///
    /// When the authoritative refund is still pending the callback is skipped
    /// and [`NotifyAck::Deferred`] is returned, so the gateway retries later.
    pub async fn handle_refund_notify<F, Fut, E>(
        &self,
        request: &NotificationRequest,
        callback: F,
    ) -> Result<NotifyAck>
    where
        F: FnOnce(RefundNotification) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let notification = self
            .verify_refund_notification(request)
            .await
            .inspect_err(|e| error!(error = %e, "refund notification rejected"))?;

        if !notification.is_actionable() {
            warn!(
                refund_order_id = ?notification.refund.refund_order_id,
                state = ?notification.refund.state,
                "refund notification not actionable yet"
            );
            return Ok(NotifyAck::Deferred(notification.refund.state));
        }

        info!(
            refund_order_id = ?notification.refund.refund_order_id,
            mch_refund_no = ?notification.refund.mch_refund_no,
            state = ?notification.refund.state,
            "refund notification verified"
        );

        run_callback(callback, notification).await?;
        Ok(NotifyAck::Processed)
    }

    /// Run every check on a payment notification without invoking business logic.
    pub async fn verify_pay_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<PayNotification> {
        let claim = self.authenticate(request, "pay notification")?;
        let pay_order_id = required(&claim, "payOrderId")?;

        let order = self
            .query_order(&QueryOrderRequest::by_pay_order_id(pay_order_id))
            .await?;

        match order.state {
            Some(OrderState::Success) => {}
            Some(state) => {
                return Err(NotificationFailure::UnexpectedState { state: state.code() }.into())
            }
            None => return Err(NotificationFailure::MissingField("state").into()),
        }
        check_amount(&claim, "amount", order.amount)?;

        Ok(PayNotification { claim, order })
    }

    /// Run every check on a refund notification without invoking business logic.
    ///
    /// A notification whose refund is not actionable yet is returned as-is;
    /// the amount is only compared for actionable refunds.
    pub async fn verify_refund_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<RefundNotification> {
        let claim = self.authenticate(request, "refund notification")?;
        let refund_order_id = required(&claim, "refundOrderId")?;

        let refund = self
            .query_refund(&QueryRefundRequest::by_refund_order_id(refund_order_id))
            .await?;

        let notification = RefundNotification { claim, refund };
        if notification.is_actionable() {
            check_amount(
                &notification.claim,
                "refundAmount",
                notification.refund.refund_amount,
            )?;
        }
        Ok(notification)
    }

    fn authenticate(&self, request: &NotificationRequest, context: &str) -> Result<ParameterSet> {
        let claim = self.signer().open(request.claim()?, context)?;

        let config = self.config();
        match claim.get_str("mchNo") {
            Some(received) if received == config.merchant_id => {}
            received => {
                return Err(NotificationFailure::MerchantMismatch {
                    expected: config.merchant_id.clone(),
                    received: received.unwrap_or_default(),
                }
                .into())
            }
        }
        match claim.get_str("appId") {
            Some(received) if received == config.app_id => {}
            received => {
                return Err(NotificationFailure::AppMismatch {
                    expected: config.app_id.clone(),
                    received: received.unwrap_or_default(),
                }
                .into())
            }
        }
        Ok(claim)
    }
}

async fn run_callback<N, F, Fut, E>(callback: F, notification: N) -> Result<()>
where
    F: FnOnce(N) -> Fut,
    Fut: Future<Output = std::result::Result<(), E>>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    callback(notification)
        .await
        .map_err(|e| GatewayError::Callback(e.into()))
        .inspect_err(|e| error!(error = %e, "notification business callback failed"))
}

fn required(claim: &ParameterSet, field: &'static str) -> Result<String> {
    claim
        .get_str(field)
        .ok_or_else(|| NotificationFailure::MissingField(field).into())
}

fn check_amount(claim: &ParameterSet, field: &'static str, authoritative: Option<i64>) -> Result<()> {
    let claimed = required(claim, field)?;
    if claimed.trim().parse::<i64>().ok() == authoritative && authoritative.is_some() {
        return Ok(());
    }
    Err(NotificationFailure::AmountMismatch {
        claimed,
        authoritative: authoritative.map(|a| a.to_string()).unwrap_or_default(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_overrides_query() {
        let request = NotificationRequest::json(r#"{"amount": 100, "mchNo": "M1"}"#)
            .with_query("?amount=1&appId=A1");
        let claim = request.claim().unwrap();
        assert_eq!(claim.get_str("amount").as_deref(), Some("100"));
        assert_eq!(claim.get_str("appId").as_deref(), Some("A1"));
        assert_eq!(claim.get_str("mchNo").as_deref(), Some("M1"));
    }

    #[test]
    fn test_form_body_decoding() {
        let request = NotificationRequest::form("sign=ab%2Bc&body=a+b&mchNo=M1");
        let claim = request.claim().unwrap();
        assert_eq!(claim.get_str("sign").as_deref(), Some("ab+c"));
        assert_eq!(claim.get_str("body").as_deref(), Some("a b"));
    }

    #[test]
    fn test_json_content_type_detection() {
        let request = NotificationRequest {
            body: r#"{"a":"1"}"#.into(),
            content_type: "Application/JSON; charset=utf-8".into(),
            ..NotificationRequest::default()
        };
        assert_eq!(request.claim().unwrap().get_str("a").as_deref(), Some("1"));
    }

    #[test]
    fn test_malformed_json() {
        let err = NotificationRequest::json("[1,2]").claim().unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Notification(NotificationFailure::Malformed(_))
        ));
        assert!(NotificationRequest::json("{").claim().is_err());
    }

    #[test]
    fn test_check_amount() {
        let claim = ParameterSet::new().with("amount", "100");
        assert!(check_amount(&claim, "amount", Some(100)).is_ok());
        assert!(check_amount(&claim, "amount", Some(99)).is_err());
        assert!(check_amount(&claim, "amount", None).is_err());

        let err = check_amount(&ParameterSet::new(), "amount", Some(100)).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Notification(NotificationFailure::MissingField("amount"))
        ));
    }

    #[test]
    fn test_ack_string() {
        assert_eq!(NotifyAck::Processed.as_str(), "success");
        assert_eq!(NotifyAck::Deferred(Some(RefundState::Refunding)).to_string(), "success");
        assert!(!NotifyAck::Deferred(None).callback_invoked());
    }
}
