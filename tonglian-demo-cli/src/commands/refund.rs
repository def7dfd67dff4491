//! Refund commands - request and query refunds

use anyhow::{Context, Result};
use std::path::Path;
use tonglian_lib::operations::{QueryRefundRequest, RefundInfo, RefundOutcome, RefundRequest};

use super::{connect, Output};
use crate::ui;

/// Arguments for `refund`.
pub struct RefundArgs {
    pub refund_no: String,
    pub order_no: Option<String>,
    pub pay_order_id: Option<String>,
    pub amount: i64,
    pub reason: String,
    pub notify_url: Option<String>,
}

#[tracing::instrument(skip(config, args, output), fields(refund_no = %args.refund_no))]
pub async fn refund(config: &Path, args: RefundArgs, output: Output) -> Result<()> {
    let mut request = match (args.order_no, args.pay_order_id) {
        (_, Some(id)) => RefundRequest::for_pay_order(args.refund_no, id, args.amount, args.reason),
        (Some(no), None) => RefundRequest::for_mch_order(args.refund_no, no, args.amount, args.reason),
        (None, None) => RefundRequest {
            mch_refund_no: args.refund_no,
            refund_amount: args.amount,
            refund_reason: args.reason,
            ..RefundRequest::default()
        },
    };
    if let Some(url) = args.notify_url {
        request = request.with_notify_url(url);
    }

    let client = connect(config)?;
    let spinner = ui::spinner("Submitting refund...");
    let result = client.refund(&request).await;
    spinner.finish_and_clear();
    let outcome = result.context("Refund request failed")?;

    output.emit(&outcome, |outcome: &RefundOutcome| {
        ui::header("Refund");
        render_info(&outcome.info);
        ui::separator();
        match outcome.state {
            _ if outcome.is_success() => ui::success("Refund completed"),
            Some(state) if outcome.should_notify_caller => {
                ui::warning(&format!("Refund ended as {}", state));
                if let Some(diagnostic) = &outcome.diagnostic {
                    ui::optional("Error code", diagnostic.err_code.as_deref());
                    ui::optional("Error message", diagnostic.err_msg.as_deref());
                }
            }
            Some(state) => ui::info(&format!("Refund {}; await the notification", state)),
            None => ui::warning("Gateway did not report a refund state"),
        }
    })
}

#[tracing::instrument(skip(config, output))]
pub async fn query_refund(
    config: &Path,
    refund_no: Option<String>,
    refund_order_id: Option<String>,
    output: Output,
) -> Result<()> {
    let request = match (refund_no, refund_order_id) {
        (_, Some(id)) => QueryRefundRequest::by_refund_order_id(id),
        (Some(no), None) => QueryRefundRequest::by_mch_refund_no(no),
        (None, None) => QueryRefundRequest::default(),
    };

    let client = connect(config)?;
    let spinner = ui::spinner("Querying refund...");
    let result = client.query_refund(&request).await;
    spinner.finish_and_clear();
    let info = result.context("Refund query failed")?;

    output.emit(&info, |info: &RefundInfo| {
        ui::header("Refund");
        render_info(info);
        ui::optional("State", info.state);
    })
}

fn render_info(info: &RefundInfo) {
    ui::optional("Refund order id", info.refund_order_id.as_deref());
    ui::optional("Merchant refund", info.mch_refund_no.as_deref());
    ui::optional("Pay order id", info.pay_order_id.as_deref());
    ui::optional("Paid", info.pay_amount.map(ui::fen));
    ui::optional("Refunded", info.refund_amount.map(ui::fen));
}
