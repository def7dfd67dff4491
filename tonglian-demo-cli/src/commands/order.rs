//! Order commands - place orders, request applet links, query orders

use anyhow::{Context, Result};
use std::path::Path;
use tonglian_lib::operations::{
    AppletLink, AppletUrlRequest, OrderCreated, OrderInfo, PayWayCode, QueryOrderRequest,
    UnifiedOrderRequest,
};

use super::{connect, parse_extra, Output};
use crate::ui;

/// Arguments for `unified-order`.
pub struct OrderArgs {
    pub order_no: String,
    pub amount: i64,
    pub way: String,
    pub notify_url: Option<String>,
    pub body: Option<String>,
    pub extra: Vec<String>,
}

#[tracing::instrument(skip(config, args, output), fields(order_no = %args.order_no))]
pub async fn unified_order(config: &Path, args: OrderArgs, output: Output) -> Result<()> {
    let way: PayWayCode = args
        .way
        .parse()
        .with_context(|| format!("Unknown payment method '{}'", args.way))?;

    let mut request = UnifiedOrderRequest::new(args.order_no, way, args.amount);
    if let Some(url) = args.notify_url {
        request = request.with_notify_url(url);
    }
    if let Some(body) = args.body {
        request = request.with_body(body);
    }
    let extra = parse_extra(&args.extra)?;
    if !extra.is_empty() {
        request.channel_extra = Some(extra);
    }

    if output.verbose && !output.json {
        let fields = way.channel_extra_fields();
        if !fields.is_empty() {
            ui::info(&format!("{} expects channel extras: {}", way.name(), fields.join(", ")));
        }
    }

    let client = connect(config)?;
    let spinner = ui::spinner("Placing order...");
    let result = client.unified_order(&request).await;
    spinner.finish_and_clear();
    let created = result.context("Unified order failed")?;

    output.emit(&created, |created: &OrderCreated| {
        ui::header("Order Placed");
        ui::optional("Pay order id", created.pay_order_id.as_deref());
        ui::optional("Merchant order", created.mch_order_no.as_deref());
        ui::optional("State", created.order_state);
        ui::optional("Pay data type", created.pay_data_type.as_deref());
        ui::optional("Pay data", created.pay_data.as_deref());
        if let Some(msg) = &created.err_msg {
            ui::warning(&format!(
                "Channel reported {}: {}",
                created.err_code.as_deref().unwrap_or("-"),
                msg
            ));
        }
    })
}

#[tracing::instrument(skip(config, notify_url, body, output))]
pub async fn applet_url(
    config: &Path,
    order_no: &str,
    amount: i64,
    notify_url: Option<String>,
    body: Option<String>,
    output: Output,
) -> Result<()> {
    let mut request = AppletUrlRequest::new(order_no, amount);
    if let Some(url) = notify_url {
        request = request.with_notify_url(url);
    }
    if let Some(body) = body {
        request = request.with_body(body);
    }

    let client = connect(config)?;
    let spinner = ui::spinner("Requesting applet link...");
    let result = client.applet_url(&request).await;
    spinner.finish_and_clear();
    let link = result.context("Applet link request failed")?;

    output.emit(&link, |link: &AppletLink| {
        ui::header("Applet Link");
        ui::optional("Pay order id", link.pay_order_id.as_deref());
        ui::optional("Merchant order", link.mch_order_no.as_deref());
        for (key, value) in &link.extra {
            ui::key_value(key, &value.to_string());
        }
    })
}

#[tracing::instrument(skip(config, output))]
pub async fn query_order(
    config: &Path,
    order_no: Option<String>,
    pay_order_id: Option<String>,
    output: Output,
) -> Result<()> {
    let request = match (order_no, pay_order_id) {
        (_, Some(id)) => QueryOrderRequest::by_pay_order_id(id),
        (Some(no), None) => QueryOrderRequest::by_mch_order_no(no),
        (None, None) => QueryOrderRequest::default(),
    };

    let client = connect(config)?;
    let spinner = ui::spinner("Querying order...");
    let result = client.query_order(&request).await;
    spinner.finish_and_clear();
    let order = result.context("Order query failed")?;

    output.emit(&order, |order: &OrderInfo| {
        ui::header("Order");
        ui::optional("Pay order id", order.pay_order_id.as_deref());
        ui::optional("Merchant order", order.mch_order_no.as_deref());
        ui::optional("Way", order.way_code.as_deref());
        ui::optional("Amount", order.amount.map(ui::fen));
        ui::optional("Channel order", order.channel_order_no.as_deref());
        ui::separator();
        match order.state {
            Some(state) if state.is_final() => ui::success(&format!("State: {}", state)),
            Some(state) => ui::info(&format!("State: {}", state)),
            None => ui::warning("Gateway did not report a state"),
        }
    })
}
