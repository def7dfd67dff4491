//! Query-balance command

use anyhow::{Context, Result};
use std::path::Path;
use tonglian_lib::operations::{BalanceInfo, QueryBalanceRequest};

use super::{connect, Output};
use crate::ui;

#[tracing::instrument(skip(config, output))]
pub async fn run(config: &Path, chan_no: &str, output: Output) -> Result<()> {
    let client = connect(config)?;
    let spinner = ui::spinner("Querying balance...");
    let result = client.query_balance(&QueryBalanceRequest::new(chan_no)).await;
    spinner.finish_and_clear();
    let balance = result.context("Balance query failed")?;

    output.emit(&balance, |balance: &BalanceInfo| {
        ui::header(&format!("Balance ({})", chan_no));
        ui::optional("Total", balance.amount.as_deref());
        ui::optional("Available", balance.available_amt.as_deref());
        ui::optional("In transit", balance.transit_amt.as_deref());
        ui::optional("Sub-merchant", balance.cusid.as_deref());
    })
}
