//! Download-bill command - fetch the statement link for a day

use anyhow::{Context, Result};
use chrono::{Days, Local};
use std::path::Path;
use tonglian_lib::operations::{BillFile, DownloadBillRequest};

use super::{connect, Output};
use crate::ui;

#[tracing::instrument(skip(config, output))]
pub async fn run(config: &Path, day: Option<String>, output: Output) -> Result<()> {
    let request = match day {
        Some(day) => DownloadBillRequest::new(day),
        None => {
            let yesterday = Local::now()
                .date_naive()
                .checked_sub_days(Days::new(1))
                .context("Date out of range")?;
            DownloadBillRequest::for_date(yesterday)
        }
    };

    let client = connect(config)?;
    let spinner = ui::spinner(&format!("Fetching statement for {}...", request.day));
    let result = client.download_bill(&request).await;
    spinner.finish_and_clear();
    let file = result.with_context(|| format!("Statement for {} unavailable", request.day))?;

    output.emit(&file, |file: &BillFile| match &file.file_url {
        Some(url) => {
            ui::success(&format!("Statement for {}", request.day));
            ui::key_value("File", url);
        }
        None => ui::warning("Gateway returned no file link"),
    })
}
