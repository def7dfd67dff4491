//! Tonglian Demo CLI
//!
//! Command-line interface for exercising the Tonglian gateway client.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "tonglian-demo")]
#[command(about = "Tonglian Demo CLI - Place orders, refunds and queries against the Allinpay gateway", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gateway configuration file (falls back to TONGLIAN_* env vars when missing)
    #[arg(short, long, global = true, default_value = "tonglian.json")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Place an order (/pay/unifiedOrder)
    UnifiedOrder {
        /// Merchant order number
        #[arg(long)]
        order_no: String,

        /// Amount in fen
        #[arg(short, long)]
        amount: i64,

        /// Payment method (e.g. WX_LITE, ALI_QR)
        #[arg(short, long)]
        way: String,

        /// Asynchronous notification URL
        #[arg(long)]
        notify_url: Option<String>,

        /// Goods description
        #[arg(long)]
        body: Option<String>,

        /// Channel extra field, repeatable (key=value)
        #[arg(short = 'e', long = "extra", value_name = "KEY=VALUE")]
        extra: Vec<String>,
    },

    /// Request a mini-program payment link (/applet/getAppletUrl)
    AppletUrl {
        /// Merchant order number
        #[arg(long)]
        order_no: String,

        /// Amount in fen
        #[arg(short, long)]
        amount: i64,

        /// Asynchronous notification URL
        #[arg(long)]
        notify_url: Option<String>,

        /// Goods description
        #[arg(long)]
        body: Option<String>,
    },

    /// Refund an order (/refund/refundOrder)
    Refund {
        /// Merchant refund number
        #[arg(long)]
        refund_no: String,

        /// Merchant order number of the original payment
        #[arg(long, conflicts_with = "pay_order_id", required_unless_present = "pay_order_id")]
        order_no: Option<String>,

        /// Gateway order id of the original payment
        #[arg(long)]
        pay_order_id: Option<String>,

        /// Refund amount in fen
        #[arg(short, long)]
        amount: i64,

        /// Refund reason
        #[arg(short, long)]
        reason: String,

        /// Asynchronous notification URL
        #[arg(long)]
        notify_url: Option<String>,
    },

    /// Query an order (/pay/query)
    QueryOrder {
        /// Merchant order number
        #[arg(long, conflicts_with = "pay_order_id", required_unless_present = "pay_order_id")]
        order_no: Option<String>,

        /// Gateway order id
        #[arg(long)]
        pay_order_id: Option<String>,
    },

    /// Query a refund (/refund/query)
    QueryRefund {
        /// Merchant refund number
        #[arg(long, conflicts_with = "refund_order_id", required_unless_present = "refund_order_id")]
        refund_no: Option<String>,

        /// Gateway refund id
        #[arg(long)]
        refund_order_id: Option<String>,
    },

    /// Fetch the statement file link for a day (/accountstatement/getOrderFile)
    DownloadBill {
        /// Statement day (YYYY-MM-DD), defaults to yesterday
        day: Option<String>,
    },

    /// Query the merchant balance (/balance/query)
    QueryBalance {
        /// Channel number (allinpay, yunst2isv)
        #[arg(long, default_value = "allinpay")]
        chan_no: String,
    },

    /// Sign a JSON parameter object offline
    Sign {
        /// Inline JSON object, or @path to read it from a file
        params: String,
    },

    /// Verify a signed JSON parameter object offline
    Verify {
        /// Inline JSON object carrying a `sign` field, or @path
        params: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("tonglian_demo_cli=debug,tonglian_lib=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("tonglian_demo_cli=info,tonglian_lib=warn")
            .with_writer(std::io::stderr)
            .init();
    }

    let output = commands::Output {
        json: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::UnifiedOrder {
            order_no,
            amount,
            way,
            notify_url,
            body,
            extra,
        } => {
            commands::order::unified_order(
                &cli.config,
                commands::order::OrderArgs {
                    order_no,
                    amount,
                    way,
                    notify_url,
                    body,
                    extra,
                },
                output,
            )
            .await?;
        }
        Commands::AppletUrl {
            order_no,
            amount,
            notify_url,
            body,
        } => {
            commands::order::applet_url(&cli.config, &order_no, amount, notify_url, body, output)
                .await?;
        }
        Commands::Refund {
            refund_no,
            order_no,
            pay_order_id,
            amount,
            reason,
            notify_url,
        } => {
            commands::refund::refund(
                &cli.config,
                commands::refund::RefundArgs {
                    refund_no,
                    order_no,
                    pay_order_id,
                    amount,
                    reason,
                    notify_url,
                },
                output,
            )
            .await?;
        }
        Commands::QueryOrder {
            order_no,
            pay_order_id,
        } => {
            commands::order::query_order(&cli.config, order_no, pay_order_id, output).await?;
        }
        Commands::QueryRefund {
            refund_no,
            refund_order_id,
        } => {
            commands::refund::query_refund(&cli.config, refund_no, refund_order_id, output)
                .await?;
        }
        Commands::DownloadBill { day } => {
            commands::bill::run(&cli.config, day, output).await?;
        }
        Commands::QueryBalance { chan_no } => {
            commands::balance::run(&cli.config, &chan_no, output).await?;
        }
        Commands::Sign { params } => {
            commands::offline::sign(&cli.config, &params, output)?;
        }
        Commands::Verify { params } => {
            commands::offline::verify(&cli.config, &params, output)?;
        }
    }

    Ok(())
}
