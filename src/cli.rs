use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use woox::{QuickRange, WOOX_MAINNET_URL};

/// woo-pnl: realized PnL tracker for WOO X order history.
#[derive(Parser, Debug)]
#[command(name = "woo-pnl", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// REST API base URL
    #[arg(long, default_value = WOOX_MAINNET_URL, global = true)]
    pub base_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one fetch cycle, print the result and exit
    Fetch(QueryArgs),

    /// Keep refreshing; each line on stdin triggers an immediate cycle
    Watch(WatchArgs),
}

/// Window, pair and output options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// First day of the window (YYYY-MM-DD, from 00:00:00 UTC)
    #[arg(long, requires = "end", conflicts_with = "range")]
    pub start: Option<NaiveDate>,

    /// Last day of the window (YYYY-MM-DD, through 23:59:59 UTC)
    #[arg(long, requires = "start", conflicts_with = "range")]
    pub end: Option<NaiveDate>,

    /// Quick range (today, yesterday, current-week, last-7-days,
    /// current-month, last-30-days)
    #[arg(long)]
    pub range: Option<QuickRange>,

    /// Only aggregate orders for this pair (e.g. PERP_BTC_USDT); ALL for every pair
    #[arg(long, default_value = "ALL")]
    pub pair: String,

    /// Newline-separated list of known pairs; `--pair` must be one of them
    #[arg(long)]
    pub symbols: Option<PathBuf>,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `watch` subcommand.
#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Seconds between automatic refreshes (clamped to 5..=300)
    #[arg(long, default_value = "60")]
    pub interval: u64,

    /// Only refresh on manual trigger
    #[arg(long)]
    pub no_auto_refresh: bool,
}
