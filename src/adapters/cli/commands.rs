//! CLI Command Definitions
//!
//! Argument parsing for the rugwatch binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::application::{ScanParams, MAX_NUM_SCANS};

/// rugwatch - New coin screener and alerter for Rugplay
#[derive(Parser, Debug)]
#[command(
    name = "rugwatch",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "New coin screener and alerter for Rugplay",
    long_about = "rugwatch polls the Rugplay market for freshly listed coins, screens them \
                  through age, price, momentum and holder-distribution filters, and pushes \
                  alerts for survivors and for collapsing held positions."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the unattended scanner with held-position checks
    Watch(WatchCmd),

    /// Accept `!scan` / `!help` commands on stdin
    Interactive(InteractiveCmd),

    /// Run a single ranked scan and print the result
    Scan(ScanCmd),
}

/// Start the background scanner
#[derive(Parser, Debug)]
pub struct WatchCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/rugwatch.toml")]
    pub config: PathBuf,
}

/// Start the interactive command console
#[derive(Parser, Debug)]
pub struct InteractiveCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/rugwatch.toml")]
    pub config: PathBuf,
}

/// One-shot ranked scan
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/rugwatch.toml")]
    pub config: PathBuf,

    /// Minimum current price
    #[arg(long, value_name = "PRICE", default_value = "0.0001")]
    pub min_price: f64,

    /// Minimum candle gain as a fraction (0.5 = +50%)
    #[arg(long, value_name = "GAIN", default_value = "0.5")]
    pub min_gain: f64,

    /// Number of newest listings to analyze (1-100)
    #[arg(
        long,
        value_name = "N",
        default_value = "100",
        value_parser = clap::value_parser!(u32).range(1..=MAX_NUM_SCANS as i64)
    )]
    pub num_scans: u32,
}

impl ScanCmd {
    pub fn params(&self) -> ScanParams {
        ScanParams {
            min_price: self.min_price,
            min_gain: self.min_gain,
            num_scans: self.num_scans,
        }
    }
}
