//! CLI Adapter
//!
//! Command-line interface for rugwatch.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, InteractiveCmd, ScanCmd, WatchCmd};

/// Parse the process arguments
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
