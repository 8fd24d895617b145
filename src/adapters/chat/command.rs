//! Chat command grammar
//!
//! `!help` and `!scan [minprice=<f64>] [mingain=<f64>] [numscans=<u32>]`.
//! Matching is case-insensitive. Tokens without `=` are ignored.

use thiserror::Error;

use crate::application::{ScanParams, MAX_NUM_SCANS};

pub const HELP_TEXT: &str = "Bot Commands:\n\
`!scan` - Scan Rugplay for strong coins and rank them using AI\n\
`!help` - Show this help message\n\n\
Optional parameters:\n\
- minprice: minimum price (e.g. 0.0002)\n\
- mingain: minimum 1-hour gain as a fraction (e.g. 0.5 for 50%)\n\
- numscans: how many coins to analyze (default 100, max 100)\n\
Example: !scan minprice=0.001 mingain=0.3 numscans=75";

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Help,
    Scan(ScanParams),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Invalid value for {key}: {value}. Please provide a valid number.")]
    InvalidValue { key: String, value: String },

    #[error("Unknown parameter: {0}. Supported parameters are minprice, mingain, numscans.")]
    UnknownParameter(String),

    #[error("numscans must be between 1 and {MAX_NUM_SCANS}, got {0}")]
    NumScansOutOfRange(u32),
}

/// Parse one line. `Ok(None)` means the line is not a command.
pub fn parse_command(line: &str) -> Result<Option<ChatCommand>, CommandError> {
    let mut tokens = line.split_whitespace();
    let head = match tokens.next() {
        Some(head) => head.to_lowercase(),
        None => return Ok(None),
    };

    match head.as_str() {
        "!help" => Ok(Some(ChatCommand::Help)),
        "!scan" => parse_scan(tokens).map(|p| Some(ChatCommand::Scan(p))),
        _ => Ok(None),
    }
}

fn parse_scan<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<ScanParams, CommandError> {
    let mut params = ScanParams::default();

    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let key = key.to_lowercase();

        match key.as_str() {
            "minprice" => params.min_price = parse_number(&key, value)?,
            "mingain" => params.min_gain = parse_number(&key, value)?,
            "numscans" => {
                let n: u32 = parse_number(&key, value)?;
                if !(1..=MAX_NUM_SCANS).contains(&n) {
                    return Err(CommandError::NumScansOutOfRange(n));
                }
                params.num_scans = n;
            }
            _ => return Err(CommandError::UnknownParameter(key)),
        }
    }

    Ok(params)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
