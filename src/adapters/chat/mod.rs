//! Chat Adapter
//!
//! Text command surface for on-demand scans.

mod command;
mod console;

pub use command::{parse_command, ChatCommand, CommandError, HELP_TEXT};
pub use console::{dispatch, Console, Dispatch};
