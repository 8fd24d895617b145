//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Rugplay: market API client (listings, candles, holders)
//! - Notify: ntfy push notifications and a log-only sink
//! - Groq: chat-completion ranking
//! - Chat: `!scan` / `!help` command surface
//! - CLI: Command-line interface definitions

pub mod rugplay;
pub mod notify;
pub mod groq;
pub mod chat;
pub mod cli;

pub use rugplay::{RugplayClient, RugplayConfig};
pub use notify::{LogSink, NtfyConfig, NtfyNotifier};
pub use groq::{GroqConfig, GroqRanker};
pub use chat::Console;
pub use cli::CliApp;
