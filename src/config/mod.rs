//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, parse_config, split_keys, AlertsSection, Config, ConfigError, LoggingSection,
    MarketSection, ProfilesSection, RankingSection, ScheduleSection, WatchSection,
    ENV_API_KEYS, ENV_GROQ_API_KEY, ENV_NTFY_TOPIC,
};
