//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.
//! Secrets may come from the environment instead of the file.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::groq::{GroqConfig, DEFAULT_GROQ_API_URL, DEFAULT_GROQ_MODEL};
use crate::adapters::notify::{NtfyConfig, DEFAULT_NTFY_BASE_URL};
use crate::adapters::rugplay::RugplayConfig;
use crate::application::{ActiveWindow, ScheduleSettings};
use crate::domain::KeyRotator;
use crate::strategy::FilterProfile;

/// Comma-separated Rugplay API keys, appended to `market.api_keys`
pub const ENV_API_KEYS: &str = "RUGPLAY_API_KEYS";
/// ntfy topic, overrides `alerts.ntfy_topic`
pub const ENV_NTFY_TOPIC: &str = "NTFY_TOPIC";
/// Groq API key, overrides `ranking.api_key`
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub market: MarketSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub alerts: AlertsSection,
    #[serde(default)]
    pub watch: WatchSection,
    #[serde(default)]
    pub ranking: RankingSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub profiles: ProfilesSection,
}

/// Market API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct MarketSection {
    #[serde(default = "default_market_url")]
    pub base_url: String,
    /// Bearer keys used in rotation
    #[serde(default)]
    pub api_keys: Vec<String>,
    /// Listings per market page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Pages read per scheduled cycle
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Pause after every page read, in seconds
    #[serde(default = "default_page_delay")]
    pub page_delay_secs: u64,
    #[serde(default = "default_holder_limit")]
    pub holder_limit: u32,
    /// Candle timeframe for the momentum stage
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            base_url: default_market_url(),
            api_keys: Vec::new(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            page_delay_secs: default_page_delay(),
            holder_limit: default_holder_limit(),
            timeframe: default_timeframe(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Active-window configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSection {
    /// Local hour polling starts (0-23)
    #[serde(default = "default_start_hour")]
    pub active_start_hour: u32,
    /// Local hour polling stops (0-23). Equal to start means all day.
    #[serde(default = "default_end_hour")]
    pub active_end_hour: u32,
    /// Sleep outside the window, in seconds
    #[serde(default = "default_idle_sleep")]
    pub idle_sleep_secs: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            active_start_hour: default_start_hour(),
            active_end_hour: default_end_hour(),
            idle_sleep_secs: default_idle_sleep(),
        }
    }
}

/// Push notification section (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsSection {
    #[serde(default = "default_ntfy_url")]
    pub ntfy_base_url: String,
    #[serde(default)]
    pub ntfy_topic: String,
}

impl Default for AlertsSection {
    fn default() -> Self {
        Self {
            ntfy_base_url: default_ntfy_url(),
            ntfy_topic: String::new(),
        }
    }
}

/// Held positions watched for holder-gap collapse
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// Ranking service section (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct RankingSection {
    #[serde(default = "default_ranking_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            api_url: default_ranking_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Filter profiles. A profile given in the file replaces the built-in one.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfilesSection {
    #[serde(default = "FilterProfile::interactive")]
    pub interactive: FilterProfile,
    #[serde(default = "FilterProfile::unattended")]
    pub unattended: FilterProfile,
}

impl Default for ProfilesSection {
    fn default() -> Self {
        Self {
            interactive: FilterProfile::interactive(),
            unattended: FilterProfile::unattended(),
        }
    }
}

fn default_market_url() -> String { RugplayConfig::default().api_base_url }
fn default_page_size() -> u32 { 100 }
fn default_max_pages() -> u32 { 3 }
fn default_page_delay() -> u64 { 24 }
fn default_holder_limit() -> u32 { 50 }
fn default_timeframe() -> String { "1h".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_start_hour() -> u32 { 8 }
fn default_end_hour() -> u32 { 20 }
fn default_idle_sleep() -> u64 { 3600 }
fn default_ntfy_url() -> String { DEFAULT_NTFY_BASE_URL.to_string() }
fn default_ranking_url() -> String { DEFAULT_GROQ_API_URL.to_string() }
fn default_model() -> String { DEFAULT_GROQ_MODEL.to_string() }
fn default_temperature() -> f64 { 0.3 }
fn default_log_level() -> String { "info".to_string() }

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file, applying environment overrides.
/// A leading `~` in the path is expanded.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let raw = path.as_ref().to_string_lossy();
    let expanded = shellexpand::tilde(&raw).to_string();
    let content = std::fs::read_to_string(expanded)?;
    parse_config(&content, |name| std::env::var(name).ok())
}

/// Parse, apply overrides from `env`, normalise and validate
pub fn parse_config<F>(content: &str, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(content)?;
    config.apply_env(env);
    config.normalize();
    config.validate()?;
    Ok(config)
}

/// Split a comma-separated key list, dropping blanks
pub fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = env(ENV_API_KEYS) {
            for key in split_keys(&raw) {
                if !self.market.api_keys.contains(&key) {
                    self.market.api_keys.push(key);
                }
            }
        }
        if let Some(topic) = env(ENV_NTFY_TOPIC).filter(|t| !t.trim().is_empty()) {
            self.alerts.ntfy_topic = topic;
        }
        if let Some(key) = env(ENV_GROQ_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.ranking.api_key = key;
        }
    }

    fn normalize(&mut self) {
        let mut keys: Vec<String> = Vec::with_capacity(self.market.api_keys.len());
        for key in self.market.api_keys.iter().map(|k| k.trim()) {
            if !key.is_empty() && !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        self.market.api_keys = keys;

        self.watch.symbols = self
            .watch
            .symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        self.alerts.ntfy_topic = self.alerts.ntfy_topic.trim().to_string();
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market.api_keys.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "at least one API key is required (market.api_keys or {})",
                ENV_API_KEYS
            )));
        }

        if self.market.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "market.base_url cannot be empty".to_string(),
            ));
        }

        if self.market.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "page_size must be > 0".to_string(),
            ));
        }

        if self.market.max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "max_pages must be > 0".to_string(),
            ));
        }

        if self.market.holder_limit == 0 {
            return Err(ConfigError::ValidationError(
                "holder_limit must be > 0".to_string(),
            ));
        }

        if self.market.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        // Schedule
        for (name, hour) in [
            ("active_start_hour", self.schedule.active_start_hour),
            ("active_end_hour", self.schedule.active_end_hour),
        ] {
            if hour >= 24 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be 0-23, got {}",
                    name, hour
                )));
            }
        }

        if !(0.0..=2.0).contains(&self.ranking.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "ranking.temperature must be 0-2, got {}",
                self.ranking.temperature
            )));
        }

        // Profiles
        self.profiles
            .interactive
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("profiles.interactive: {}", e)))?;
        self.profiles
            .unattended
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("profiles.unattended: {}", e)))?;

        Ok(())
    }

    pub fn key_rotator(&self) -> Result<KeyRotator, ConfigError> {
        KeyRotator::new(&self.market.api_keys)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    pub fn rugplay_config(&self) -> RugplayConfig {
        RugplayConfig {
            api_base_url: self.market.base_url.clone(),
            timeout: Duration::from_secs(self.market.timeout_secs),
        }
    }

    /// ntfy settings, or `None` when no topic is configured
    pub fn ntfy_config(&self) -> Option<NtfyConfig> {
        if self.alerts.ntfy_topic.is_empty() {
            return None;
        }
        Some(NtfyConfig {
            base_url: self.alerts.ntfy_base_url.clone(),
            ..NtfyConfig::new(self.alerts.ntfy_topic.clone())
        })
    }

    pub fn groq_config(&self) -> GroqConfig {
        GroqConfig {
            api_url: self.ranking.api_url.clone(),
            api_key: self.ranking.api_key.clone(),
            model: self.ranking.model.clone(),
            temperature: self.ranking.temperature,
            ..GroqConfig::default()
        }
    }
}

impl From<&Config> for ScheduleSettings {
    fn from(config: &Config) -> Self {
        ScheduleSettings {
            page_size: config.market.page_size,
            max_pages: config.market.max_pages,
            page_delay: Duration::from_secs(config.market.page_delay_secs),
            idle_sleep: Duration::from_secs(config.schedule.idle_sleep_secs),
            window: ActiveWindow::new(
                config.schedule.active_start_hour,
                config.schedule.active_end_hour,
            ),
        }
    }
}
