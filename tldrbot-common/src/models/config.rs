// File: tldrbot-common/src/models/config.rs

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::models::channel::ChannelRef;

/// Static startup configuration. Every field except `channels` has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub channels: Vec<ChannelConfig>,
    /// Where notices are posted (a channel or DM id).
    #[serde(default)]
    pub notify_destination: Option<String>,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: f64,
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,
    /// How far back the first fetch reaches.
    #[serde(default = "default_lookback_seconds")]
    pub lookback_seconds: f64,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub natural_breaks: Option<NaturalBreaksConfig>,
    #[serde(default)]
    pub reactions: ReactionsConfig,
    #[serde(default)]
    pub burst_rate: Option<BurstRateConfig>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub id: String,
}

impl From<&ChannelConfig> for ChannelRef {
    fn from(c: &ChannelConfig) -> Self {
        ChannelRef::new(&c.id, Some(&c.name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaturalBreaksConfig {
    #[serde(default = "default_break_length_seconds")]
    pub break_length_seconds: f64,
}

impl Default for NaturalBreaksConfig {
    fn default() -> Self {
        Self { break_length_seconds: default_break_length_seconds() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ReactionsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstRateConfig {
    #[serde(default = "default_burst_window_size")]
    pub window_size: usize,
    #[serde(default = "default_rate_threshold_seconds")]
    pub rate_threshold_seconds: f64,
    #[serde(default = "default_backoff_seconds")]
    pub backoff_seconds: f64,
    #[serde(default = "default_recency_cutoff_seconds")]
    pub recency_cutoff_seconds: f64,
}

impl Default for BurstRateConfig {
    fn default() -> Self {
        Self {
            window_size: default_burst_window_size(),
            rate_threshold_seconds: default_rate_threshold_seconds(),
            backoff_seconds: default_backoff_seconds(),
            recency_cutoff_seconds: default_recency_cutoff_seconds(),
        }
    }
}

fn default_poll_interval_seconds() -> f64 {
    30.0
}

fn default_fetch_timeout_seconds() -> u64 {
    30
}

fn default_lookback_seconds() -> f64 {
    10.0 * 60.0 * 60.0
}

fn default_threshold() -> u32 {
    1
}

fn default_max_length() -> usize {
    500
}

fn default_break_length_seconds() -> f64 {
    10.0 * 60.0
}

fn default_true() -> bool {
    true
}

fn default_burst_window_size() -> usize {
    10
}

fn default_rate_threshold_seconds() -> f64 {
    270.0
}

fn default_backoff_seconds() -> f64 {
    30.0 * 60.0
}

fn default_recency_cutoff_seconds() -> f64 {
    5.0 * 60.0
}

impl BotConfig {
    /// Parses and validates.
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let config = Self::parse_json_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let config = Self::read_path(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses without validating, for callers that apply overrides first
    /// and call [`BotConfig::validate`] themselves.
    pub fn parse_json_str(raw: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads a config file without validating it.
    pub fn read_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::parse_json_str(&raw)
    }

    /// Rejects values no poll loop could run with, including channel ids
    /// whose kind cannot be resolved.
    pub fn validate(&self) -> Result<(), Error> {
        if self.channels.is_empty() {
            return Err(Error::Config("no channels configured".into()));
        }
        if self.threshold == 0 {
            return Err(Error::Config("threshold must be at least 1".into()));
        }
        if self.max_length == 0 {
            return Err(Error::Config("max_length must be at least 1".into()));
        }
        if let Some(burst) = &self.burst_rate {
            if burst.window_size < 2 {
                return Err(Error::Config("burst_rate.window_size must be at least 2".into()));
            }
        }
        if !self.dry_run && self.notify_destination.is_none() {
            return Err(Error::Config(
                "notify_destination is required unless dry_run is set".into(),
            ));
        }
        for channel in &self.channels {
            ChannelRef::from(channel).kind()?;
        }
        Ok(())
    }

    pub fn channel_refs(&self) -> Vec<ChannelRef> {
        self.channels.iter().map(ChannelRef::from).collect()
    }
}
