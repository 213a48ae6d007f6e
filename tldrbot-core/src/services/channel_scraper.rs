// File: tldrbot-core/src/services/channel_scraper.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use crate::Error;
use crate::cache::ScoringWindow;
use crate::models::{BotConfig, ChannelRef, MessageRecord};
use crate::services::strategies::Strategy;
use crate::traits::ChannelHistorySource;
use crate::utils::Clock;

/// Poll timing for one scraper.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Minimum seconds between two fetches.
    pub interval_seconds: f64,
    pub fetch_timeout: Duration,
    /// Initial checkpoint; defaults to "now" when the scraper is built.
    pub since: Option<f64>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30.0,
            fetch_timeout: Duration::from_secs(30),
            since: None,
        }
    }
}

impl ScraperConfig {
    /// Uses the configured lookback to start the first fetch in the past.
    pub fn from_bot_config(config: &BotConfig, now: f64) -> Self {
        Self {
            interval_seconds: config.poll_interval_seconds,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_seconds),
            since: Some(now - config.lookback_seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// The interval has not elapsed; nothing was fetched.
    Idle,
    /// A fetch completed. `appended` excludes messages already held.
    Scraped { fetched: usize, appended: usize },
}

/// Fetches one channel's history incrementally and runs the strategies over each new batch.
pub struct ChannelScraper {
    channel: ChannelRef,
    source: Arc<dyn ChannelHistorySource>,
    window: ScoringWindow,
    strategies: Vec<Box<dyn Strategy>>,
    clock: Arc<dyn Clock>,
    interval: f64,
    fetch_timeout: Duration,
    last_timestamp: f64,
}

impl ChannelScraper {
    pub fn new(
        channel: ChannelRef,
        source: Arc<dyn ChannelHistorySource>,
        window: ScoringWindow,
        strategies: Vec<Box<dyn Strategy>>,
        clock: Arc<dyn Clock>,
        config: ScraperConfig,
    ) -> Self {
        let last_timestamp = config.since.unwrap_or_else(|| clock.now());
        Self {
            channel,
            source,
            window,
            strategies,
            clock,
            interval: config.interval_seconds,
            fetch_timeout: config.fetch_timeout,
            last_timestamp,
        }
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    pub fn window(&self) -> &ScoringWindow {
        &self.window
    }

    /// The checkpoint: history after this time has not been fetched yet.
    pub fn last_timestamp(&self) -> f64 {
        self.last_timestamp
    }

    /// Runs one fetch-and-scan cycle if the poll interval has elapsed.
    ///
    /// The checkpoint only moves after a successful fetch, so a failed or timed-out
    /// fetch is retried from the same point on the next call.
    pub async fn scrape(&mut self) -> Result<ScrapeOutcome, Error> {
        let now = self.clock.now();
        if now - self.last_timestamp < self.interval {
            debug!("Skipping {}: interval not elapsed", self.channel);
            return Ok(ScrapeOutcome::Idle);
        }

        info!("Begin scraping {}", self.channel);
        let since = self.last_timestamp;

        let fetched = match timeout(self.fetch_timeout, self.source.fetch(&self.channel, Some(since))).await {
            Ok(Ok(messages)) => messages,
            Ok(Err(e)) => {
                error!(
                    "Failed to fetch history for {} ({}) since {:.6}: {}",
                    self.channel, self.channel.id, since, e
                );
                return Err(e);
            }
            Err(elapsed) => {
                error!(
                    "Timed out after {:?} fetching history for {} ({}) since {:.6}",
                    self.fetch_timeout, self.channel, self.channel.id, since
                );
                return Err(Error::Timeout(elapsed));
            }
        };

        self.last_timestamp = now;

        let fetched_count = fetched.len();
        let batch = self.new_messages_in_order(fetched);
        let appended = batch.len();
        if appended < fetched_count {
            debug!(
                "Dropped {} already-seen message(s) from {}",
                fetched_count - appended,
                self.channel
            );
        }
        self.window.extend(batch);

        for strategy in self.strategies.iter_mut() {
            if let Err(e) = strategy.scan(&mut self.window) {
                warn!("{}: scan of {} failed: {:?}", strategy.name(), self.channel, e);
            }
        }

        info!("Finished scraping {} ({} new message(s))", self.channel, appended);
        debug!("ScoredMessages:\n{}", self.window);

        Ok(ScrapeOutcome::Scraped { fetched: fetched_count, appended })
    }

    /// Reverses a newest-first fetch and drops anything not newer than the window's tail.
    fn new_messages_in_order(&self, newest_first: Vec<MessageRecord>) -> Vec<MessageRecord> {
        let newest_seen = self.window.newest_timestamp();
        newest_first
            .into_iter()
            .rev()
            .filter(|m| newest_seen.is_none_or(|seen| m.timestamp > seen))
            .collect()
    }
}
