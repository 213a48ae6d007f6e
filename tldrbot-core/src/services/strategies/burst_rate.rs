use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};
use crate::Error;
use crate::cache::ScoringWindow;
use crate::models::{BurstRateConfig, TriggerReason};
use crate::services::strategies::Strategy;
use crate::utils::Clock;

/// Notifies directly when `window_size` messages land within `rate_threshold` seconds.
///
/// Keeps the timestamps of the last `window_size` messages across scans. Once a
/// burst fires, further bursts are ignored until `backoff` seconds have passed.
pub struct BurstRateStrategy {
    window_size: usize,
    rate_threshold: f64,
    backoff: f64,
    recency_cutoff: f64,
    recent: VecDeque<f64>,
    backoff_deadline: f64,
    clock: Arc<dyn Clock>,
}

impl BurstRateStrategy {
    pub fn new(window_size: usize, rate_threshold: f64, backoff: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            window_size: window_size.max(1),
            rate_threshold,
            backoff,
            recency_cutoff: 5.0 * 60.0,
            recent: VecDeque::with_capacity(window_size),
            backoff_deadline: f64::NEG_INFINITY,
            clock,
        }
    }

    pub fn from_config(config: &BurstRateConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.window_size,
            config.rate_threshold_seconds,
            config.backoff_seconds,
            clock,
        )
        .with_recency_cutoff(config.recency_cutoff_seconds)
    }

    pub fn with_recency_cutoff(mut self, seconds: f64) -> Self {
        self.recency_cutoff = seconds;
        self
    }

    pub fn backoff_deadline(&self) -> f64 {
        self.backoff_deadline
    }
}

impl Strategy for BurstRateStrategy {
    fn name(&self) -> &str {
        "BurstRateStrategy"
    }

    fn scan(&mut self, window: &mut ScoringWindow) -> Result<(), Error> {
        info!("{}: Begin scanning", self.name());

        let now = self.clock.now();
        let cutoff = now - self.recency_cutoff;
        let start = window.batch_start();
        let mut bursts = Vec::new();

        for (offset, scored) in window.current_batch().iter().enumerate() {
            self.recent.push_back(scored.message().timestamp);
            while self.recent.front().is_some_and(|ts| *ts < cutoff) {
                self.recent.pop_front();
            }

            if self.recent.len() < self.window_size {
                continue;
            }

            if let (Some(oldest), Some(newest)) = (self.recent.front(), self.recent.back()) {
                let span = newest - oldest;
                if span < self.rate_threshold && now > self.backoff_deadline {
                    info!(
                        "{}: {} messages in {:.1}s, ending with: {}",
                        self.name(),
                        self.recent.len(),
                        span,
                        scored.message().text_or_empty()
                    );
                    bursts.push((start + offset, self.recent.len(), span));
                    self.backoff_deadline = now + self.backoff;
                } else if span < self.rate_threshold {
                    debug!(
                        "{}: Burst suppressed until {:.0}",
                        self.name(),
                        self.backoff_deadline
                    );
                }
            }
            self.recent.pop_front();
        }

        for (index, messages, span_seconds) in bursts {
            window.trigger(index, TriggerReason::Burst { messages, span_seconds })?;
        }

        info!("{}: Finished scanning", self.name());
        Ok(())
    }
}
