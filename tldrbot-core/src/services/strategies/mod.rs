//! Heuristics that scan the newest batch of a [`ScoringWindow`].
//!
//! Score-based strategies ([`NaturalBreaksStrategy`], [`ReactionCountStrategy`])
//! vote with `ScoringWindow::upvote` and let the window's threshold decide when to
//! notify. [`BurstRateStrategy`] throttles itself and calls `ScoringWindow::trigger`
//! directly.

pub mod burst_rate;
pub mod natural_breaks;
pub mod reaction_count;

use std::sync::Arc;
use crate::Error;
use crate::cache::ScoringWindow;
use crate::models::BotConfig;
use crate::utils::Clock;

pub use burst_rate::BurstRateStrategy;
pub use natural_breaks::NaturalBreaksStrategy;
pub use reaction_count::ReactionCountStrategy;

pub trait Strategy: Send {
    /// Name used in log lines
    fn name(&self) -> &str;

    /// Inspect `window.current_batch()` (plus any lookback the heuristic needs)
    /// and vote or trigger on the messages found there.
    fn scan(&mut self, window: &mut ScoringWindow) -> Result<(), Error>;
}

/// Builds the strategy list for one channel, in the order they will run.
pub fn strategies_from_config(config: &BotConfig, clock: Arc<dyn Clock>) -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();

    if let Some(breaks) = &config.natural_breaks {
        strategies.push(Box::new(NaturalBreaksStrategy::new(breaks.break_length_seconds)));
    }
    if config.reactions.enabled {
        strategies.push(Box::new(ReactionCountStrategy::new()));
    }
    if let Some(burst) = &config.burst_rate {
        strategies.push(Box::new(BurstRateStrategy::from_config(burst, clock)));
    }

    strategies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;

    #[test]
    fn builds_enabled_strategies_in_order() {
        let config = BotConfig::from_json_str(
            r#"{
                "channels": [{ "name": "general", "id": "C0001" }],
                "dry_run": true,
                "natural_breaks": { "break_length_seconds": 120 },
                "burst_rate": {}
            }"#,
        )
        .unwrap();

        let strategies = strategies_from_config(&config, Arc::new(ManualClock::new(0.0)));
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["NaturalBreaksStrategy", "ReactionCountStrategy", "BurstRateStrategy"]);
    }

    #[test]
    fn reactions_can_be_disabled() {
        let config = BotConfig::from_json_str(
            r#"{
                "channels": [{ "name": "general", "id": "C0001" }],
                "dry_run": true,
                "reactions": { "enabled": false }
            }"#,
        )
        .unwrap();

        assert!(strategies_from_config(&config, Arc::new(ManualClock::new(0.0))).is_empty());
    }
}
