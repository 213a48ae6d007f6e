use tracing::{debug, info};
use crate::Error;
use crate::cache::ScoringWindow;
use crate::services::strategies::Strategy;

/// Upvotes the first message after a pause longer than `break_length` seconds.
pub struct NaturalBreaksStrategy {
    break_length: f64,
}

impl NaturalBreaksStrategy {
    pub fn new(break_length: f64) -> Self {
        Self { break_length }
    }
}

impl Default for NaturalBreaksStrategy {
    fn default() -> Self {
        Self::new(10.0 * 60.0)
    }
}

impl Strategy for NaturalBreaksStrategy {
    fn name(&self) -> &str {
        "NaturalBreaksStrategy"
    }

    fn scan(&mut self, window: &mut ScoringWindow) -> Result<(), Error> {
        info!("{}: Begin scanning", self.name());

        let batch = window.current_batch();
        let Some(first) = batch.first() else {
            debug!("{}: Empty batch", self.name());
            return Ok(());
        };

        // With no history the first message is compared with itself.
        let mut last_ts = window
            .previous_message()
            .map(|m| m.message().timestamp)
            .unwrap_or(first.message().timestamp);

        let mut breaks = Vec::new();
        for (offset, scored) in batch.iter().enumerate() {
            let ts = scored.message().timestamp;
            if ts - last_ts > self.break_length {
                info!(
                    "{}: Found natural break: {}",
                    self.name(),
                    scored.message().text_or_empty()
                );
                breaks.push(window.batch_start() + offset);
            }
            last_ts = ts;
        }

        for index in breaks {
            window.upvote(index)?;
        }

        info!("{}: Finished scanning", self.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRecord;

    fn window_with(timestamps: &[f64]) -> ScoringWindow {
        let mut window = ScoringWindow::new(10, 100);
        window.extend(timestamps.iter().map(|ts| MessageRecord::new(*ts, Some("U1"), Some("hi"))));
        window
    }

    fn scores(window: &ScoringWindow) -> Vec<u32> {
        window.messages().iter().map(|m| m.score()).collect()
    }

    #[test]
    fn only_long_gaps_are_upvoted() {
        let mut window = window_with(&[0.0, 5.0, 400.0]);
        NaturalBreaksStrategy::new(100.0).scan(&mut window).unwrap();
        assert_eq!(scores(&window), vec![0, 0, 1]);
    }

    #[test]
    fn gap_equal_to_break_length_is_not_a_break() {
        let mut window = window_with(&[0.0, 100.0, 200.5]);
        NaturalBreaksStrategy::new(100.0).scan(&mut window).unwrap();
        assert_eq!(scores(&window), vec![0, 0, 1]);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut window = ScoringWindow::new(1, 10);
        assert!(NaturalBreaksStrategy::default().scan(&mut window).is_ok());

        window.extend(vec![MessageRecord::new(1.0, None, None)]);
        window.extend(Vec::new());
        assert!(NaturalBreaksStrategy::default().scan(&mut window).is_ok());
        assert_eq!(scores(&window), vec![0]);
    }

    #[test]
    fn gap_is_measured_from_previous_batch() {
        let mut strategy = NaturalBreaksStrategy::new(100.0);
        let mut window = window_with(&[0.0, 10.0]);
        strategy.scan(&mut window).unwrap();

        window.extend(vec![
            MessageRecord::new(500.0, Some("U2"), Some("back again")),
            MessageRecord::new(510.0, Some("U2"), Some("anyone?")),
        ]);
        strategy.scan(&mut window).unwrap();

        assert_eq!(scores(&window), vec![0, 0, 1, 0]);
    }
}
