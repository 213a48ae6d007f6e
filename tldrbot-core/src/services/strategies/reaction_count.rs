use tracing::info;
use crate::Error;
use crate::cache::ScoringWindow;
use crate::services::strategies::Strategy;

/// One upvote for every two reactions, rounded down.
#[derive(Debug, Default)]
pub struct ReactionCountStrategy;

impl ReactionCountStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for ReactionCountStrategy {
    fn name(&self) -> &str {
        "ReactionCountStrategy"
    }

    fn scan(&mut self, window: &mut ScoringWindow) -> Result<(), Error> {
        info!("{}: Begin scanning", self.name());

        let start = window.batch_start();
        let votes: Vec<(usize, u32)> = window
            .current_batch()
            .iter()
            .enumerate()
            .filter_map(|(offset, scored)| {
                scored
                    .message()
                    .reaction_count
                    .map(|count| (start + offset, count / 2))
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        for (index, n) in votes {
            for _ in 0..n {
                window.upvote(index)?;
            }
        }

        info!("{}: Finished scanning", self.name());
        Ok(())
    }
}
