// tldrbot-core/src/tasks/scrape_loop.rs

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};
use crate::Error;
use crate::services::ChannelScraper;

/// Spawns the poll loop for one channel.
///
/// The scraper is asked to run every `tick`; it decides for itself whether its
/// interval has elapsed. Transient errors are logged and retried on a later tick.
/// The task ends when `shutdown` flips to `true` (or its sender is dropped), or
/// with the error when the scraper reports a fatal one.
pub fn spawn_scrape_task(
    mut scraper: ChannelScraper,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<Result<(), Error>> {
    tokio::spawn(async move {
        info!("Starting poll loop for {}", scraper.channel());
        loop {
            if *shutdown.borrow() {
                break;
            }

            match scraper.scrape().await {
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    error!("Stopping poll loop for {}: {}", scraper.channel(), e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Scrape of {} failed, will retry: {}", scraper.channel(), e);
                }
            }

            tokio::select! {
                _ = sleep(tick) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Poll loop for {} stopped", scraper.channel());
        Ok(())
    })
}
