// tldrbot-core/src/tasks/notice_dispatch.rs

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use crate::services::OutboundNotice;
use crate::traits::Notifier;

/// Spawns a background task that posts queued notices until every sender is dropped.
///
/// A failed post is logged and the notice is dropped; the queue keeps draining.
pub fn spawn_notice_dispatcher(
    notifier: Arc<dyn Notifier>,
    mut notices: mpsc::UnboundedReceiver<OutboundNotice>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            match notifier.post(&notice.destination, &notice.text).await {
                Ok(()) => debug!("Posted notice to {}", notice.destination),
                Err(e) => error!(
                    "Failed to post notice to {}: {:?} (text: {})",
                    notice.destination, e, notice.text
                ),
            }
        }
        info!("Notice queue closed; dispatcher exiting");
    })
}
