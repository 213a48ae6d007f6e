// File: tldrbot-core/src/services/notification_dispatch.rs

use tokio::sync::mpsc;
use tracing::debug;
use crate::Error;
use crate::models::{TriggerEvent, TriggerReason};
use crate::utils::time::local_time_of_day;

/// Invoked synchronously by the scoring window for every qualifying message.
///
/// Implementations must not block: anything that talks to the network should
/// hand the work off (see [`SlackNoticeCallback`]).
pub trait NotificationCallback: Send + Sync {
    fn on_trigger(&self, event: &TriggerEvent) -> Result<(), Error>;
}

impl<F> NotificationCallback for F
where
    F: Fn(&TriggerEvent) -> Result<(), Error> + Send + Sync,
{
    fn on_trigger(&self, event: &TriggerEvent) -> Result<(), Error> {
        self(event)
    }
}

/// Where a notice goes and which channel it talks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    pub destination_id: String,
    pub source_id: String,
    pub source_name: String,
}

impl NotificationTarget {
    pub fn new(destination_id: &str, source_id: &str, source_name: &str) -> Self {
        Self {
            destination_id: destination_id.to_string(),
            source_id: source_id.to_string(),
            source_name: source_name.to_string(),
        }
    }
}

/// A formatted notice waiting to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundNotice {
    pub destination: String,
    pub text: String,
}

/// Formats Slack-style notices and queues them for the dispatcher task.
pub struct SlackNoticeCallback {
    target: NotificationTarget,
    outbound: mpsc::UnboundedSender<OutboundNotice>,
}

impl SlackNoticeCallback {
    pub fn new(target: NotificationTarget, outbound: mpsc::UnboundedSender<OutboundNotice>) -> Self {
        Self { target, outbound }
    }

    pub fn target(&self) -> &NotificationTarget {
        &self.target
    }

    /// `None` when the message lacks an author or text.
    pub fn format_notice(&self, event: &TriggerEvent) -> Option<String> {
        let message = &event.message;
        let author = message.author.as_deref()?;
        let text = message.text.as_deref()?;

        let mut notice = format!(
            "<@{}>: In <#{}|{}>, at {}, \"{}\"",
            author,
            self.target.source_id,
            self.target.source_name,
            local_time_of_day(message.timestamp),
            text
        );

        if let TriggerReason::Burst { messages, span_seconds } = event.reason {
            notice.push_str(&format!(" ({} messages in {:.1}s", messages, span_seconds));
            if let Some(rate) = event.rate_per_minute() {
                notice.push_str(&format!(", {:.1}/min", rate));
            }
            notice.push(')');
        }

        Some(notice)
    }
}

impl NotificationCallback for SlackNoticeCallback {
    fn on_trigger(&self, event: &TriggerEvent) -> Result<(), Error> {
        let Some(text) = self.format_notice(event) else {
            debug!(
                "Skipping notice for message at {} in {}: missing author or text",
                event.message.timestamp, self.target.source_id
            );
            return Ok(());
        };

        self.outbound
            .send(OutboundNotice {
                destination: self.target.destination_id.clone(),
                text,
            })
            .map_err(|e| Error::Callback(format!("notice queue closed: {}", e)))
    }
}

/// Accepts every trigger and does nothing with it. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCallback;

impl NotificationCallback for NoopCallback {
    fn on_trigger(&self, event: &TriggerEvent) -> Result<(), Error> {
        debug!("Dry run: would notify about message at {}", event.message.timestamp);
        Ok(())
    }
}
