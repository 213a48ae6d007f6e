use async_trait::async_trait;
use crate::error::Error;
use crate::models::{ChannelRef, MessageRecord};

/// Reads message history for a channel.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait ChannelHistorySource: Send + Sync {
    /// Returns messages newer than `since`, newest first.
    ///
    /// Fails with `Error::UnknownChannelKind` when the channel id prefix is not
    /// recognised and with `Error::Api` on transport or platform failure.
    async fn fetch(&self, channel: &ChannelRef, since: Option<f64>) -> Result<Vec<MessageRecord>, Error>;
}

/// Delivers a formatted notice to a destination.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, destination: &str, text: &str) -> Result<(), Error>;
}
