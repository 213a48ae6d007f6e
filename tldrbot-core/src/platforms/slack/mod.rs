// File: src/platforms/slack/mod.rs

pub mod client;
pub mod requests;

use async_trait::async_trait;
use crate::Error;
use crate::models::{ChannelRef, MessageRecord};
use crate::traits::{ChannelHistorySource, Notifier};

pub use client::SlackClient;

#[async_trait]
impl ChannelHistorySource for SlackClient {
    async fn fetch(&self, channel: &ChannelRef, since: Option<f64>) -> Result<Vec<MessageRecord>, Error> {
        self.fetch_history(channel, since).await
    }
}

#[async_trait]
impl Notifier for SlackClient {
    async fn post(&self, destination: &str, text: &str) -> Result<(), Error> {
        self.post_message(destination, text).await
    }
}
