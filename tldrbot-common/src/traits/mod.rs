pub mod api;

pub use api::{ChannelHistorySource, Notifier};
