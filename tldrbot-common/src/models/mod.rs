// File: tldrbot-common/src/models/mod.rs
pub mod channel;
pub mod config;
pub mod message;

pub use channel::{ChannelKind, ChannelRef};
pub use config::{
    BotConfig, BurstRateConfig, ChannelConfig, NaturalBreaksConfig, ReactionsConfig,
};
pub use message::{MessageRecord, TriggerEvent, TriggerReason};
