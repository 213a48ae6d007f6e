// File: tldrbot-common/src/models/message.rs

use serde::{Deserialize, Serialize};

/// A single chat message as returned by a history fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Seconds since the epoch, fractional part included.
    pub timestamp: f64,
    pub author: Option<String>,
    pub text: Option<String>,
    pub reaction_count: Option<u32>,
}

impl MessageRecord {
    pub fn new(timestamp: f64, author: Option<&str>, text: Option<&str>) -> Self {
        Self {
            timestamp,
            author: author.map(str::to_string),
            text: text.map(str::to_string),
            reaction_count: None,
        }
    }

    pub fn with_reactions(mut self, count: u32) -> Self {
        self.reaction_count = Some(count);
        self
    }

    /// Text for log lines; empty when the platform omitted it.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Why a message was handed to the notification callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerReason {
    /// Accumulated upvotes reached the window threshold.
    Threshold { score: u32 },
    /// A run of `messages` arrived within `span_seconds`.
    Burst { messages: usize, span_seconds: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    pub message: MessageRecord,
    pub reason: TriggerReason,
}

impl TriggerEvent {
    pub fn new(message: MessageRecord, reason: TriggerReason) -> Self {
        Self { message, reason }
    }

    /// Messages per minute for burst triggers.
    pub fn rate_per_minute(&self) -> Option<f64> {
        match self.reason {
            TriggerReason::Burst { messages, span_seconds } if span_seconds > 0.0 => {
                Some(messages as f64 * 60.0 / span_seconds)
            }
            _ => None,
        }
    }
}
