// ================================================================
// File: tldrbot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The channel id prefix does not map to a known history endpoint.
    #[error("Do not recognize channel type for {channel_id} ({channel_name})")]
    UnknownChannelKind {
        channel_id: String,
        channel_name: String,
    },

    #[error("API error calling {method} on {channel}: {message}")]
    Api {
        method: String,
        channel: String,
        message: String,
    },

    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Strategy error: {0}")]
    Strategy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Convenience constructor for a failed platform call.
    pub fn api(method: &str, channel: &str, message: impl Into<String>) -> Self {
        Error::Api {
            method: method.to_string(),
            channel: channel.to_string(),
            message: message.into(),
        }
    }

    /// Configuration problems that retrying on the next interval can never fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::UnknownChannelKind { .. } | Error::Config(_))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_channel_kind_is_fatal() {
        let err = Error::UnknownChannelKind {
            channel_id: "D123".into(),
            channel_name: "dm".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Do not recognize channel type for D123 (dm)");
    }

    #[test]
    fn api_errors_are_transient() {
        let err = Error::api("channels.history", "C123", "ratelimited");
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("channels.history"));
        assert!(err.to_string().contains("ratelimited"));
    }
}
