// File: tldrbot-common/src/models/channel.rs

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::Error;

/// Which history endpoint a channel id belongs to, decided by its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// `G...` ids
    PrivateGroup,
    /// `C...` ids
    PublicChannel,
}

impl ChannelKind {
    pub fn history_method(&self) -> &'static str {
        match self {
            ChannelKind::PrivateGroup => "groups.history",
            ChannelKind::PublicChannel => "channels.history",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl ChannelRef {
    pub fn new(id: &str, name: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.unwrap_or_default().to_string(),
        }
    }

    pub fn kind(&self) -> Result<ChannelKind, Error> {
        match self.id.chars().next() {
            Some('G') => Ok(ChannelKind::PrivateGroup),
            Some('C') => Ok(ChannelKind::PublicChannel),
            _ => Err(Error::UnknownChannelKind {
                channel_id: self.id.clone(),
                channel_name: self.name.clone(),
            }),
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}", self.name)
        }
    }
}
