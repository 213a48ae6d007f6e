pub mod channel_scraper;
pub mod notification_dispatch;
pub mod strategies;

pub use channel_scraper::{ChannelScraper, ScrapeOutcome, ScraperConfig};
pub use notification_dispatch::{
    NoopCallback, NotificationCallback, NotificationTarget, OutboundNotice, SlackNoticeCallback,
};
