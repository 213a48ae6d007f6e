// File: src/platforms/mod.rs

pub mod slack;

pub use slack::SlackClient;
