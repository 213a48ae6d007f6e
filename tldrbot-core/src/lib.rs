// src/lib.rs

pub mod cache;
pub mod platforms;
pub mod services;
pub mod tasks;
pub mod utils;

pub use tldrbot_common::error::Error;
pub use tldrbot_common::models;
pub use tldrbot_common::traits;
