// File: src/cache/mod.rs

pub mod scoring_window;

pub use scoring_window::{ScoredMessage, ScoringWindow};
