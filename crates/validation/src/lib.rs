//! Prediction tracking and validation against realized market moves.

pub mod metrics;
pub mod tracker;
pub mod types;

pub use tracker::ValidationTracker;
pub use types::*;
