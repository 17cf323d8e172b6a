//! Rating system built on the Elo algorithm
//!
//! This module provides rating calculations, player storage interfaces, and
//! integration with the skillratings crate for head-to-head updates.

pub mod calculator;
pub mod elo;
pub mod storage;

// Re-export commonly used types
pub use calculator::{MockRatingCalculator, RatingCalculationResult, RatingCalculator};
pub use elo::EloRatingCalculator;
pub use storage::{InMemoryPlayerStorage, PlayerStorage};
