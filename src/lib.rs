//! Rally Rankings - head-to-head match tracking with Elo ratings
//!
//! This crate records 1-v-1 games played inside named groups, updates both
//! players' global Elo ratings when a game is finalized, and keeps an
//! append-only ledger explaining every rating change.

pub mod config;
pub mod error;
pub mod game;
pub mod group;
pub mod ledger;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RankingError, Result};
pub use types::*;

// Re-export key components
pub use game::GameLifecycle;
pub use rating::{EloRatingCalculator, RatingCalculator};
pub use service::RankingService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
