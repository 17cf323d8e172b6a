//! Service layer for the rankings service
//!
//! This module contains the application state that wires storage, the game
//! lifecycle and metrics together, plus its HTTP front end and health checks.

pub mod app;
pub mod health;
pub mod http;

pub use app::{GameView, GroupView, LeaderboardEntry, PlayerProfile, RankingService, ServiceError};
pub use health::{HealthCheck, HealthStatus};
pub use http::{router, HttpServer, HttpServerConfig};
