//! Health check reporting
//!
//! Liveness is the running flag; the full check also probes every storage
//! component by reading its counts.

use crate::service::app::RankingService;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Value exported through the health status gauge
    pub fn gauge_value(self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Error message if the component could not be read
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub players: usize,
    pub games: usize,
    pub groups: usize,
    pub ledger_entries: usize,
    pub uptime_seconds: u64,
}

impl HealthCheck {
    /// Perform a full health check of the service
    pub async fn check(service: &RankingService) -> Result<Self> {
        let mut checks = Vec::new();

        let running = Self::check_service_running(service).await;
        let mut overall = running.status;
        checks.push(running);

        let storage = Self::check_storage(service);
        if storage.status != HealthStatus::Healthy && overall == HealthStatus::Healthy {
            overall = HealthStatus::Degraded;
        }
        checks.push(storage);

        let stats = Self::gather_service_stats(service);
        service.metrics().update_health_status(overall.gauge_value());

        Ok(HealthCheck {
            status: overall,
            service: service.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check
    pub async fn liveness_check(service: &RankingService) -> HealthStatus {
        if service.is_running().await {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    async fn check_service_running(service: &RankingService) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = if service.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_storage(service: &RankingService) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = match service.counts().and_then(|_| service.ledger_len()) {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Storage health probe failed: {}", e);
                (HealthStatus::Degraded, Some(e.to_string()))
            }
        };

        ComponentCheck {
            name: "storage".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn gather_service_stats(service: &RankingService) -> ServiceStats {
        let uptime_seconds = service.metrics().update_uptime().as_secs();

        match (service.counts(), service.ledger_len()) {
            (Ok((players, games, groups)), Ok(ledger_entries)) => ServiceStats {
                players,
                games,
                groups,
                ledger_entries,
                uptime_seconds,
            },
            _ => {
                debug!("Falling back to empty stats for health check");
                ServiceStats {
                    uptime_seconds,
                    ..ServiceStats::default()
                }
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_stopped_service_is_unhealthy() {
        let service = RankingService::new(AppConfig::default()).unwrap();

        let health = HealthCheck::check(&service).await.unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(
            HealthCheck::liveness_check(&service).await,
            HealthStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_running_service_reports_counts() {
        let service = RankingService::new(AppConfig::default()).unwrap();
        service.set_running(true).await;
        service.register_player("alice").unwrap();
        service.create_group("club").unwrap();

        let health = HealthCheck::check(&service).await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.stats.players, 1);
        assert_eq!(health.stats.groups, 1);
        assert_eq!(health.checks.len(), 2);

        let json = health.to_json().unwrap();
        assert!(json.contains("\"healthy\""));
    }
}
