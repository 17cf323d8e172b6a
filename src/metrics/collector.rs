//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the rankings service using
//! Prometheus metrics.

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the rankings service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Game lifecycle metrics
    game_metrics: GameMetrics,

    /// Rating-related metrics
    rating_metrics: RatingMetrics,

    started_at: Instant,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Total players registered
    pub players_registered_total: IntCounter,

    /// Total groups created
    pub groups_created_total: IntCounter,
}

/// Game lifecycle metrics
#[derive(Clone)]
pub struct GameMetrics {
    /// Total games created
    pub games_created_total: IntCounter,

    /// Total games finalized
    pub games_finalized_total: IntCounter,

    /// Finalize calls rejected, by error kind
    pub finalize_rejections_total: IntCounterVec,

    /// Time spent in a successful finalization, locks included
    pub finalize_duration: Histogram,
}

/// Rating-related metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Rating calculation time
    pub rating_calculation_duration: Histogram,

    /// Distribution of ratings written by finalizations
    pub rating_distribution: Histogram,

    /// Absolute rating change per player per game
    pub rating_delta: Histogram,

    /// Rating updates that hit the floor
    pub floor_clamps_total: IntCounter,

    /// Ledger entries appended
    pub ledger_entries_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let game_metrics = GameMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            game_metrics,
            rating_metrics,
            started_at: Instant::now(),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get game metrics
    pub fn game(&self) -> &GameMetrics {
        &self.game_metrics
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Record a newly registered player
    pub fn record_player_registered(&self, initial_rating: f64) {
        self.service_metrics.players_registered_total.inc();
        self.rating_metrics.rating_distribution.observe(initial_rating);
    }

    /// Record a newly created group
    pub fn record_group_created(&self) {
        self.service_metrics.groups_created_total.inc();
    }

    /// Record a newly created game
    pub fn record_game_created(&self) {
        self.game_metrics.games_created_total.inc();
    }

    /// Record a committed finalization and the ratings it produced
    pub fn record_game_finalized(&self, changes: &[(f64, f64)], duration: Duration) {
        self.game_metrics.games_finalized_total.inc();
        self.game_metrics
            .finalize_duration
            .observe(duration.as_secs_f64());

        for (before, after) in changes {
            self.rating_metrics.rating_distribution.observe(*after);
            self.rating_metrics
                .rating_delta
                .observe((after - before).abs());
        }
        self.rating_metrics
            .ledger_entries_total
            .inc_by(changes.len() as u64);
    }

    /// Record a rejected finalization
    pub fn record_finalize_rejected(&self, reason: &str) {
        self.game_metrics
            .finalize_rejections_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record rating calculation duration
    pub fn record_rating_calculation(&self, duration: Duration, clamped: bool) {
        self.rating_metrics
            .rating_calculation_duration
            .observe(duration.as_secs_f64());
        if clamped {
            self.rating_metrics.floor_clamps_total.inc();
        }
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Refresh the uptime gauge
    pub fn update_uptime(&self) -> Duration {
        let uptime = self.started_at.elapsed();
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
        uptime
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("rally_rankings_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "rally_rankings_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let players_registered_total = IntCounter::new(
            "rally_rankings_players_registered_total",
            "Total players registered",
        )?;
        registry.register(Box::new(players_registered_total.clone()))?;

        let groups_created_total =
            IntCounter::new("rally_rankings_groups_created_total", "Total groups created")?;
        registry.register(Box::new(groups_created_total.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            players_registered_total,
            groups_created_total,
        })
    }
}

impl GameMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let games_created_total =
            IntCounter::new("rally_rankings_games_created_total", "Total games created")?;
        registry.register(Box::new(games_created_total.clone()))?;

        let games_finalized_total = IntCounter::new(
            "rally_rankings_games_finalized_total",
            "Total games finalized",
        )?;
        registry.register(Box::new(games_finalized_total.clone()))?;

        let finalize_rejections_total = IntCounterVec::new(
            Opts::new(
                "rally_rankings_finalize_rejections_total",
                "Finalize calls rejected",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(finalize_rejections_total.clone()))?;

        let finalize_duration = Histogram::with_opts(
            HistogramOpts::new(
                "rally_rankings_finalize_duration_seconds",
                "Game finalization time",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(finalize_duration.clone()))?;

        Ok(Self {
            games_created_total,
            games_finalized_total,
            finalize_rejections_total,
            finalize_duration,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rating_calculation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "rally_rankings_rating_calculation_duration_seconds",
                "Rating calculation time",
            )
            .buckets(vec![0.000001, 0.00001, 0.0001, 0.001, 0.01]),
        )?;
        registry.register(Box::new(rating_calculation_duration.clone()))?;

        let rating_distribution = Histogram::with_opts(
            HistogramOpts::new(
                "rally_rankings_rating_distribution",
                "Player rating distribution",
            )
            .buckets(vec![
                600.0, 800.0, 900.0, 1000.0, 1100.0, 1200.0, 1400.0, 1600.0,
            ]),
        )?;
        registry.register(Box::new(rating_distribution.clone()))?;

        let rating_delta = Histogram::with_opts(
            HistogramOpts::new(
                "rally_rankings_rating_delta",
                "Absolute rating change per player per game",
            )
            .buckets(vec![1.0, 4.0, 8.0, 16.0, 24.0, 32.0]),
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        let floor_clamps_total = IntCounter::new(
            "rally_rankings_floor_clamps_total",
            "Rating updates clamped to the floor",
        )?;
        registry.register(Box::new(floor_clamps_total.clone()))?;

        let ledger_entries_total = IntCounter::new(
            "rally_rankings_ledger_entries_total",
            "Rating change entries appended",
        )?;
        registry.register(Box::new(ledger_entries_total.clone()))?;

        Ok(Self {
            rating_calculation_duration,
            rating_distribution,
            rating_delta,
            floor_clamps_total,
            ledger_entries_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
