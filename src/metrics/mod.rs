//! Metrics and monitoring for the rankings service
//!
//! Prometheus collectors for service, game lifecycle and rating activity, plus
//! the text encoding served on `/metrics`.

pub mod collector;

pub use collector::{GameMetrics, MetricsCollector, MetricsTimer, RatingMetrics, ServiceMetrics};

use prometheus::TextEncoder;

/// Content type of the Prometheus text exposition format
pub const TEXT_CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Render every registered metric in the Prometheus text format
pub fn encode_text(collector: &MetricsCollector) -> anyhow::Result<String> {
    let metric_families = collector.registry().gather();
    let encoder = TextEncoder::new();

    encoder
        .encode_to_string(&metric_families)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_prefix() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_game_created();

        let text = encode_text(&collector).unwrap();
        assert!(text.contains("rally_rankings_games_created_total 1"));
    }
}
