//! Elo rating system implementation
//!
//! This module provides the production rating calculator using the Elo update
//! from the skillratings crate:
//!
//! ```text
//! expected_a = 1 / (1 + 10^((rating_b - rating_a) / 400))
//! new_rating = rating + k * (actual - expected)
//! ```
//!
//! Unlike textbook Elo, new ratings are clamped to a configurable floor. The
//! update is zero-sum except when the clamp kicks in.

use crate::config::RatingConfig;
use crate::error::RankingError;
use crate::rating::calculator::{RatingCalculationResult, RatingCalculator};
use crate::types::MatchOutcome;
use skillratings::elo::{elo, EloConfig, EloRating};
use skillratings::Outcomes;
use tracing::debug;

/// Elo rating calculator with a rating floor
#[derive(Debug, Clone)]
pub struct EloRatingCalculator {
    config: RatingConfig,
}

impl EloRatingCalculator {
    /// Create a new Elo rating calculator
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn k_factor(&self) -> f64 {
        self.config.k_factor
    }

    pub fn rating_floor(&self) -> f64 {
        self.config.rating_floor
    }

    /// Plain Elo update without the floor
    pub fn unclamped(&self, rating_a: f64, rating_b: f64, outcome: MatchOutcome) -> (f64, f64) {
        let outcome = match outcome {
            MatchOutcome::AWins => Outcomes::WIN,
            MatchOutcome::BWins => Outcomes::LOSS,
        };

        let (new_a, new_b) = elo(
            &EloRating { rating: rating_a },
            &EloRating { rating: rating_b },
            &outcome,
            &EloConfig {
                k: self.config.k_factor,
            },
        );

        (new_a.rating, new_b.rating)
    }
}

impl Default for EloRatingCalculator {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn compute(
        &self,
        rating_a: f64,
        rating_b: f64,
        outcome: MatchOutcome,
    ) -> crate::error::Result<RatingCalculationResult> {
        if !rating_a.is_finite() || !rating_b.is_finite() {
            return Err(RankingError::InvalidOutcome {
                reason: format!("ratings must be finite, got {} and {}", rating_a, rating_b),
            }
            .into());
        }

        let (raw_a, raw_b) = self.unclamped(rating_a, rating_b, outcome);
        let floor = self.config.rating_floor;
        let new_rating_a = raw_a.max(floor);
        let new_rating_b = raw_b.max(floor);
        let clamped = new_rating_a != raw_a || new_rating_b != raw_b;

        if clamped {
            debug!(
                "Clamped Elo update to floor {:.1}: raw ({:.2}, {:.2})",
                floor, raw_a, raw_b
            );
        }

        Ok(RatingCalculationResult {
            new_rating_a,
            new_rating_b,
            expected_a: self.expected_score(rating_a, rating_b),
            clamped,
        })
    }

    fn expected_score(&self, rating_a: f64, rating_b: f64) -> f64 {
        let (expected_a, _) = skillratings::elo::expected_score(
            &EloRating { rating: rating_a },
            &EloRating { rating: rating_b },
        );
        expected_a
    }

    fn initial_rating(&self) -> f64 {
        self.config.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }

    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()> {
        let new_config: RatingConfig =
            serde_json::from_value(config).map_err(|e| RankingError::ConfigurationError {
                message: format!("Invalid Elo configuration: {}", e),
            })?;

        new_config.validate()?;
        self.config = new_config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn calculator() -> EloRatingCalculator {
        EloRatingCalculator::default()
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {} to be within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn test_equal_ratings_win() {
        let result = calculator()
            .compute(1000.0, 1000.0, MatchOutcome::AWins)
            .unwrap();

        assert_close(result.new_rating_a, 1016.0, 1e-9);
        assert_close(result.new_rating_b, 984.0, 1e-9);
        assert_close(result.expected_a, 0.5, 1e-12);
        assert!(!result.clamped);
    }

    #[test]
    fn test_upset_by_lower_rated_player() {
        let result = calculator()
            .compute(1200.0, 800.0, MatchOutcome::BWins)
            .unwrap();

        assert_close(result.expected_a, 0.909, 1e-3);
        // 1200 - 32 * 0.90909 and 800 + 32 * 0.90909
        assert_close(result.new_rating_a, 1170.91, 0.01);
        assert_close(result.new_rating_b, 829.09, 0.01);
    }

    #[test]
    fn test_expected_score_is_symmetric() {
        let calc = calculator();
        let forward = calc.expected_score(1400.0, 1000.0);
        let backward = calc.expected_score(1000.0, 1400.0);
        assert_close(forward + backward, 1.0, 1e-12);
        assert!(forward > 0.9);
    }

    #[test]
    fn test_floor_clamps_loser() {
        let calc = EloRatingCalculator::new(RatingConfig {
            rating_floor: 990.0,
            ..RatingConfig::default()
        })
        .unwrap();

        let result = calc.compute(1000.0, 1000.0, MatchOutcome::AWins).unwrap();
        assert_close(result.new_rating_a, 1016.0, 1e-9);
        assert_eq!(result.new_rating_b, 990.0);
        assert!(result.clamped);
    }

    #[test]
    fn test_rating_never_goes_negative() {
        let result = calculator().compute(5.0, 5.0, MatchOutcome::AWins).unwrap();
        assert_eq!(result.new_rating_b, 0.0);
        assert!(result.clamped);
    }

    #[test]
    fn test_non_finite_rating_rejected() {
        let err = calculator()
            .compute(f64::NAN, 1000.0, MatchOutcome::AWins)
            .unwrap_err();
        assert_eq!(RankingError::classify(&err).unwrap().kind(), "invalid_outcome");
    }

    #[test]
    fn test_custom_k_factor() {
        let calc = EloRatingCalculator::new(RatingConfig {
            k_factor: 16.0,
            ..RatingConfig::default()
        })
        .unwrap();

        let result = calc.compute(1000.0, 1000.0, MatchOutcome::BWins).unwrap();
        assert_close(result.new_rating_a, 992.0, 1e-9);
        assert_close(result.new_rating_b, 1008.0, 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RatingConfig {
            k_factor: -1.0,
            ..RatingConfig::default()
        };
        assert!(EloRatingCalculator::new(config).is_err());
    }

    #[test]
    fn test_update_config_roundtrip() {
        let mut calc = calculator();
        let mut config = calc.config();
        config["k_factor"] = serde_json::json!(40.0);

        calc.update_config(config).unwrap();
        assert_eq!(calc.k_factor(), 40.0);

        let bad = serde_json::json!({ "k_factor": 0.0 });
        assert!(calc.update_config(bad).is_err());
        assert_eq!(calc.k_factor(), 40.0);
    }

    proptest! {
        #[test]
        fn prop_equal_ratings_move_symmetrically(r in 100.0f64..3000.0) {
            let result = calculator().compute(r, r, MatchOutcome::AWins).unwrap();
            let gain = result.new_rating_a - r;
            let loss = r - result.new_rating_b;
            prop_assert!(gain > 0.0);
            prop_assert!((gain - loss).abs() < 1e-9);
        }

        #[test]
        fn prop_unclamped_update_is_zero_sum(
            a in -500.0f64..3500.0,
            b in -500.0f64..3500.0,
            a_wins in any::<bool>(),
        ) {
            let outcome = if a_wins { MatchOutcome::AWins } else { MatchOutcome::BWins };
            let (new_a, new_b) = calculator().unclamped(a, b, outcome);
            prop_assert!(((new_a - a) + (new_b - b)).abs() < 1e-9);
        }

        #[test]
        fn prop_upset_swings_more_than_expected_win(
            low in 100.0f64..2000.0,
            gap in 1.0f64..1000.0,
        ) {
            let high = low + gap;
            let calc = calculator();
            let favourite_wins = calc.compute(high, low, MatchOutcome::AWins).unwrap();
            let upset = calc.compute(high, low, MatchOutcome::BWins).unwrap();

            let expected_swing = favourite_wins.new_rating_a - high;
            let upset_swing = upset.new_rating_b - low;
            prop_assert!(upset_swing > expected_swing);
        }

        #[test]
        fn prop_winner_gains_and_loser_never_below_floor(
            a in 0.0f64..3000.0,
            b in 0.0f64..3000.0,
            a_wins in any::<bool>(),
        ) {
            let outcome = if a_wins { MatchOutcome::AWins } else { MatchOutcome::BWins };
            let result = calculator().compute(a, b, outcome).unwrap();

            prop_assert!(result.new_rating_a >= 0.0);
            prop_assert!(result.new_rating_b >= 0.0);
            if a_wins {
                prop_assert!(result.new_rating_a > a);
                prop_assert!(result.new_rating_b <= b);
            } else {
                prop_assert!(result.new_rating_b > b);
                prop_assert!(result.new_rating_a <= a);
            }
        }
    }
}
