//! Rating calculator trait and implementations
//!
//! This module defines the interface for head-to-head rating calculations and
//! a recording mock used by lifecycle tests.

use crate::error::RankingError;
use crate::types::{MatchOutcome, PlayerId};
use serde::{Deserialize, Serialize};

/// Result of a rating calculation for one game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingCalculationResult {
    pub new_rating_a: f64,
    pub new_rating_b: f64,
    /// Probability that A wins, as predicted before the game
    pub expected_a: f64,
    /// Whether either new rating was raised to the rating floor
    pub clamped: bool,
}

/// Trait for calculating rating changes after head-to-head games
pub trait RatingCalculator: Send + Sync {
    /// Calculate both new ratings from the pre-game ratings and the outcome
    ///
    /// # Arguments
    /// * `rating_a` - Current rating of the first contestant
    /// * `rating_b` - Current rating of the second contestant
    /// * `outcome` - Which of the two won
    fn compute(
        &self,
        rating_a: f64,
        rating_b: f64,
        outcome: MatchOutcome,
    ) -> crate::error::Result<RatingCalculationResult>;

    /// Probability that a player rated `rating_a` beats one rated `rating_b`
    fn expected_score(&self, rating_a: f64, rating_b: f64) -> f64;

    /// Get the initial rating for new players
    fn initial_rating(&self) -> f64;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;

    /// Update configuration from JSON
    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()>;

    /// Calculate new ratings given the winner's id instead of an outcome
    ///
    /// Fails with `InvalidOutcome` when the winner is not exactly one of the
    /// two contestants.
    fn compute_for_winner(
        &self,
        (player_a, rating_a): (&PlayerId, f64),
        (player_b, rating_b): (&PlayerId, f64),
        winner: &PlayerId,
    ) -> crate::error::Result<RatingCalculationResult> {
        let outcome = MatchOutcome::from_winner(player_a, player_b, winner).ok_or_else(|| {
            RankingError::InvalidOutcome {
                reason: format!(
                    "winner {} does not identify exactly one of {} and {}",
                    winner, player_a, player_b
                ),
            }
        })?;

        self.compute(rating_a, rating_b, outcome)
    }
}

/// Mock rating calculator for testing
#[derive(Debug, Default)]
pub struct MockRatingCalculator {
    calculation_calls: std::sync::Mutex<Vec<(f64, f64, MatchOutcome)>>,
    fixed_result: std::sync::RwLock<Option<RatingCalculationResult>>,
    initial_rating: f64,
}

impl MockRatingCalculator {
    pub fn new() -> Self {
        Self {
            calculation_calls: std::sync::Mutex::new(Vec::new()),
            fixed_result: std::sync::RwLock::new(None),
            initial_rating: crate::types::DEFAULT_RATING,
        }
    }

    /// Set a fixed result to return for all calculations
    pub fn set_fixed_result(&self, result: RatingCalculationResult) {
        if let Ok(mut fixed) = self.fixed_result.write() {
            *fixed = Some(result);
        }
    }

    /// Get all calculation calls made (for testing)
    pub fn get_calculation_calls(&self) -> Vec<(f64, f64, MatchOutcome)> {
        self.calculation_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of calculations performed
    pub fn call_count(&self) -> usize {
        self.calculation_calls
            .lock()
            .map(|calls| calls.len())
            .unwrap_or_default()
    }
}

impl RatingCalculator for MockRatingCalculator {
    fn compute(
        &self,
        rating_a: f64,
        rating_b: f64,
        outcome: MatchOutcome,
    ) -> crate::error::Result<RatingCalculationResult> {
        if let Ok(mut calls) = self.calculation_calls.lock() {
            calls.push((rating_a, rating_b, outcome));
        }

        if let Ok(fixed) = self.fixed_result.read() {
            if let Some(result) = fixed.as_ref() {
                return Ok(*result);
            }
        }

        // Default behavior: winner gains one point from the loser
        let (new_rating_a, new_rating_b) = match outcome {
            MatchOutcome::AWins => (rating_a + 1.0, rating_b - 1.0),
            MatchOutcome::BWins => (rating_a - 1.0, rating_b + 1.0),
        };

        Ok(RatingCalculationResult {
            new_rating_a,
            new_rating_b,
            expected_a: 0.5,
            clamped: false,
        })
    }

    fn expected_score(&self, _rating_a: f64, _rating_b: f64) -> f64 {
        0.5
    }

    fn initial_rating(&self) -> f64 {
        self.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "mock",
            "initial_rating": self.initial_rating,
        })
    }

    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()> {
        if let Some(rating) = config.get("initial_rating").and_then(|v| v.as_f64()) {
            self.initial_rating = rating;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_mock_calculator_records_calls() {
        let calculator = MockRatingCalculator::new();

        let result = calculator
            .compute(1000.0, 1000.0, MatchOutcome::AWins)
            .unwrap();
        assert_eq!(result.new_rating_a, 1001.0);
        assert_eq!(result.new_rating_b, 999.0);

        let calls = calculator.get_calculation_calls();
        assert_eq!(calls, vec![(1000.0, 1000.0, MatchOutcome::AWins)]);
    }

    #[test]
    fn test_mock_calculator_fixed_result() {
        let calculator = MockRatingCalculator::new();
        let fixed = RatingCalculationResult {
            new_rating_a: 1200.0,
            new_rating_b: 800.0,
            expected_a: 0.9,
            clamped: false,
        };
        calculator.set_fixed_result(fixed);

        let result = calculator.compute(1.0, 2.0, MatchOutcome::BWins).unwrap();
        assert_eq!(result, fixed);
        assert_eq!(calculator.call_count(), 1);
    }

    #[test]
    fn test_compute_for_winner_resolves_side() {
        let calculator = MockRatingCalculator::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let result = calculator
            .compute_for_winner((&a, 1000.0), (&b, 1000.0), &b)
            .unwrap();
        assert_eq!(result.new_rating_b, 1001.0);

        let calls = calculator.get_calculation_calls();
        assert_eq!(calls[0].2, MatchOutcome::BWins);
    }

    #[test]
    fn test_compute_for_winner_rejects_outsider() {
        let calculator = MockRatingCalculator::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let err = calculator
            .compute_for_winner((&a, 1000.0), (&b, 1000.0), &Uuid::new_v4())
            .unwrap_err();

        assert_eq!(RankingError::classify(&err).unwrap().kind(), "invalid_outcome");
        assert_eq!(calculator.call_count(), 0);
    }

    #[test]
    fn test_mock_calculator_config() {
        let mut calculator = MockRatingCalculator::new();
        assert_eq!(calculator.initial_rating(), 1000.0);

        calculator
            .update_config(serde_json::json!({ "initial_rating": 1200.0 }))
            .unwrap();
        assert_eq!(calculator.initial_rating(), 1200.0);
        assert_eq!(calculator.config()["type"], "mock");
    }
}
