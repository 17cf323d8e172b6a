//! Rating system configuration

use crate::error::RankingError;
use crate::types::DEFAULT_RATING;
use serde::{Deserialize, Serialize};

/// Parameters of the Elo update shared by every game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Maximum rating swing per game
    pub k_factor: f64,
    /// Rating given to newly registered players
    pub initial_rating: f64,
    /// Lowest rating a player can be pushed down to
    pub rating_floor: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            initial_rating: DEFAULT_RATING,
            rating_floor: 0.0,
        }
    }
}

impl RatingConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(RankingError::ConfigurationError {
                message: "K-factor must be a positive number".to_string(),
            }
            .into());
        }

        if !self.initial_rating.is_finite() || !self.rating_floor.is_finite() {
            return Err(RankingError::ConfigurationError {
                message: "Ratings must be finite".to_string(),
            }
            .into());
        }

        if self.initial_rating < self.rating_floor {
            return Err(RankingError::ConfigurationError {
                message: format!(
                    "Initial rating {} is below the rating floor {}",
                    self.initial_rating, self.rating_floor
                ),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rating_config() {
        let config = RatingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rating_floor, 0.0);
    }

    #[test]
    fn test_initial_below_floor_rejected() {
        let config = RatingConfig {
            initial_rating: 50.0,
            rating_floor: 100.0,
            ..RatingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_k_rejected() {
        let config = RatingConfig {
            k_factor: f64::NAN,
            ..RatingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
