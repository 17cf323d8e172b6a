//! Error types for the rankings service
//!
//! Domain failures are modelled as `RankingError` variants and carried through
//! the crate inside `anyhow::Error`, so callers can still recover the concrete
//! variant with [`RankingError::classify`].

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for rating and game lifecycle scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankingError {
    #[error("A game requires exactly two distinct players, roster has {found} entries and {distinct} distinct players")]
    RosterSize {
        game_id: String,
        found: usize,
        distinct: usize,
    },

    #[error("Winner {winner_id} is not part of game {game_id}")]
    InvalidWinner { game_id: String, winner_id: String },

    #[error("Invalid match outcome: {reason}")]
    InvalidOutcome { reason: String },

    #[error("Game already finished: {game_id}")]
    AlreadyFinished { game_id: String },

    #[error("Persistence failure: {message}")]
    Persistence { message: String },

    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: String },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Group not found: {group_id}")]
    GroupNotFound { group_id: String },

    #[error("Group name already taken: {name}")]
    DuplicateGroupName { name: String },

    #[error("Invalid group name: {reason}")]
    InvalidGroupName { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl RankingError {
    /// Recover the domain error carried by an `anyhow::Error`, if any
    pub fn classify(error: &anyhow::Error) -> Option<&RankingError> {
        error.downcast_ref::<RankingError>()
    }

    /// Bad input from the caller; retrying with the same arguments cannot succeed
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RankingError::RosterSize { .. }
                | RankingError::InvalidWinner { .. }
                | RankingError::InvalidOutcome { .. }
                | RankingError::DuplicateGroupName { .. }
                | RankingError::InvalidGroupName { .. }
        )
    }

    /// Whether the caller may retry after confirming nothing was committed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RankingError::Persistence { .. })
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            RankingError::RosterSize { .. } => "roster_size",
            RankingError::InvalidWinner { .. } => "invalid_winner",
            RankingError::InvalidOutcome { .. } => "invalid_outcome",
            RankingError::AlreadyFinished { .. } => "already_finished",
            RankingError::Persistence { .. } => "persistence",
            RankingError::GameNotFound { .. } => "game_not_found",
            RankingError::PlayerNotFound { .. } => "player_not_found",
            RankingError::GroupNotFound { .. } => "group_not_found",
            RankingError::DuplicateGroupName { .. } => "duplicate_group_name",
            RankingError::InvalidGroupName { .. } => "invalid_group_name",
            RankingError::ConfigurationError { .. } => "configuration",
        }
    }

    /// Shorthand for a lock-poisoning or storage failure
    pub fn persistence(message: impl Into<String>) -> Self {
        RankingError::Persistence {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_roundtrips_through_anyhow() {
        let err: anyhow::Error = RankingError::AlreadyFinished {
            game_id: "g1".to_string(),
        }
        .into();

        let classified = RankingError::classify(&err).unwrap();
        assert_eq!(classified.kind(), "already_finished");
        assert!(!classified.is_validation());
    }

    #[test]
    fn test_classify_survives_context() {
        let err = anyhow::Error::from(RankingError::persistence("disk full"))
            .context("while finalizing game");

        let classified = RankingError::classify(&err).unwrap();
        assert!(classified.is_retryable());
    }

    #[test]
    fn test_validation_errors_are_not_retryable() {
        let errors = [
            RankingError::RosterSize {
                game_id: "g".to_string(),
                found: 3,
                distinct: 3,
            },
            RankingError::InvalidWinner {
                game_id: "g".to_string(),
                winner_id: "p".to_string(),
            },
            RankingError::InvalidOutcome {
                reason: "tie".to_string(),
            },
        ];

        for error in errors {
            assert!(error.is_validation());
            assert!(!error.is_retryable());
        }
    }

    #[test]
    fn test_roster_message_is_user_facing() {
        let err = RankingError::RosterSize {
            game_id: "g".to_string(),
            found: 3,
            distinct: 2,
        };
        assert_eq!(
            err.to_string(),
            "A game requires exactly two distinct players, roster has 3 entries and 2 distinct players"
        );
    }
}
