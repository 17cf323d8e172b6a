//! Common types used throughout the rankings service

use crate::error::RankingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = Uuid;

/// Unique identifier for games
pub type GameId = Uuid;

/// Unique identifier for groups
pub type GroupId = Uuid;

/// Rating assigned to freshly registered players
pub const DEFAULT_RATING: f64 = 1000.0;

/// A registered player and their current global rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    /// Create a new player with the given starting rating
    pub fn new(name: impl Into<String>, initial_rating: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            rating: initial_rating,
            created_at: now,
            updated_at: now,
        }
    }

    /// Return a copy carrying a new rating
    pub fn with_rating(&self, rating: f64) -> Self {
        Self {
            rating,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Lifecycle state of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Pending,
    Finished,
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameState::Pending => write!(f, "pending"),
            GameState::Finished => write!(f, "finished"),
        }
    }
}

/// A head-to-head game between the players on its roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    /// `true` until the game is finalized
    pub active: bool,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub winner: Option<PlayerId>,
    /// Ordered roster; position 0 is the home side
    pub roster: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Create a pending game for the given roster
    pub fn new(roster: Vec<PlayerId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            active: true,
            home_score: None,
            away_score: None,
            winner: None,
            roster,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn state(&self) -> GameState {
        if self.active {
            GameState::Pending
        } else {
            GameState::Finished
        }
    }

    pub fn has_player(&self, player_id: &PlayerId) -> bool {
        self.roster.contains(player_id)
    }

    /// Number of distinct players on the roster
    pub fn distinct_players(&self) -> usize {
        self.roster.iter().collect::<BTreeSet<_>>().len()
    }

    /// Roster error for a game whose roster is not two distinct players
    pub fn roster_error(&self) -> RankingError {
        RankingError::RosterSize {
            game_id: self.id.to_string(),
            found: self.roster.len(),
            distinct: self.distinct_players(),
        }
    }

    /// The two contestants, if the roster has exactly two distinct players
    pub fn contestants(&self) -> Option<(PlayerId, PlayerId)> {
        match self.roster.as_slice() {
            [home, away] if home != away => Some((*home, *away)),
            _ => None,
        }
    }
}

/// A named collection of players and the games played among them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub players: BTreeSet<PlayerId>,
    pub games: BTreeSet<GameId>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            players: BTreeSet::new(),
            games: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }
}

/// Audit record of one player's rating change caused by one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankChange {
    /// Ledger sequence number, increasing in append order
    pub id: u64,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub before: f64,
    pub after: f64,
    pub recorded_at: DateTime<Utc>,
}

impl RankChange {
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

/// A rank change that has not been assigned a ledger id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRankChange {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub before: f64,
    pub after: f64,
}

/// Result of a head-to-head game from the first contestant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    AWins,
    BWins,
}

impl MatchOutcome {
    /// Resolve which side `winner` played on
    pub fn from_winner(a: &PlayerId, b: &PlayerId, winner: &PlayerId) -> Option<Self> {
        match (winner == a, winner == b) {
            (true, false) => Some(MatchOutcome::AWins),
            (false, true) => Some(MatchOutcome::BWins),
            _ => None,
        }
    }
}

/// Outcome of a successful finalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeReport {
    pub game: Game,
    /// One entry per contestant, in roster order
    pub changes: Vec<RankChange>,
}

impl FinalizeReport {
    pub fn change_for(&self, player_id: &PlayerId) -> Option<&RankChange> {
        self.changes.iter().find(|c| &c.player_id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_uses_initial_rating() {
        let player = Player::new("alice", DEFAULT_RATING);
        assert_eq!(player.rating, 1000.0);
        assert_eq!(player.name, "alice");
    }

    #[test]
    fn test_game_state_follows_active_flag() {
        let mut game = Game::new(vec![Uuid::new_v4(), Uuid::new_v4()]);
        assert_eq!(game.state(), GameState::Pending);
        game.active = false;
        assert_eq!(game.state(), GameState::Finished);
    }

    #[test]
    fn test_contestants_requires_two_distinct_players() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(Game::new(vec![a, b]).contestants(), Some((a, b)));
        assert_eq!(Game::new(vec![a]).contestants(), None);
        assert_eq!(Game::new(vec![a, a]).contestants(), None);
        assert_eq!(Game::new(vec![a, b, Uuid::new_v4()]).contestants(), None);
    }

    #[test]
    fn test_outcome_from_winner() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(MatchOutcome::from_winner(&a, &b, &a), Some(MatchOutcome::AWins));
        assert_eq!(MatchOutcome::from_winner(&a, &b, &b), Some(MatchOutcome::BWins));
        assert_eq!(MatchOutcome::from_winner(&a, &b, &Uuid::new_v4()), None);
        assert_eq!(MatchOutcome::from_winner(&a, &a, &a), None);
    }

    #[test]
    fn test_rank_change_delta() {
        let change = RankChange {
            id: 1,
            game_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            before: 1000.0,
            after: 984.0,
            recorded_at: Utc::now(),
        };
        assert_eq!(change.delta(), -16.0);
    }
}
