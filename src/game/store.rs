//! Game storage interface and implementations
//!
//! Games and their rosters are written here by the surrounding application.
//! The only state change a stored game ever goes through is the
//! pending-to-finished flip performed by [`GameStorage::finish_game`].

use crate::error::RankingError;
use crate::types::{Game, GameId, GameState, PlayerId};
use crate::utils::current_timestamp;
use std::collections::HashMap;
use std::sync::RwLock;

/// Result fields recorded when a game is finished
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameResult {
    pub winner: PlayerId,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

/// Trait for game storage operations
pub trait GameStorage: Send + Sync {
    /// Insert a newly created game
    fn insert_game(&self, game: Game) -> crate::error::Result<()>;

    /// Get a single game
    fn get_game(&self, game_id: &GameId) -> crate::error::Result<Option<Game>>;

    /// Get several games; unknown ids are skipped. Ordered by creation time.
    fn get_games(&self, game_ids: &[GameId]) -> crate::error::Result<Vec<Game>>;

    /// Games a player is on the roster of, optionally filtered by state
    fn games_for_player(
        &self,
        player_id: &PlayerId,
        state: Option<GameState>,
    ) -> crate::error::Result<Vec<Game>>;

    /// Flip a pending game to finished and record its result
    ///
    /// Fails with `AlreadyFinished` if the game is not pending.
    fn finish_game(&self, game_id: &GameId, result: GameResult) -> crate::error::Result<Game>;

    /// Put back the pre-finish snapshot of a game whose finalization did not commit
    fn revert_finish(&self, snapshot: &Game) -> crate::error::Result<()>;

    /// Get total number of games
    fn game_count(&self) -> crate::error::Result<usize>;
}

/// In-memory game storage implementation
#[derive(Debug, Default)]
pub struct InMemoryGameStorage {
    games: RwLock<HashMap<GameId, Game>>,
}

impl InMemoryGameStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_creation(mut games: Vec<Game>) -> Vec<Game> {
    games.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    games
}

impl GameStorage for InMemoryGameStorage {
    fn insert_game(&self, game: Game) -> crate::error::Result<()> {
        let mut games = self
            .games
            .write()
            .map_err(|_| RankingError::persistence("Failed to acquire games write lock"))?;

        if games.contains_key(&game.id) {
            return Err(
                RankingError::persistence(format!("Game {} already exists", game.id)).into(),
            );
        }

        games.insert(game.id, game);
        Ok(())
    }

    fn get_game(&self, game_id: &GameId) -> crate::error::Result<Option<Game>> {
        let games = self
            .games
            .read()
            .map_err(|_| RankingError::persistence("Failed to acquire games read lock"))?;

        Ok(games.get(game_id).cloned())
    }

    fn get_games(&self, game_ids: &[GameId]) -> crate::error::Result<Vec<Game>> {
        let games = self
            .games
            .read()
            .map_err(|_| RankingError::persistence("Failed to acquire games read lock"))?;

        let found = game_ids
            .iter()
            .filter_map(|id| games.get(id).cloned())
            .collect();
        Ok(sorted_by_creation(found))
    }

    fn games_for_player(
        &self,
        player_id: &PlayerId,
        state: Option<GameState>,
    ) -> crate::error::Result<Vec<Game>> {
        let games = self
            .games
            .read()
            .map_err(|_| RankingError::persistence("Failed to acquire games read lock"))?;

        let found = games
            .values()
            .filter(|game| game.has_player(player_id))
            .filter(|game| state.map_or(true, |s| game.state() == s))
            .cloned()
            .collect();
        Ok(sorted_by_creation(found))
    }

    fn finish_game(&self, game_id: &GameId, result: GameResult) -> crate::error::Result<Game> {
        let mut games = self
            .games
            .write()
            .map_err(|_| RankingError::persistence("Failed to acquire games write lock"))?;

        let game = games
            .get_mut(game_id)
            .ok_or_else(|| RankingError::GameNotFound {
                game_id: game_id.to_string(),
            })?;

        if !game.active {
            return Err(RankingError::AlreadyFinished {
                game_id: game_id.to_string(),
            }
            .into());
        }

        game.active = false;
        game.winner = Some(result.winner);
        game.home_score = result.home_score;
        game.away_score = result.away_score;
        game.finished_at = Some(current_timestamp());

        Ok(game.clone())
    }

    fn revert_finish(&self, snapshot: &Game) -> crate::error::Result<()> {
        let mut games = self
            .games
            .write()
            .map_err(|_| RankingError::persistence("Failed to acquire games write lock"))?;

        games.insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    fn game_count(&self) -> crate::error::Result<usize> {
        let games = self
            .games
            .read()
            .map_err(|_| RankingError::persistence("Failed to acquire games read lock"))?;
        Ok(games.len())
    }
}
