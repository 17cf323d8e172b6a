//! Game lifecycle and finalization
//!
//! A game starts pending and is finished exactly once, by
//! [`GameLifecycle::finalize_game`]. Finalizing is the only path that changes a
//! player's rating: it computes the Elo update, writes both ratings, flips the
//! game to finished and appends the two ledger rows as one unit. If any step
//! fails, the earlier steps are reverted before the error is returned.

use crate::error::{RankingError, Result};
use crate::game::locks::KeyedLocks;
use crate::game::store::{GameResult, GameStorage};
use crate::ledger::RatingChangeLedger;
use crate::metrics::MetricsCollector;
use crate::rating::{PlayerStorage, RatingCalculator};
use crate::types::{FinalizeReport, Game, GameId, GameState, NewRankChange, PlayerId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drives games from pending to finished
pub struct GameLifecycle {
    games: Arc<dyn GameStorage>,
    players: Arc<dyn PlayerStorage>,
    ledger: Arc<dyn RatingChangeLedger>,
    calculator: Arc<dyn RatingCalculator>,
    metrics: Arc<MetricsCollector>,
    game_locks: KeyedLocks<GameId>,
    player_locks: KeyedLocks<PlayerId>,
}

impl GameLifecycle {
    pub fn new(
        games: Arc<dyn GameStorage>,
        players: Arc<dyn PlayerStorage>,
        ledger: Arc<dyn RatingChangeLedger>,
        calculator: Arc<dyn RatingCalculator>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            games,
            players,
            ledger,
            calculator,
            metrics,
            game_locks: KeyedLocks::new(),
            player_locks: KeyedLocks::new(),
        }
    }

    /// Current lifecycle state of a game
    pub fn state(&self, game_id: &GameId) -> Result<GameState> {
        let game = self
            .games
            .get_game(game_id)?
            .ok_or_else(|| RankingError::GameNotFound {
                game_id: game_id.to_string(),
            })?;
        Ok(game.state())
    }

    /// Record a game's result and update both contestants' ratings
    ///
    /// # Errors
    /// * `GameNotFound` - no such game
    /// * `AlreadyFinished` - the game was finalized before; nothing changes
    /// * `RosterSize` - the roster is not exactly two distinct players
    /// * `InvalidWinner` - `winner_id` is not on the roster
    /// * `PlayerNotFound` - a roster entry has no player record
    /// * `Persistence` - a storage write failed; all effects were reverted
    pub async fn finalize_game(
        &self,
        game_id: GameId,
        winner_id: PlayerId,
        home_score: Option<i32>,
        away_score: Option<i32>,
    ) -> Result<FinalizeReport> {
        let timer = self.metrics.start_timer();

        let result = {
            let _game_guard = self.game_locks.lock(&game_id).await;
            self.finalize_locked(game_id, winner_id, home_score, away_score)
                .await
        };
        self.game_locks.prune();
        self.player_locks.prune();

        match &result {
            Ok(report) => {
                let changes: Vec<(f64, f64)> =
                    report.changes.iter().map(|c| (c.before, c.after)).collect();
                self.metrics.record_game_finalized(&changes, timer.stop());
            }
            Err(e) => {
                let reason = RankingError::classify(e).map_or("internal", |r| r.kind());
                self.metrics.record_finalize_rejected(reason);
                warn!(
                    "Finalize rejected - game: {}, winner: {}, reason: {}",
                    game_id, winner_id, e
                );
            }
        }

        result
    }

    async fn finalize_locked(
        &self,
        game_id: GameId,
        winner_id: PlayerId,
        home_score: Option<i32>,
        away_score: Option<i32>,
    ) -> Result<FinalizeReport> {
        let game = self
            .games
            .get_game(&game_id)?
            .ok_or_else(|| RankingError::GameNotFound {
                game_id: game_id.to_string(),
            })?;

        if !game.active {
            return Err(RankingError::AlreadyFinished {
                game_id: game_id.to_string(),
            }
            .into());
        }

        let (home, away) = validate_roster(&game, &winner_id)?;

        let _player_guards = self.player_locks.lock_many(&[home, away]).await;

        let players = self.players.get_players(&[home, away])?;
        let (home_player, away_player) = match (players.get(&home), players.get(&away)) {
            (Some(h), Some(a)) => (h, a),
            (None, _) => return Err(player_not_found(&home)),
            (_, None) => return Err(player_not_found(&away)),
        };

        let calc_timer = self.metrics.start_timer();
        let computed = self.calculator.compute_for_winner(
            (&home, home_player.rating),
            (&away, away_player.rating),
            &winner_id,
        )?;
        self.metrics
            .record_rating_calculation(calc_timer.stop(), computed.clamped);

        debug!(
            "Computed ratings for game {} - expected home score {:.3}, home {:.2} -> {:.2}, away {:.2} -> {:.2}",
            game_id,
            computed.expected_a,
            home_player.rating,
            computed.new_rating_a,
            away_player.rating,
            computed.new_rating_b
        );

        let mut txn = FinalizeTransaction::new(self.players.as_ref(), self.games.as_ref());

        txn.store_ratings(
            vec![(home, home_player.rating), (away, away_player.rating)],
            &[(home, computed.new_rating_a), (away, computed.new_rating_b)],
        )?;

        let finished = txn.finish_game(
            &game,
            GameResult {
                winner: winner_id,
                home_score,
                away_score,
            },
        )?;

        let changes = self.ledger.append_batch(vec![
            NewRankChange {
                game_id,
                player_id: home,
                before: home_player.rating,
                after: computed.new_rating_a,
            },
            NewRankChange {
                game_id,
                player_id: away,
                before: away_player.rating,
                after: computed.new_rating_b,
            },
        ])?;

        txn.commit();

        info!(
            "Game {} finalized - winner: {}, {} {:.1} -> {:.1}, {} {:.1} -> {:.1}",
            game_id,
            winner_id,
            home_player.name,
            home_player.rating,
            computed.new_rating_a,
            away_player.name,
            away_player.rating,
            computed.new_rating_b
        );

        Ok(FinalizeReport {
            game: finished,
            changes,
        })
    }
}

fn player_not_found(player_id: &PlayerId) -> anyhow::Error {
    RankingError::PlayerNotFound {
        player_id: player_id.to_string(),
    }
    .into()
}

/// Check the roster preconditions and return the (home, away) contestants
fn validate_roster(game: &Game, winner_id: &PlayerId) -> Result<(PlayerId, PlayerId)> {
    let (home, away) = game.contestants().ok_or_else(|| game.roster_error())?;

    if !game.has_player(winner_id) {
        return Err(RankingError::InvalidWinner {
            game_id: game.id.to_string(),
            winner_id: winner_id.to_string(),
        }
        .into());
    }

    Ok((home, away))
}

/// Undo log for a finalization in progress
///
/// Every applied write registers its inverse. Dropping the transaction
/// without calling [`FinalizeTransaction::commit`] replays the inverses.
struct FinalizeTransaction<'a> {
    players: &'a dyn PlayerStorage,
    games: &'a dyn GameStorage,
    previous_ratings: Option<Vec<(PlayerId, f64)>>,
    previous_game: Option<Game>,
    committed: bool,
}

impl<'a> FinalizeTransaction<'a> {
    fn new(players: &'a dyn PlayerStorage, games: &'a dyn GameStorage) -> Self {
        Self {
            players,
            games,
            previous_ratings: None,
            previous_game: None,
            committed: false,
        }
    }

    fn store_ratings(
        &mut self,
        previous: Vec<(PlayerId, f64)>,
        updates: &[(PlayerId, f64)],
    ) -> Result<()> {
        self.players.store_ratings(updates)?;
        self.previous_ratings = Some(previous);
        Ok(())
    }

    fn finish_game(&mut self, snapshot: &Game, result: GameResult) -> Result<Game> {
        let finished = self.games.finish_game(&snapshot.id, result)?;
        self.previous_game = Some(snapshot.clone());
        Ok(finished)
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for FinalizeTransaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        if let Some(game) = self.previous_game.take() {
            if let Err(e) = self.games.revert_finish(&game) {
                error!("Failed to revert game {} during rollback: {}", game.id, e);
            }
        }

        if let Some(ratings) = self.previous_ratings.take() {
            if let Err(e) = self.players.store_ratings(&ratings) {
                error!("Failed to restore ratings during rollback: {}", e);
            } else {
                debug!("Restored {} player ratings after failed finalize", ratings.len());
            }
        }
    }
}
