//! Append-only ledger of rating changes
//!
//! Every finalized game leaves one [`RankChange`] per contestant here. Entries
//! are never updated or removed; they are the audit trail that explains how a
//! player's current rating came about.

use crate::error::RankingError;
use crate::types::{GameId, NewRankChange, PlayerId, RankChange};
use crate::utils::current_timestamp;
use std::sync::RwLock;

/// Storage for rating change records
#[cfg_attr(test, mockall::automock)]
pub trait RatingChangeLedger: Send + Sync {
    /// Append a single entry
    fn append(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        before: f64,
        after: f64,
    ) -> crate::error::Result<RankChange>;

    /// Append several entries; either all of them are recorded or none is
    fn append_batch(&self, entries: Vec<NewRankChange>) -> crate::error::Result<Vec<RankChange>>;

    /// Entries for one player, oldest first
    fn query_by_player(&self, player_id: &PlayerId) -> crate::error::Result<Vec<RankChange>>;

    /// Entries caused by one game, in append order
    fn query_by_game(&self, game_id: &GameId) -> crate::error::Result<Vec<RankChange>>;

    /// Total number of entries
    fn len(&self) -> crate::error::Result<usize>;

    fn is_empty(&self) -> crate::error::Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<RankChange>,
    next_id: u64,
}

impl LedgerState {
    fn push(&mut self, entry: NewRankChange) -> RankChange {
        self.next_id += 1;
        let change = RankChange {
            id: self.next_id,
            game_id: entry.game_id,
            player_id: entry.player_id,
            before: entry.before,
            after: entry.after,
            recorded_at: current_timestamp(),
        };
        self.entries.push(change.clone());
        change
    }
}

/// In-memory ledger implementation
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<F>(&self, filter: F) -> crate::error::Result<Vec<RankChange>>
    where
        F: Fn(&RankChange) -> bool,
    {
        let state = self
            .state
            .read()
            .map_err(|_| RankingError::persistence("Failed to acquire ledger read lock"))?;

        Ok(state.entries.iter().filter(|e| filter(e)).cloned().collect())
    }
}

fn check_values(before: f64, after: f64) -> crate::error::Result<()> {
    if !before.is_finite() || !after.is_finite() {
        return Err(RankingError::persistence(format!(
            "Refusing to record non-finite rating change {} -> {}",
            before, after
        ))
        .into());
    }
    Ok(())
}

impl RatingChangeLedger for InMemoryLedger {
    fn append(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        before: f64,
        after: f64,
    ) -> crate::error::Result<RankChange> {
        check_values(before, after)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| RankingError::persistence("Failed to acquire ledger write lock"))?;

        Ok(state.push(NewRankChange {
            game_id,
            player_id,
            before,
            after,
        }))
    }

    fn append_batch(&self, entries: Vec<NewRankChange>) -> crate::error::Result<Vec<RankChange>> {
        for entry in &entries {
            check_values(entry.before, entry.after)?;
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| RankingError::persistence("Failed to acquire ledger write lock"))?;

        Ok(entries.into_iter().map(|entry| state.push(entry)).collect())
    }

    fn query_by_player(&self, player_id: &PlayerId) -> crate::error::Result<Vec<RankChange>> {
        self.collect(|entry| &entry.player_id == player_id)
    }

    fn query_by_game(&self, game_id: &GameId) -> crate::error::Result<Vec<RankChange>> {
        self.collect(|entry| &entry.game_id == game_id)
    }

    fn len(&self) -> crate::error::Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|_| RankingError::persistence("Failed to acquire ledger read lock"))?;
        Ok(state.entries.len())
    }
}
