//! Player rating storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving players and
//! their current ratings, with an in-memory implementation.

use crate::error::RankingError;
use crate::types::{Player, PlayerId};
use crate::utils::{by_rating_desc, current_timestamp};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for player storage operations
pub trait PlayerStorage: Send + Sync {
    /// Get a single player
    fn get_player(&self, player_id: &PlayerId) -> crate::error::Result<Option<Player>>;

    /// Get several players at once; unknown ids are left out of the map
    fn get_players(
        &self,
        player_ids: &[PlayerId],
    ) -> crate::error::Result<HashMap<PlayerId, Player>>;

    /// Insert a newly registered player
    fn insert_player(&self, player: Player) -> crate::error::Result<()>;

    /// Overwrite the ratings of several players atomically
    ///
    /// Either every listed player is updated or none is. Returns the stored
    /// records in the order given.
    fn store_ratings(&self, updates: &[(PlayerId, f64)]) -> crate::error::Result<Vec<Player>>;

    /// Players ordered by descending rating
    fn players_by_rating(&self, limit: Option<usize>) -> crate::error::Result<Vec<Player>>;

    /// Get total number of registered players
    fn player_count(&self) -> crate::error::Result<usize>;
}

/// In-memory player storage implementation
#[derive(Debug, Default)]
pub struct InMemoryPlayerStorage {
    players: RwLock<HashMap<PlayerId, Player>>,
}

impl InMemoryPlayerStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> crate::error::Result<std::sync::RwLockReadGuard<'_, HashMap<PlayerId, Player>>> {
        self.players
            .read()
            .map_err(|_| RankingError::persistence("Failed to acquire players read lock").into())
    }

    fn write(
        &self,
    ) -> crate::error::Result<std::sync::RwLockWriteGuard<'_, HashMap<PlayerId, Player>>> {
        self.players
            .write()
            .map_err(|_| RankingError::persistence("Failed to acquire players write lock").into())
    }
}

impl PlayerStorage for InMemoryPlayerStorage {
    fn get_player(&self, player_id: &PlayerId) -> crate::error::Result<Option<Player>> {
        Ok(self.read()?.get(player_id).cloned())
    }

    fn get_players(
        &self,
        player_ids: &[PlayerId],
    ) -> crate::error::Result<HashMap<PlayerId, Player>> {
        let players = self.read()?;

        let mut result = HashMap::new();
        for player_id in player_ids {
            if let Some(player) = players.get(player_id) {
                result.insert(*player_id, player.clone());
            }
        }

        Ok(result)
    }

    fn insert_player(&self, player: Player) -> crate::error::Result<()> {
        let mut players = self.write()?;

        if players.contains_key(&player.id) {
            return Err(RankingError::persistence(format!(
                "Player {} already exists",
                player.id
            ))
            .into());
        }

        players.insert(player.id, player);
        Ok(())
    }

    fn store_ratings(&self, updates: &[(PlayerId, f64)]) -> crate::error::Result<Vec<Player>> {
        let mut players = self.write()?;

        // Validate the whole batch before touching anything
        for (player_id, _) in updates {
            if !players.contains_key(player_id) {
                return Err(RankingError::PlayerNotFound {
                    player_id: player_id.to_string(),
                }
                .into());
            }
        }

        let now = current_timestamp();
        let mut stored = Vec::with_capacity(updates.len());
        for (player_id, rating) in updates {
            if let Some(player) = players.get_mut(player_id) {
                player.rating = *rating;
                player.updated_at = now;
                stored.push(player.clone());
            }
        }

        Ok(stored)
    }

    fn players_by_rating(&self, limit: Option<usize>) -> crate::error::Result<Vec<Player>> {
        let players = self.read()?;

        let mut ordered: Vec<Player> = players.values().cloned().collect();
        ordered.sort_by(|a, b| by_rating_desc(a.rating, b.rating).then(a.name.cmp(&b.name)));

        if let Some(limit) = limit {
            ordered.truncate(limit);
        }

        Ok(ordered)
    }

    fn player_count(&self) -> crate::error::Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn create_test_player(name: &str, rating: f64) -> Player {
        Player::new(name, rating)
    }

    #[test]
    fn test_insert_and_get() {
        let storage = InMemoryPlayerStorage::new();
        let player = create_test_player("alice", 1000.0);
        let id = player.id;

        assert!(storage.get_player(&id).unwrap().is_none());
        storage.insert_player(player).unwrap();

        let retrieved = storage.get_player(&id).unwrap().unwrap();
        assert_eq!(retrieved.name, "alice");
        assert_eq!(retrieved.rating, 1000.0);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let storage = InMemoryPlayerStorage::new();
        let player = create_test_player("alice", 1000.0);

        storage.insert_player(player.clone()).unwrap();
        assert!(storage.insert_player(player).is_err());
        assert_eq!(storage.player_count().unwrap(), 1);
    }

    #[test]
    fn test_store_ratings_updates_all() {
        let storage = InMemoryPlayerStorage::new();
        let a = create_test_player("a", 1000.0);
        let b = create_test_player("b", 1000.0);
        let (a_id, b_id) = (a.id, b.id);
        storage.insert_player(a).unwrap();
        storage.insert_player(b).unwrap();

        let stored = storage
            .store_ratings(&[(a_id, 1016.0), (b_id, 984.0)])
            .unwrap();

        assert_eq!(stored[0].rating, 1016.0);
        assert_eq!(stored[1].rating, 984.0);
        assert_eq!(storage.get_player(&b_id).unwrap().unwrap().rating, 984.0);
    }

    #[test]
    fn test_store_ratings_is_all_or_nothing() {
        let storage = InMemoryPlayerStorage::new();
        let a = create_test_player("a", 1000.0);
        let a_id = a.id;
        storage.insert_player(a).unwrap();

        let missing = Uuid::new_v4();
        let err = storage
            .store_ratings(&[(a_id, 1200.0), (missing, 900.0)])
            .unwrap_err();

        assert_eq!(
            RankingError::classify(&err).unwrap().kind(),
            "player_not_found"
        );
        assert_eq!(storage.get_player(&a_id).unwrap().unwrap().rating, 1000.0);
    }

    #[test]
    fn test_players_by_rating_descending() {
        let storage = InMemoryPlayerStorage::new();
        for (name, rating) in [("low", 900.0), ("high", 1200.0), ("mid", 1000.0)] {
            storage
                .insert_player(create_test_player(name, rating))
                .unwrap();
        }

        let ordered = storage.players_by_rating(None).unwrap();
        let names: Vec<_> = ordered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);

        let top = storage.players_by_rating(Some(1)).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "high");
    }

    #[test]
    fn test_get_players_skips_unknown() {
        let storage = InMemoryPlayerStorage::new();
        let a = create_test_player("a", 1000.0);
        let a_id = a.id;
        storage.insert_player(a).unwrap();

        let found = storage.get_players(&[a_id, Uuid::new_v4()]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&a_id));
    }
}
