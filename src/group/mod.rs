//! Groups of players
//!
//! A group is a named set of members plus the games played among them. Group
//! names are unique, compared case-insensitively after trimming. Groups carry
//! no ratings of their own; standings inside a group are the members' global
//! ratings.

use crate::error::RankingError;
use crate::types::{GameId, Group, GroupId, PlayerId};
use crate::utils::normalize_name;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Trait for group storage operations
pub trait GroupStorage: Send + Sync {
    /// Create a group; fails with `DuplicateGroupName` if the name is taken
    fn create_group(&self, name: &str) -> crate::error::Result<Group>;

    /// Rename a group, keeping names unique
    fn rename_group(&self, group_id: &GroupId, name: &str) -> crate::error::Result<Group>;

    /// Add a player to a group's member set. Adding an existing member is a no-op.
    fn add_member(&self, group_id: &GroupId, player_id: PlayerId) -> crate::error::Result<Group>;

    /// Remove a player from a group's member set. Games already recorded in
    /// the group are kept. Removing a non-member is a no-op.
    fn remove_member(
        &self,
        group_id: &GroupId,
        player_id: &PlayerId,
    ) -> crate::error::Result<Group>;

    /// Associate a game with a group
    fn add_game(&self, group_id: &GroupId, game_id: GameId) -> crate::error::Result<Group>;

    fn get_group(&self, group_id: &GroupId) -> crate::error::Result<Option<Group>>;

    /// All groups ordered by name
    fn list_groups(&self) -> crate::error::Result<Vec<Group>>;

    /// Groups a player is a member of, ordered by name
    fn groups_for_player(&self, player_id: &PlayerId) -> crate::error::Result<Vec<Group>>;
}

#[derive(Debug, Default)]
struct GroupIndex {
    groups: HashMap<GroupId, Group>,
    /// Normalized name to owning group
    names: HashMap<String, GroupId>,
}

impl GroupIndex {
    fn get_mut(&mut self, group_id: &GroupId) -> crate::error::Result<&mut Group> {
        self.groups.get_mut(group_id).ok_or_else(|| {
            RankingError::GroupNotFound {
                group_id: group_id.to_string(),
            }
            .into()
        })
    }

    fn claim_name(&mut self, name: &str, owner: GroupId) -> crate::error::Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RankingError::InvalidGroupName {
                reason: "name must not be empty".to_string(),
            }
            .into());
        }

        let key = normalize_name(trimmed);
        match self.names.get(&key) {
            Some(existing) if *existing != owner => Err(RankingError::DuplicateGroupName {
                name: trimmed.to_string(),
            }
            .into()),
            _ => {
                self.names.insert(key, owner);
                Ok(trimmed.to_string())
            }
        }
    }
}

fn sorted_by_name(mut groups: Vec<Group>) -> Vec<Group> {
    groups.sort_by(|a, b| normalize_name(&a.name).cmp(&normalize_name(&b.name)));
    groups
}

/// In-memory group storage implementation
#[derive(Debug, Default)]
pub struct InMemoryGroupStorage {
    index: RwLock<GroupIndex>,
}

impl InMemoryGroupStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> crate::error::Result<RwLockReadGuard<'_, GroupIndex>> {
        self.index
            .read()
            .map_err(|_| RankingError::persistence("Failed to acquire groups read lock").into())
    }

    fn write(&self) -> crate::error::Result<RwLockWriteGuard<'_, GroupIndex>> {
        self.index
            .write()
            .map_err(|_| RankingError::persistence("Failed to acquire groups write lock").into())
    }
}

impl GroupStorage for InMemoryGroupStorage {
    fn create_group(&self, name: &str) -> crate::error::Result<Group> {
        let mut index = self.write()?;
        let mut group = Group::new(name);
        group.name = index.claim_name(name, group.id)?;

        index.groups.insert(group.id, group.clone());
        debug!("Created group '{}' ({})", group.name, group.id);
        Ok(group)
    }

    fn rename_group(&self, group_id: &GroupId, name: &str) -> crate::error::Result<Group> {
        let mut index = self.write()?;
        let old_key = normalize_name(&index.get_mut(group_id)?.name);
        let new_name = index.claim_name(name, *group_id)?;

        let new_key = normalize_name(&new_name);
        if old_key != new_key {
            index.names.remove(&old_key);
        }

        let group = index.get_mut(group_id)?;
        group.name = new_name;
        Ok(group.clone())
    }

    fn add_member(&self, group_id: &GroupId, player_id: PlayerId) -> crate::error::Result<Group> {
        let mut index = self.write()?;
        let group = index.get_mut(group_id)?;
        group.players.insert(player_id);
        Ok(group.clone())
    }

    fn remove_member(
        &self,
        group_id: &GroupId,
        player_id: &PlayerId,
    ) -> crate::error::Result<Group> {
        let mut index = self.write()?;
        let group = index.get_mut(group_id)?;
        if group.players.remove(player_id) {
            debug!("Removed player {} from group {}", player_id, group_id);
        }
        Ok(group.clone())
    }

    fn add_game(&self, group_id: &GroupId, game_id: GameId) -> crate::error::Result<Group> {
        let mut index = self.write()?;
        let group = index.get_mut(group_id)?;
        group.games.insert(game_id);
        Ok(group.clone())
    }

    fn get_group(&self, group_id: &GroupId) -> crate::error::Result<Option<Group>> {
        Ok(self.read()?.groups.get(group_id).cloned())
    }

    fn list_groups(&self) -> crate::error::Result<Vec<Group>> {
        let index = self.read()?;
        Ok(sorted_by_name(index.groups.values().cloned().collect()))
    }

    fn groups_for_player(&self, player_id: &PlayerId) -> crate::error::Result<Vec<Group>> {
        let index = self.read()?;
        let groups = index
            .groups
            .values()
            .filter(|group| group.players.contains(player_id))
            .cloned()
            .collect();
        Ok(sorted_by_name(groups))
    }
}
