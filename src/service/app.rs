//! Main application state and service coordination
//!
//! `RankingService` owns every storage component and the game lifecycle, and
//! is the single entry point used by the HTTP layer and by embedding callers.

use crate::config::AppConfig;
use crate::error::{RankingError, Result};
use crate::game::{GameLifecycle, GameStorage, InMemoryGameStorage};
use crate::group::{GroupStorage, InMemoryGroupStorage};
use crate::ledger::{InMemoryLedger, RatingChangeLedger};
use crate::metrics::MetricsCollector;
use crate::rating::{EloRatingCalculator, InMemoryPlayerStorage, PlayerStorage, RatingCalculator};
use crate::types::{
    FinalizeReport, Game, GameId, GameState, Group, GroupId, Player, PlayerId, RankChange,
};
use crate::utils::by_rating_desc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// One row of the global leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub player: Player,
}

/// A player together with their groups and games
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player: Player,
    pub groups: Vec<Group>,
    pub active_games: Vec<Game>,
    pub completed_games: Vec<Game>,
}

/// A group with its members ranked by rating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupView {
    pub group: Group,
    /// Members in descending rating order
    pub members: Vec<Player>,
    pub active_games: Vec<Game>,
    pub completed_games: Vec<Game>,
}

/// A game with its contestants and the rating changes it caused
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameView {
    pub game: Game,
    /// First group the game belongs to, if any
    pub group: Option<Group>,
    /// Roster players in descending rating order
    pub players: Vec<Player>,
    /// Empty until the game is finalized
    pub changes: Vec<RankChange>,
}

/// Main application state containing all service components
pub struct RankingService {
    config: AppConfig,
    players: Arc<dyn PlayerStorage>,
    games: Arc<dyn GameStorage>,
    groups: Arc<dyn GroupStorage>,
    ledger: Arc<dyn RatingChangeLedger>,
    calculator: Arc<dyn RatingCalculator>,
    lifecycle: GameLifecycle,
    metrics: Arc<MetricsCollector>,
    is_running: RwLock<bool>,
}

impl RankingService {
    /// Build the service with in-memory storage
    pub fn new(config: AppConfig) -> std::result::Result<Self, ServiceError> {
        info!("Initializing {} rankings service", config.service.name);

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let calculator = EloRatingCalculator::new(config.rating.clone()).map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to initialize rating calculator: {}", e),
            }
        })?;

        let metrics = MetricsCollector::new().map_err(|e| ServiceError::Initialization {
            message: format!("Failed to create metrics collector: {}", e),
        })?;

        info!(
            "Rating engine: Elo, k_factor={}, initial_rating={}, rating_floor={}",
            config.rating.k_factor, config.rating.initial_rating, config.rating.rating_floor
        );

        Ok(Self::with_components(
            config,
            Arc::new(InMemoryPlayerStorage::new()),
            Arc::new(InMemoryGameStorage::new()),
            Arc::new(InMemoryGroupStorage::new()),
            Arc::new(InMemoryLedger::new()),
            Arc::new(calculator),
            Arc::new(metrics),
        ))
    }

    /// Build the service from explicit components
    pub fn with_components(
        config: AppConfig,
        players: Arc<dyn PlayerStorage>,
        games: Arc<dyn GameStorage>,
        groups: Arc<dyn GroupStorage>,
        ledger: Arc<dyn RatingChangeLedger>,
        calculator: Arc<dyn RatingCalculator>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let lifecycle = GameLifecycle::new(
            games.clone(),
            players.clone(),
            ledger.clone(),
            calculator.clone(),
            metrics.clone(),
        );

        Self {
            config,
            players,
            games,
            groups,
            ledger,
            calculator,
            lifecycle,
            metrics,
            is_running: RwLock::new(false),
        }
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub async fn set_running(&self, running: bool) {
        *self.is_running.write().await = running;
        self.metrics.update_health_status(if running { 2 } else { 0 });
    }

    // ---- writes ----

    /// Register a player at the configured initial rating
    pub fn register_player(&self, name: &str) -> Result<Player> {
        let player = Player::new(name.trim(), self.calculator.initial_rating());
        self.players.insert_player(player.clone())?;
        self.metrics.record_player_registered(player.rating);

        info!("Registered player '{}' ({})", player.name, player.id);
        Ok(player)
    }

    pub fn create_group(&self, name: &str) -> Result<Group> {
        let group = self.groups.create_group(name)?;
        self.metrics.record_group_created();

        info!("Created group '{}' ({})", group.name, group.id);
        Ok(group)
    }

    pub fn rename_group(&self, group_id: &GroupId, name: &str) -> Result<Group> {
        let group = self.groups.rename_group(group_id, name)?;
        info!("Renamed group {} to '{}'", group.id, group.name);
        Ok(group)
    }

    pub fn add_group_member(&self, group_id: &GroupId, player_id: &PlayerId) -> Result<Group> {
        self.require_player(player_id)?;
        let group = self.groups.add_member(group_id, *player_id)?;

        debug!("Player {} joined group {}", player_id, group_id);
        Ok(group)
    }

    pub fn remove_group_member(&self, group_id: &GroupId, player_id: &PlayerId) -> Result<Group> {
        let group = self.groups.remove_member(group_id, player_id)?;

        debug!("Player {} left group {}", player_id, group_id);
        Ok(group)
    }

    /// Create a pending game inside a group
    ///
    /// The roster must be two distinct registered players. Finalization checks
    /// the roster again for games inserted through other paths.
    pub fn create_game(&self, group_id: &GroupId, roster: Vec<PlayerId>) -> Result<Game> {
        self.require_group(group_id)?;

        let game = Game::new(roster);
        if game.contestants().is_none() {
            return Err(game.roster_error().into());
        }
        for player_id in &game.roster {
            self.require_player(player_id)?;
        }

        self.games.insert_game(game.clone())?;
        self.groups.add_game(group_id, game.id)?;
        self.metrics.record_game_created();

        info!(
            "Created game {} in group {} with {} players",
            game.id,
            group_id,
            game.roster.len()
        );
        Ok(game)
    }

    /// Finalize a game and update both contestants' ratings
    pub async fn finalize_game(
        &self,
        game_id: GameId,
        winner_id: PlayerId,
        home_score: Option<i32>,
        away_score: Option<i32>,
    ) -> Result<FinalizeReport> {
        self.lifecycle
            .finalize_game(game_id, winner_id, home_score, away_score)
            .await
    }

    // ---- reads ----

    /// Players by descending rating, optionally truncated
    pub fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>> {
        let players = self.players.players_by_rating(limit)?;
        Ok(players
            .into_iter()
            .enumerate()
            .map(|(i, player)| LeaderboardEntry {
                rank: i + 1,
                player,
            })
            .collect())
    }

    pub fn player_profile(&self, player_id: &PlayerId) -> Result<PlayerProfile> {
        let player = self.require_player(player_id)?;
        let groups = self.groups.groups_for_player(player_id)?;
        let active_games = self
            .games
            .games_for_player(player_id, Some(GameState::Pending))?;
        let completed_games = self
            .games
            .games_for_player(player_id, Some(GameState::Finished))?;

        Ok(PlayerProfile {
            player,
            groups,
            active_games,
            completed_games,
        })
    }

    pub fn group_view(&self, group_id: &GroupId) -> Result<GroupView> {
        let group = self.require_group(group_id)?;

        let member_ids: Vec<PlayerId> = group.players.iter().copied().collect();
        let members = self.ranked(&member_ids)?;

        let game_ids: Vec<GameId> = group.games.iter().copied().collect();
        let (active_games, completed_games) = self
            .games
            .get_games(&game_ids)?
            .into_iter()
            .partition(|game| game.active);

        Ok(GroupView {
            group,
            members,
            active_games,
            completed_games,
        })
    }

    pub fn game_view(&self, game_id: &GameId) -> Result<GameView> {
        let game = self
            .games
            .get_game(game_id)?
            .ok_or_else(|| RankingError::GameNotFound {
                game_id: game_id.to_string(),
            })?;

        let group = self
            .groups
            .list_groups()?
            .into_iter()
            .find(|group| group.games.contains(game_id));
        let players = self.ranked(&game.roster)?;
        let changes = self.ledger.query_by_game(game_id)?;

        Ok(GameView {
            game,
            group,
            players,
            changes,
        })
    }

    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.groups.list_groups()
    }

    /// Every rating change recorded for a player, oldest first
    pub fn rating_history(&self, player_id: &PlayerId) -> Result<Vec<RankChange>> {
        self.require_player(player_id)?;
        self.ledger.query_by_player(player_id)
    }

    /// Total ledger entries
    pub fn ledger_len(&self) -> Result<usize> {
        self.ledger.len()
    }

    /// Lightweight counts for health reporting
    pub fn counts(&self) -> Result<(usize, usize, usize)> {
        Ok((
            self.players.player_count()?,
            self.games.game_count()?,
            self.groups.list_groups()?.len(),
        ))
    }

    fn require_player(&self, player_id: &PlayerId) -> Result<Player> {
        self.players.get_player(player_id)?.ok_or_else(|| {
            RankingError::PlayerNotFound {
                player_id: player_id.to_string(),
            }
            .into()
        })
    }

    fn require_group(&self, group_id: &GroupId) -> Result<Group> {
        self.groups.get_group(group_id)?.ok_or_else(|| {
            RankingError::GroupNotFound {
                group_id: group_id.to_string(),
            }
            .into()
        })
    }

    /// Load players and order them by descending rating, name as tiebreak
    fn ranked(&self, player_ids: &[PlayerId]) -> Result<Vec<Player>> {
        let mut players: Vec<Player> = self
            .players
            .get_players(player_ids)?
            .into_values()
            .collect();
        players.sort_by(|a, b| by_rating_desc(a.rating, b.rating).then_with(|| a.name.cmp(&b.name)));
        Ok(players)
    }
}
