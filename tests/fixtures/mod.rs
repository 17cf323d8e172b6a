//! Test fixtures and fault-injecting implementations for integration testing

use rally_rankings::config::AppConfig;
use rally_rankings::error::{RankingError, Result};
use rally_rankings::game::{GameStorage, InMemoryGameStorage};
use rally_rankings::group::InMemoryGroupStorage;
use rally_rankings::ledger::{InMemoryLedger, RatingChangeLedger};
use rally_rankings::metrics::MetricsCollector;
use rally_rankings::rating::{EloRatingCalculator, InMemoryPlayerStorage, PlayerStorage};
use rally_rankings::types::{Game, GameId, Group, NewRankChange, Player, PlayerId, RankChange};
use rally_rankings::RankingService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Ledger that fails a configurable number of batch appends before
/// delegating to an in-memory ledger
#[derive(Debug, Default)]
pub struct FlakyLedger {
    inner: InMemoryLedger,
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
}

impl FlakyLedger {
    pub fn failing(times: usize) -> Self {
        Self {
            inner: InMemoryLedger::new(),
            failures_left: AtomicUsize::new(times),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Batch appends attempted, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl RatingChangeLedger for FlakyLedger {
    fn append(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        before: f64,
        after: f64,
    ) -> Result<RankChange> {
        self.inner.append(game_id, player_id, before, after)
    }

    fn append_batch(&self, entries: Vec<NewRankChange>) -> Result<Vec<RankChange>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.should_fail() {
            return Err(RankingError::persistence("injected ledger failure").into());
        }
        self.inner.append_batch(entries)
    }

    fn query_by_player(&self, player_id: &PlayerId) -> Result<Vec<RankChange>> {
        self.inner.query_by_player(player_id)
    }

    fn query_by_game(&self, game_id: &GameId) -> Result<Vec<RankChange>> {
        self.inner.query_by_game(game_id)
    }

    fn len(&self) -> Result<usize> {
        self.inner.len()
    }
}

/// Service wired to in-memory storage with the default Elo settings
pub fn create_test_service() -> Arc<RankingService> {
    Arc::new(RankingService::new(AppConfig::default()).expect("default config is valid"))
}

/// Service whose ledger fails the first `failures` batch appends
pub fn create_flaky_service(failures: usize) -> (Arc<RankingService>, Arc<FlakyLedger>) {
    let ledger = Arc::new(FlakyLedger::failing(failures));
    let service = RankingService::with_components(
        AppConfig::default(),
        Arc::new(InMemoryPlayerStorage::new()),
        Arc::new(InMemoryGameStorage::new()),
        Arc::new(InMemoryGroupStorage::new()),
        ledger.clone(),
        Arc::new(EloRatingCalculator::default()),
        Arc::new(MetricsCollector::new().expect("metrics registry")),
    );
    (Arc::new(service), ledger)
}

/// Service that shares its game storage with the caller, so tests can seed
/// games the public API would refuse to create
pub fn create_service_with_games() -> (Arc<RankingService>, Arc<InMemoryGameStorage>) {
    let games = Arc::new(InMemoryGameStorage::new());
    let service = RankingService::with_components(
        AppConfig::default(),
        Arc::new(InMemoryPlayerStorage::new()),
        games.clone(),
        Arc::new(InMemoryGroupStorage::new()),
        Arc::new(InMemoryLedger::new()),
        Arc::new(EloRatingCalculator::default()),
        Arc::new(MetricsCollector::new().expect("metrics registry")),
    );
    (Arc::new(service), games)
}

/// A group with the named players registered as members
pub fn create_group_with_players(
    service: &RankingService,
    group_name: &str,
    names: &[&str],
) -> (Group, Vec<Player>) {
    let group = service.create_group(group_name).unwrap();
    let players = names
        .iter()
        .map(|name| {
            let player = service.register_player(name).unwrap();
            service.add_group_member(&group.id, &player.id).unwrap();
            player
        })
        .collect();
    (group, players)
}

/// Current rating of a player as seen through the public read API
pub fn rating_of(service: &RankingService, player_id: &PlayerId) -> f64 {
    service.player_profile(player_id).unwrap().player.rating
}

/// Store a pending game without any roster checks
pub fn insert_raw_game(games: &InMemoryGameStorage, roster: Vec<PlayerId>) -> GameId {
    let game = Game::new(roster);
    let id = game.id;
    games.insert_game(game).unwrap();
    id
}

/// Classify an error into its kind label
pub fn error_kind(error: &anyhow::Error) -> &'static str {
    RankingError::classify(error).map_or("internal", |e| e.kind())
}

/// Service seeded with players at fixed ratings, all members of one group
pub fn create_seeded_service(ratings: &[(&str, f64)]) -> (Arc<RankingService>, Group, Vec<Player>) {
    let storage = Arc::new(InMemoryPlayerStorage::new());
    let players: Vec<Player> = ratings
        .iter()
        .map(|(name, rating)| {
            let player = Player::new(*name, *rating);
            storage.insert_player(player.clone()).unwrap();
            player
        })
        .collect();

    let service = RankingService::with_components(
        AppConfig::default(),
        storage,
        Arc::new(InMemoryGameStorage::new()),
        Arc::new(InMemoryGroupStorage::new()),
        Arc::new(InMemoryLedger::new()),
        Arc::new(EloRatingCalculator::default()),
        Arc::new(MetricsCollector::new().expect("metrics registry")),
    );

    let group = service.create_group("seeded").unwrap();
    for player in &players {
        service.add_group_member(&group.id, &player.id).unwrap();
    }

    (Arc::new(service), group, players)
}
