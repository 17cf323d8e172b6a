//! HTTP endpoints
//!
//! JSON read API, the finalize endpoint, health checks and the Prometheus
//! scrape endpoint, served with axum.

use crate::error::RankingError;
use crate::metrics;
use crate::service::app::RankingService;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::types::{GameId, GroupId, PlayerId};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// HTTP front end of a [`RankingService`]
pub struct HttpServer {
    config: HttpServerConfig,
    service: Arc<RankingService>,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, service: Arc<RankingService>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            service,
            shutdown_tx,
        }
    }

    /// Bind and serve until [`HttpServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("HTTP server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, router(self.service.clone()))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Ask the running server to finish in-flight requests and exit
    pub fn stop(&self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
    }
}

/// Build the router for a service
pub fn router(service: Arc<RankingService>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/groups", get(groups_handler))
        .route("/groups/{id}", get(group_handler))
        .route("/games/{id}", get(game_handler))
        .route("/games/{id}/finalize", post(finalize_handler))
        .route("/players/{id}", get(player_handler))
        .route("/players/{id}/history", get(history_handler))
        .with_state(service)
}

/// Error response carrying the domain error kind
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self(error)
    }
}

/// Status code for an error surfaced by the service
pub fn status_for(error: &anyhow::Error) -> StatusCode {
    match RankingError::classify(error) {
        Some(
            RankingError::GameNotFound { .. }
            | RankingError::PlayerNotFound { .. }
            | RankingError::GroupNotFound { .. },
        ) => StatusCode::NOT_FOUND,
        Some(RankingError::AlreadyFinished { .. } | RankingError::DuplicateGroupName { .. }) => {
            StatusCode::CONFLICT
        }
        Some(e) if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let kind = RankingError::classify(&self.0).map_or("internal", |e| e.kind());

        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        } else {
            debug!("Request rejected ({}): {}", kind, self.0);
        }

        (
            status,
            Json(json!({
                "error": kind,
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// Body of `POST /games/{id}/finalize`
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub winner_id: PlayerId,
    #[serde(default)]
    pub home_score: Option<i32>,
    #[serde(default)]
    pub away_score: Option<i32>,
}

async fn root_handler(State(service): State<Arc<RankingService>>) -> impl IntoResponse {
    Json(json!({
        "service": service.config().service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/metrics",
            "/leaderboard",
            "/groups",
            "/groups/{id}",
            "/games/{id}",
            "/games/{id}/finalize",
            "/players/{id}",
            "/players/{id}/history"
        ]
    }))
}

async fn health_handler(State(service): State<Arc<RankingService>>) -> Response {
    debug!("Health check requested");

    match HealthCheck::check(&service).await {
        Ok(health) => {
            let status = match health.status {
                HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::OK,
            };
            (status, Json(health)).into_response()
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
                .into_response()
        }
    }
}

async fn metrics_handler(State(service): State<Arc<RankingService>>) -> Response {
    let collector = service.metrics();
    collector.update_uptime();

    match metrics::encode_text(&collector) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics::TEXT_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

async fn leaderboard_handler(
    State(service): State<Arc<RankingService>>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Vec<crate::service::app::LeaderboardEntry>> {
    Ok(Json(service.leaderboard(query.limit)?))
}

async fn groups_handler(
    State(service): State<Arc<RankingService>>,
) -> ApiResult<Vec<crate::types::Group>> {
    Ok(Json(service.list_groups()?))
}

async fn group_handler(
    State(service): State<Arc<RankingService>>,
    Path(id): Path<GroupId>,
) -> ApiResult<crate::service::app::GroupView> {
    Ok(Json(service.group_view(&id)?))
}

async fn game_handler(
    State(service): State<Arc<RankingService>>,
    Path(id): Path<GameId>,
) -> ApiResult<crate::service::app::GameView> {
    Ok(Json(service.game_view(&id)?))
}

async fn finalize_handler(
    State(service): State<Arc<RankingService>>,
    Path(id): Path<GameId>,
    Json(request): Json<FinalizeRequest>,
) -> ApiResult<crate::types::FinalizeReport> {
    let report = service
        .finalize_game(id, request.winner_id, request.home_score, request.away_score)
        .await?;
    Ok(Json(report))
}

async fn player_handler(
    State(service): State<Arc<RankingService>>,
    Path(id): Path<PlayerId>,
) -> ApiResult<crate::service::app::PlayerProfile> {
    Ok(Json(service.player_profile(&id)?))
}

async fn history_handler(
    State(service): State<Arc<RankingService>>,
    Path(id): Path<PlayerId>,
) -> ApiResult<Vec<crate::types::RankChange>> {
    Ok(Json(service.rating_history(&id)?))
}
