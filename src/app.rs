use crate::config::Config;
use crate::models::{Genre, GenreId, MovieDetails};
use crate::session::{Session, SessionSnapshot};
use crate::tmdb::{CatalogApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub image_base: String,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub image_base: String,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    text: String,
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb: Arc<dyn CatalogApi> = Arc::new(TmdbClient::from_config(&config)?);
    let session = Arc::new(Session::new(tmdb, config.session.clone()));
    session.start().await;

    let state = AppState {
        session,
        image_base: config.image_base.clone(),
    };
    let app = build_router(state);

    info!("Listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(snapshot))
        .route("/genres", get(genres))
        .route("/genres/:id/toggle", post(toggle_genre))
        .route("/search", post(search))
        .route("/scroll/older", post(scroll_older))
        .route("/scroll/newer", post(scroll_newer))
        .route("/movies/:id", get(movie_details))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn respond(state: &AppState) -> Json<SnapshotResponse> {
    Json(SnapshotResponse {
        image_base: state.image_base.clone(),
        snapshot: state.session.snapshot().await,
    })
}

async fn snapshot(State(state): State<AppState>) -> Json<SnapshotResponse> {
    respond(&state).await
}

async fn genres(State(state): State<AppState>) -> Json<Vec<Genre>> {
    Json(state.session.snapshot().await.genres)
}

async fn toggle_genre(
    State(state): State<AppState>,
    Path(id): Path<GenreId>,
) -> Json<SnapshotResponse> {
    state.session.on_genre_toggle(id).await;
    respond(&state).await
}

async fn search(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Json<SnapshotResponse> {
    state.session.on_search_text_change(&body.text).await;
    respond(&state).await
}

async fn scroll_older(State(state): State<AppState>) -> Json<SnapshotResponse> {
    state.session.on_scrolled_to_older_boundary().await;
    respond(&state).await
}

async fn scroll_newer(State(state): State<AppState>) -> Json<SnapshotResponse> {
    state.session.on_scrolled_to_newer_boundary().await;
    respond(&state).await
}

async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MovieDetails>, (StatusCode, Json<Value>)> {
    match state.session.movie_details(&id).await {
        Ok(details) => Ok(Json(details)),
        Err(e) => {
            warn!("Failed to fetch details for movie {}: {}", id, e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
