use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use game_core::{
    DisplayOverrides, GameId, GameStore, Resolution, ResolvedDisplayConfig, Resolver,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod page;

use config::{ConfigError, ServerConfig};
use page::Lang;

#[derive(Clone)]
pub struct AppState {
    resolver: Resolver,
    default_lang: Lang,
    site_name: Arc<str>,
}

impl Default for AppState {
    fn default() -> Self {
        let config = ServerConfig::default();
        Self {
            resolver: Resolver::new(Arc::new(GameStore::builtin())),
            default_lang: Lang::En,
            site_name: config.site_name.into(),
        }
    }
}

impl AppState {
    pub fn new(store: GameStore, config: &ServerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            resolver: Resolver::new(Arc::new(store)),
            default_lang: config.lang()?,
            site_name: config.site_name.as_str().into(),
        })
    }

    /// Uses the JSON catalog at `catalog_path` when set, the built-in one otherwise.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let store = match &config.catalog_path {
            Some(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| ConfigError::CatalogRead {
                        path: path.clone(),
                        source,
                    })?;
                GameStore::from_json(&bytes)?
            }
            None => GameStore::builtin(),
        };
        tracing::info!(games = store.len(), "catalog loaded");
        Self::new(store, config)
    }

    pub fn store(&self) -> &GameStore {
        self.resolver.store()
    }
}

/// Every `(lang, game)` page the site can serve, for pre-rendering.
pub fn static_paths(store: &GameStore) -> Vec<(Lang, GameId)> {
    Lang::ALL
        .iter()
        .flat_map(|lang| store.list_ids().iter().map(move |id| (*lang, id.clone())))
        .collect()
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/games", get(list_games))
        .route("/api/games/:game_id", get(get_game))
        .route("/:lang", get(index))
        .route("/:lang/game", get(game_by_query))
        .route("/:lang/game/:game_id", get(game_by_route))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("game not found")]
    GameNotFound { available: Vec<GameId> },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            AppError::GameNotFound { available } => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": message, "available": available })),
            )
                .into_response(),
        }
    }
}

async fn root(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&format!("/{}", state.default_lang.code()))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "games": state.store().len(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn not_found_page(state: &AppState, lang: Lang) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(page::render_not_found(lang, state.store().list_ids())),
    )
        .into_response()
}

async fn index(State(state): State<AppState>, Path(lang): Path<String>) -> impl IntoResponse {
    let Some(lang) = Lang::parse(&lang) else {
        return not_found_page(&state, state.default_lang);
    };
    Html(page::render_index(lang, &state.site_name, state.store())).into_response()
}

async fn game_by_route(
    State(state): State<AppState>,
    Path((lang, game_id)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let overrides: DisplayOverrides = params.into_iter().collect();
    render_game(&state, &lang, Some(&game_id), &overrides)
}

async fn game_by_query(
    State(state): State<AppState>,
    Path(lang): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let overrides: DisplayOverrides = params.into_iter().collect();
    render_game(&state, &lang, None, &overrides)
}

fn render_game(
    state: &AppState,
    lang: &str,
    route_id: Option<&str>,
    overrides: &DisplayOverrides,
) -> Response {
    let Some(lang) = Lang::parse(lang) else {
        tracing::debug!(lang, "unsupported language");
        return not_found_page(state, state.default_lang);
    };
    let Some(game_id) = overrides.requested_id(route_id) else {
        return (StatusCode::BAD_REQUEST, Html(page::render_missing_id(lang))).into_response();
    };

    match state.resolver.resolve(game_id, overrides) {
        Resolution::Found(game) => {
            Html(page::render_game_page(lang, &state.site_name, &game)).into_response()
        }
        Resolution::NotFound => {
            tracing::debug!(game_id, "game not found");
            not_found_page(state, lang)
        }
    }
}

#[derive(Serialize)]
struct GameSummary<'a> {
    id: &'a GameId,
    title: &'a str,
    description: &'a str,
    width: u32,
    height: u32,
}

#[derive(Serialize)]
struct GameListResponse<'a> {
    games: Vec<GameSummary<'a>>,
}

#[derive(Serialize)]
struct GameDetailResponse<'a> {
    id: &'a GameId,
    title: &'a str,
    description: &'a str,
    display: ResolvedDisplayConfig,
}

async fn list_games(State(state): State<AppState>) -> impl IntoResponse {
    let games = state
        .store()
        .iter()
        .map(|(id, record)| GameSummary {
            id,
            title: &record.title,
            description: &record.description,
            width: record.default_width,
            height: record.default_height,
        })
        .collect();
    Json(GameListResponse { games }).into_response()
}

async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let overrides: DisplayOverrides = params.into_iter().collect();
    let Some(game) = state.resolver.resolve(&game_id, &overrides).found() else {
        tracing::debug!(game_id = %game_id, "game not found");
        return Err(AppError::GameNotFound {
            available: state.store().list_ids().to_vec(),
        });
    };

    Ok(Json(GameDetailResponse {
        id: game.id,
        title: &game.record.title,
        description: &game.record.description,
        display: game.display,
    })
    .into_response())
}
