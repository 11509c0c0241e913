//! HTTP request handlers

use super::state::AppState;
use crate::aliases::AliasMap;
use crate::results::SearchResult;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query
    #[serde(default)]
    pub q: String,
}

/// Search results response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let results = state.launcher.search(&params.q).await;
    Json(SearchResponse {
        query: params.q,
        results,
    })
}

/// Execute handler; the action runs detached
pub async fn execute(
    State(state): State<AppState>,
    Json(item): Json<SearchResult>,
) -> StatusCode {
    state.launcher.execute(&item);
    StatusCode::ACCEPTED
}

pub async fn get_aliases(State(state): State<AppState>) -> Json<AliasMap> {
    Json(state.launcher.get_alias_map().await)
}

/// Save aliases and reload them in every provider
pub async fn save_aliases(
    State(state): State<AppState>,
    Json(aliases): Json<AliasMap>,
) -> impl IntoResponse {
    let success = state.launcher.save_alias_map(&aliases).await;
    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(serde_json::json!({ "success": success })))
}

pub async fn providers(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.launcher.providers())
}

pub async fn reload_providers(State(state): State<AppState>) -> impl IntoResponse {
    let loaded = state.launcher.reload().await;
    Json(serde_json::json!({ "loaded": loaded }))
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.launcher.stats())
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "providers": state.launcher.registry().len(),
        "sync": state.settings.sync.index_url.is_some()
    }))
}
