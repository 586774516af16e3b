use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Reports what was ingested at startup and how the feed cache is doing.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let library = state.library();
    let (hits, misses) = {
        let cache = state.feed_cache()?;
        (cache.hits(), cache.misses())
    };

    Ok(Json(json!({
        "status": if library.post_count() > 0 { "ok" } else { "empty" },
        "sources": library.sources().len(),
        "posts": library.post_count(),
        "rejected": library.rejected_count(),
        "loadedAt": state.loaded_at(),
        "feedCache": { "hits": hits, "misses": misses },
    })))
}

/// Liveness probe that skips the content check.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
