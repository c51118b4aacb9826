//! Health check routes.
//!
//! Route tree:
//! - `GET /health` -- liveness + database connectivity

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Liveness probe that also verifies the database connection.
async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    presup_db::health_check(&state.pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}
