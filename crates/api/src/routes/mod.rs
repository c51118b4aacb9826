//! Route definitions, grouped per feature area.
//!
//! Each submodule exposes a `router()` returning a `Router<AppState>`;
//! [`api_routes`] assembles them under the `/api/v1` prefix.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod margenes;
pub mod plantillas;
pub mod presupuestos;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(margenes::router())
        .merge(presupuestos::router())
        .merge(plantillas::router())
}
