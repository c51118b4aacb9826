//! Offer template routes.
//!
//! Route tree:
//! - `GET /plantillas/{codigo}/modulos`  -- modules with global overrides applied
//! - `PUT /plantillas/{codigo}/modulos`  -- replace global module overrides
//! - `GET /presupuestos/{id}/modulos`    -- modules fully resolved for a quote
//! - `PUT /presupuestos/{id}/modulos`    -- replace quote-level module overrides

use axum::routing::get;
use axum::Router;

use crate::handlers::plantillas;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/plantillas/{codigo}/modulos",
            get(plantillas::get_global).put(plantillas::put_global),
        )
        .route(
            "/presupuestos/{id}/modulos",
            get(plantillas::get_quote).put(plantillas::put_quote),
        )
}
