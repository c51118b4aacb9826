//! Margin configuration routes.
//!
//! Route tree:
//! - `GET    /margenes/general`              -- current general margin
//! - `PUT    /margenes/general`              -- set general margin, recompute prices
//! - `GET    /margenes/categorias`           -- list per-category margins
//! - `PUT    /margenes/categorias/{nombre}`  -- upsert a category margin
//! - `DELETE /margenes/categorias/{nombre}`  -- remove a category margin
//! - `POST   /materiales/recalcular`         -- recompute all sale prices
//! - `POST   /materiales/{id}/recalcular`    -- recompute one sale price
//! - `POST   /materiales/{id}/margen`        -- set a material's own margin
//! - `DELETE /materiales/{id}/margen`        -- clear a material's own margin

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::margenes;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/margenes/general",
            get(margenes::get_general).put(margenes::set_general),
        )
        .route("/margenes/categorias", get(margenes::list_categorias))
        .route(
            "/margenes/categorias/{nombre}",
            put(margenes::set_categoria).delete(margenes::delete_categoria),
        )
        .route("/materiales/recalcular", post(margenes::recalcular_todos))
        .route(
            "/materiales/{id}/recalcular",
            post(margenes::recalcular_material),
        )
        .route(
            "/materiales/{id}/margen",
            post(margenes::set_margen_material).delete(margenes::clear_margen_material),
        )
}
