//! Quote routes.
//!
//! Route tree:
//! - `GET  /presupuestos/{id}`             -- quote detail with lines and context
//! - `POST /presupuestos/{id}/transicion`  -- lifecycle state transition
//! - `GET  /presupuestos/{id}/emision/readiness` -- emission readiness checklist
//! - `GET  /presupuestos/{id}/economia`    -- computed economic summary
//! - `POST /presupuestos/{id}/oferta`      -- assemble and emit the offer

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{oferta, presupuestos};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/presupuestos/{id}", get(presupuestos::get_detalle))
        .route(
            "/presupuestos/{id}/transicion",
            post(presupuestos::transicion),
        )
        .route(
            "/presupuestos/{id}/emision/readiness",
            get(presupuestos::emision),
        )
        .route("/presupuestos/{id}/economia", get(presupuestos::economia))
        .route("/presupuestos/{id}/oferta", post(oferta::emitir))
}
