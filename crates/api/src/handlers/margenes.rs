//! Handlers for margin configuration and price recomputation.
//!
//! Every margin mutation ends with a recompute pass so stored sale prices
//! never drift from the configured margins.

use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use presup_core::margin::{validate_margin, CONFIG_KEY_MARGEN_GENERAL};
use presup_core::types::DbId;
use presup_core::CoreError;
use presup_db::models::material::SetMargen;
use presup_db::models::margen::MargenCategoria;
use presup_db::repositories::{ConfigRepo, MargenRepo, MaterialRepo};

use crate::error::AppResult;
use crate::pricing;
use crate::response::DataResponse;
use crate::state::AppState;

/// Margin mutation response: the new margin plus how many sale prices moved.
#[derive(Debug, Serialize)]
pub struct MargenActualizado {
    pub porcentaje: Decimal,
    pub materiales_actualizados: u64,
}

// -- General margin ---------------------------------------------------------

/// GET /margenes/general
pub async fn get_general(State(state): State<AppState>) -> AppResult<Json<DataResponse<Value>>> {
    let porcentaje = pricing::load_general_margin(&state.pool).await?;
    Ok(Json(DataResponse::new(json!({ "porcentaje": porcentaje }))))
}

/// PUT /margenes/general
pub async fn set_general(
    State(state): State<AppState>,
    Json(body): Json<SetMargen>,
) -> AppResult<Json<DataResponse<MargenActualizado>>> {
    validate_margin(body.porcentaje)?;
    ConfigRepo::upsert(
        &state.pool,
        CONFIG_KEY_MARGEN_GENERAL,
        &body.porcentaje.to_string(),
    )
    .await?;
    let materiales_actualizados = pricing::recompute_all_prices(&state.pool).await?;
    Ok(Json(DataResponse::new(MargenActualizado {
        porcentaje: body.porcentaje,
        materiales_actualizados,
    })))
}

// -- Category margins -------------------------------------------------------

/// GET /margenes/categorias
pub async fn list_categorias(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<MargenCategoria>>>> {
    let margenes = MargenRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::new(margenes)))
}

/// PUT /margenes/categorias/{nombre}
pub async fn set_categoria(
    State(state): State<AppState>,
    Path(nombre): Path<String>,
    Json(body): Json<SetMargen>,
) -> AppResult<Json<DataResponse<MargenCategoria>>> {
    validate_margin(body.porcentaje)?;
    let margen = MargenRepo::upsert(&state.pool, &nombre, body.porcentaje).await?;
    pricing::recompute_all_prices(&state.pool).await?;
    Ok(Json(DataResponse::new(margen)))
}

/// DELETE /margenes/categorias/{nombre}
///
/// Materials in the category fall back to the general margin; their prices
/// are recomputed immediately.
pub async fn delete_categoria(
    State(state): State<AppState>,
    Path(nombre): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let deleted = MargenRepo::delete(&state.pool, &nombre).await?;
    if !deleted {
        return Err(CoreError::Validation(format!("Unknown margin category: {nombre}")).into());
    }
    let materiales_actualizados = pricing::recompute_all_prices(&state.pool).await?;
    Ok(Json(DataResponse::new(json!({
        "categoria": nombre,
        "materiales_actualizados": materiales_actualizados,
    }))))
}

// -- Per-material margins ---------------------------------------------------

/// POST /materiales/{id}/margen
pub async fn set_margen_material(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SetMargen>,
) -> AppResult<Json<DataResponse<Value>>> {
    validate_margin(body.porcentaje)?;
    let updated =
        MaterialRepo::update_margen_propio(&state.pool, id, Some(body.porcentaje)).await?;
    if !updated {
        return Err(CoreError::NotFound {
            entity: "material",
            id,
        }
        .into());
    }
    let precio_venta = pricing::recompute_one(&state.pool, id).await?;
    Ok(Json(DataResponse::new(json!({
        "id": id,
        "margen_propio": body.porcentaje,
        "precio_venta": precio_venta,
    }))))
}

/// DELETE /materiales/{id}/margen
///
/// Clears the material's own margin so the cascade falls through to its
/// category (or the general margin).
pub async fn clear_margen_material(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let updated = MaterialRepo::update_margen_propio(&state.pool, id, None).await?;
    if !updated {
        return Err(CoreError::NotFound {
            entity: "material",
            id,
        }
        .into());
    }
    let precio_venta = pricing::recompute_one(&state.pool, id).await?;
    Ok(Json(DataResponse::new(json!({
        "id": id,
        "margen_propio": Value::Null,
        "precio_venta": precio_venta,
    }))))
}

// -- Recompute --------------------------------------------------------------

/// POST /materiales/recalcular
pub async fn recalcular_todos(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Value>>> {
    let materiales_actualizados = pricing::recompute_all_prices(&state.pool).await?;
    Ok(Json(DataResponse::new(json!({
        "materiales_actualizados": materiales_actualizados,
    }))))
}

/// POST /materiales/{id}/recalcular
pub async fn recalcular_material(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Value>>> {
    let precio_venta = pricing::recompute_one(&state.pool, id).await?;
    Ok(Json(DataResponse::new(json!({
        "id": id,
        "precio_venta": precio_venta,
    }))))
}
