//! Handlers for offer template modules and their override layers.
//!
//! Resolution is layered on every read: template defaults, then global
//! overrides from configuration, then quote overrides from the context's
//! `extras` bag. Nothing is cached across override edits.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use presup_core::modules::{
    self, extract_quote_overrides, parse_override_list, resolve_modules, Modulo, ModuloOverride,
};
use presup_core::quote_state::EstadoPresupuesto;
use presup_core::types::DbId;
use presup_core::CoreError;
use presup_db::models::plantilla::PlantillaOferta;
use presup_db::repositories::{ConfigRepo, PlantillaRepo, PresupuestoRepo};
use presup_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::handlers::presupuestos::load_presupuesto;
use crate::response::DataResponse;
use crate::state::AppState;

/// Resolved module list plus the template it came from.
#[derive(Debug, Serialize)]
pub struct ModulosResueltos {
    pub plantilla_codigo: String,
    pub plantilla_version: i32,
    pub modulos: Vec<Modulo>,
}

// -- Shared resolution helpers ----------------------------------------------

/// Resolve the template for a code, falling open to the configured default.
/// A missing default template is a hard error; seed data guarantees one.
pub(crate) async fn load_plantilla(
    pool: &DbPool,
    codigo: &str,
    default_codigo: &str,
) -> Result<PlantillaOferta, AppError> {
    PlantillaRepo::resolve(pool, codigo, default_codigo)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!("Default offer template '{default_codigo}' missing"))
        })
}

/// Strict lookup for template writes. Reads fail open to the default so a
/// document always renders; a write that fell open would retarget another
/// template's override set, so here an unknown code is rejected instead.
pub(crate) fn require_plantilla(
    plantilla: Option<PlantillaOferta>,
    codigo: &str,
) -> Result<PlantillaOferta, AppError> {
    plantilla.ok_or_else(|| {
        CoreError::Validation(format!("Unknown template code '{codigo}'")).into()
    })
}

/// Load the global override list for a template code. Malformed or missing
/// configuration yields an empty list (fail open).
pub(crate) async fn load_global_overrides(
    pool: &DbPool,
    codigo: &str,
) -> Result<Vec<ModuloOverride>, sqlx::Error> {
    let key = modules::overrides_config_key(codigo);
    Ok(match ConfigRepo::get(pool, &key).await? {
        Some(raw) => parse_override_list(&raw),
        None => Vec::new(),
    })
}

/// Resolve a template's modules through the default + global layers.
pub(crate) async fn resolve_global(
    pool: &DbPool,
    plantilla: &PlantillaOferta,
    quote_overrides: &[ModuloOverride],
) -> Result<Vec<Modulo>, AppError> {
    let defaults = PlantillaRepo::modulos(pool, plantilla.id)
        .await?
        .into_iter()
        .map(|m| m.into_modulo())
        .collect();
    let global = load_global_overrides(pool, &plantilla.codigo).await?;
    Ok(resolve_modules(defaults, &global, quote_overrides))
}

// -- Global layer -----------------------------------------------------------

/// GET /plantillas/{codigo}/modulos
pub async fn get_global(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
) -> AppResult<Json<DataResponse<ModulosResueltos>>> {
    let default_codigo = &state.config.default_template_code;
    let plantilla = load_plantilla(&state.pool, &codigo, default_codigo).await?;
    let modulos = resolve_global(&state.pool, &plantilla, &[]).await?;
    Ok(Json(DataResponse::new(ModulosResueltos {
        plantilla_codigo: plantilla.codigo,
        plantilla_version: plantilla.version,
        modulos,
    })))
}

/// PUT /plantillas/{codigo}/modulos
///
/// Replaces the global override list for a template wholesale.
pub async fn put_global(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
    Json(overrides): Json<Vec<ModuloOverride>>,
) -> AppResult<Json<DataResponse<ModulosResueltos>>> {
    validate_overrides(&overrides)?;

    let plantilla = PlantillaRepo::find_active_by_codigo(&state.pool, &codigo).await?;
    let plantilla = require_plantilla(plantilla, &codigo)?;
    let key = modules::overrides_config_key(&plantilla.codigo);
    let raw = serde_json::to_string(&overrides)
        .map_err(|e| AppError::InternalError(format!("Override serialization failed: {e}")))?;
    ConfigRepo::upsert(&state.pool, &key, &raw).await?;

    let modulos = resolve_global(&state.pool, &plantilla, &[]).await?;
    Ok(Json(DataResponse::new(ModulosResueltos {
        plantilla_codigo: plantilla.codigo,
        plantilla_version: plantilla.version,
        modulos,
    })))
}

// -- Quote layer ------------------------------------------------------------

/// GET /presupuestos/{id}/modulos
pub async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ModulosResueltos>>> {
    let presupuesto = load_presupuesto(&state.pool, id).await?;
    let contexto = PresupuestoRepo::contexto(&state.pool, presupuesto.id).await?;

    let default_codigo = &state.config.default_template_code;
    let codigo = contexto
        .as_ref()
        .and_then(|c| c.plantilla_codigo.as_deref())
        .unwrap_or(default_codigo);
    let plantilla = load_plantilla(&state.pool, codigo, default_codigo).await?;

    let quote_overrides = contexto
        .as_ref()
        .map(|c| extract_quote_overrides(&c.extras))
        .unwrap_or_default();
    let modulos = resolve_global(&state.pool, &plantilla, &quote_overrides).await?;

    Ok(Json(DataResponse::new(ModulosResueltos {
        plantilla_codigo: plantilla.codigo,
        plantilla_version: plantilla.version,
        modulos,
    })))
}

/// PUT /presupuestos/{id}/modulos
///
/// Replaces the quote-level override list. Rejected on terminal quotes:
/// their issued documents must stay reproducible.
pub async fn put_quote(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(overrides): Json<Vec<ModuloOverride>>,
) -> AppResult<Json<DataResponse<ModulosResueltos>>> {
    validate_overrides(&overrides)?;

    let presupuesto = load_presupuesto(&state.pool, id).await?;
    let estado = EstadoPresupuesto::from_str_value(&presupuesto.estado)?;
    if estado.is_terminal() {
        return Err(CoreError::Conflict(format!(
            "Quote {id} is in terminal state '{}'",
            estado.as_str()
        ))
        .into());
    }

    let contexto = PresupuestoRepo::contexto(&state.pool, id).await?;
    let extras = modules::merge_extras(contexto.as_ref().map(|c| &c.extras), &overrides);
    let contexto = PresupuestoRepo::upsert_contexto_extras(&state.pool, id, &extras).await?;

    let default_codigo = &state.config.default_template_code;
    let codigo = contexto.plantilla_codigo.as_deref().unwrap_or(default_codigo);
    let plantilla = load_plantilla(&state.pool, codigo, default_codigo).await?;
    let modulos = resolve_global(&state.pool, &plantilla, &overrides).await?;

    Ok(Json(DataResponse::new(ModulosResueltos {
        plantilla_codigo: plantilla.codigo,
        plantilla_version: plantilla.version,
        modulos,
    })))
}

/// Reject overrides with an empty module key; everything else is tolerated.
fn validate_overrides(overrides: &[ModuloOverride]) -> Result<(), CoreError> {
    if overrides.iter().any(|o| o.clave.trim().is_empty()) {
        return Err(CoreError::Validation(
            "Module override with empty 'clave'".to_string(),
        ));
    }
    Ok(())
}
