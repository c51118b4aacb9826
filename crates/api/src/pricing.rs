//! Sale price recomputation.
//!
//! Resolves the effective margin for each material through the cascade
//! (own margin, category margin, general margin) and persists any sale
//! prices that changed. Called after every margin mutation so stored
//! prices never drift from the configured margins.

use std::collections::HashMap;

use rust_decimal::Decimal;

use presup_core::margin::{
    default_general_margin, resolve_margin, sale_price, CONFIG_KEY_MARGEN_GENERAL,
};
use presup_core::types::DbId;
use presup_core::CoreError;
use presup_db::repositories::{ConfigRepo, MargenRepo, MaterialRepo};
use presup_db::DbPool;

use crate::error::AppError;

/// Load the general margin from configuration, falling back to the
/// built-in default when the key is missing or unparseable.
pub async fn load_general_margin(pool: &DbPool) -> Result<Decimal, sqlx::Error> {
    let margin = match ConfigRepo::get(pool, CONFIG_KEY_MARGEN_GENERAL).await? {
        Some(valor) => match valor.trim().parse::<Decimal>() {
            Ok(m) => m,
            Err(_) => {
                tracing::warn!(
                    %valor,
                    "Unparseable general margin in configuration, using default"
                );
                default_general_margin()
            }
        },
        None => default_general_margin(),
    };
    Ok(margin)
}

/// Load the per-category margin map.
pub async fn load_category_margins(
    pool: &DbPool,
) -> Result<HashMap<String, Decimal>, sqlx::Error> {
    let rows = MargenRepo::list(pool).await?;
    Ok(rows
        .into_iter()
        .map(|m| (m.categoria, m.porcentaje))
        .collect())
}

/// Recompute sale prices for all active materials.
///
/// Only materials whose price actually changed are written back, in a
/// single batched update. Returns the number of updated materials.
pub async fn recompute_all_prices(pool: &DbPool) -> Result<u64, sqlx::Error> {
    let general = load_general_margin(pool).await?;
    let categories = load_category_margins(pool).await?;
    let materials = MaterialRepo::list_active(pool).await?;

    let mut changed: Vec<(DbId, Decimal)> = Vec::new();
    for material in &materials {
        let margin = resolve_margin(
            material.margen_propio,
            material.categoria.as_deref(),
            &categories,
            general,
        );
        let nuevo = sale_price(material.coste_medio, margin);
        if nuevo != material.precio_venta {
            changed.push((material.id, nuevo));
        }
    }

    if changed.is_empty() {
        return Ok(0);
    }

    let updated = MaterialRepo::update_precios_venta(pool, &changed).await?;
    tracing::info!(updated, "Recomputed material sale prices");
    Ok(updated)
}

/// Recompute the sale price of a single material.
pub async fn recompute_one(pool: &DbPool, id: DbId) -> Result<Decimal, AppError> {
    let material = MaterialRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "material",
            id,
        })?;

    let general = load_general_margin(pool).await?;
    let categories = load_category_margins(pool).await?;

    let margin = resolve_margin(
        material.margen_propio,
        material.categoria.as_deref(),
        &categories,
        general,
    );
    let nuevo = sale_price(material.coste_medio, margin);
    if nuevo != material.precio_venta {
        MaterialRepo::update_precio_venta(pool, id, nuevo).await?;
    }
    Ok(nuevo)
}
