//! Catalog material models and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use presup_core::types::{DbId, Timestamp};

/// A row from the `materiales` table. Materials are soft-deleted via
/// `activo`; the recompute pass only touches active rows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Material {
    pub id: DbId,
    pub codigo: String,
    pub nombre: String,
    pub categoria: Option<String>,
    pub coste_medio: Decimal,
    pub precio_estandar: Decimal,
    pub precio_venta: Decimal,
    pub margen_propio: Option<Decimal>,
    pub activo: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for setting a margin percentage (general or per category).
#[derive(Debug, Clone, Deserialize)]
pub struct SetMargen {
    pub porcentaje: Decimal,
}
