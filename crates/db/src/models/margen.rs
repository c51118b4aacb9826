//! Per-category margin models.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use presup_core::types::{DbId, Timestamp};

/// A row from the `margenes_categoria` table. At most one row per category
/// label (unique constraint `uq_margenes_categoria_categoria`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MargenCategoria {
    pub id: DbId,
    pub categoria: String,
    pub porcentaje: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
