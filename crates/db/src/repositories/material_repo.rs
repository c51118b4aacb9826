//! Repository for the `materiales` table.

use rust_decimal::Decimal;
use sqlx::PgPool;

use presup_core::types::DbId;

use crate::models::material::Material;

const COLUMNS: &str = "id, codigo, nombre, categoria, coste_medio, precio_estandar, \
     precio_venta, margen_propio, activo, created_at, updated_at";

/// Provides access to catalog materials. Rows are never deleted, only
/// deactivated (`activo = false`).
pub struct MaterialRepo;

impl MaterialRepo {
    /// Find a material by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Material>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM materiales WHERE id = $1");
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all active materials, the population of a recompute pass.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Material>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM materiales WHERE activo = true ORDER BY codigo ASC");
        sqlx::query_as::<_, Material>(&query).fetch_all(pool).await
    }

    /// Write a single material's sale price. Only `precio_venta` moves;
    /// `coste_medio` and `precio_estandar` are never touched here.
    pub async fn update_precio_venta(
        pool: &PgPool,
        id: DbId,
        precio_venta: Decimal,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE materiales SET precio_venta = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(precio_venta)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear a material's own margin percentage. `None` clears it so
    /// the cascade falls through to the category or general margin.
    pub async fn update_margen_propio(
        pool: &PgPool,
        id: DbId,
        margen_propio: Option<Decimal>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE materiales SET margen_propio = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(margen_propio)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Batch-write sale prices in one statement via parallel arrays.
    /// Returns the number of rows updated.
    pub async fn update_precios_venta(
        pool: &PgPool,
        cambios: &[(DbId, Decimal)],
    ) -> Result<u64, sqlx::Error> {
        if cambios.is_empty() {
            return Ok(0);
        }
        let ids: Vec<DbId> = cambios.iter().map(|(id, _)| *id).collect();
        let precios: Vec<Decimal> = cambios.iter().map(|(_, p)| *p).collect();

        let result = sqlx::query(
            "UPDATE materiales AS m \
             SET precio_venta = c.precio, updated_at = NOW() \
             FROM (SELECT UNNEST($1::bigint[]) AS id, UNNEST($2::numeric[]) AS precio) AS c \
             WHERE m.id = c.id",
        )
        .bind(&ids)
        .bind(&precios)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
