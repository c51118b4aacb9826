//! Repository for the `margenes_categoria` table.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::margen::MargenCategoria;

const COLUMNS: &str = "id, categoria, porcentaje, created_at, updated_at";

/// Provides access to per-category margin percentages.
pub struct MargenRepo;

impl MargenRepo {
    /// List all category margins, ordered by category label.
    pub async fn list(pool: &PgPool) -> Result<Vec<MargenCategoria>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM margenes_categoria ORDER BY categoria ASC");
        sqlx::query_as::<_, MargenCategoria>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert or replace the margin for one category label.
    pub async fn upsert(
        pool: &PgPool,
        categoria: &str,
        porcentaje: Decimal,
    ) -> Result<MargenCategoria, sqlx::Error> {
        let query = format!(
            "INSERT INTO margenes_categoria (categoria, porcentaje) VALUES ($1, $2) \
             ON CONFLICT (categoria) DO UPDATE \
                 SET porcentaje = EXCLUDED.porcentaje, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MargenCategoria>(&query)
            .bind(categoria)
            .bind(porcentaje)
            .fetch_one(pool)
            .await
    }

    /// Delete the margin for a category label. Returns `false` when no row
    /// existed; affected materials revert to the general margin on the next
    /// recompute pass.
    pub async fn delete(pool: &PgPool, categoria: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM margenes_categoria WHERE categoria = $1")
            .bind(categoria)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
