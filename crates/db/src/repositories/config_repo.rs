//! Repository for the generic `configuracion` key/value store.

use sqlx::PgPool;

/// Typed access lives at the call sites; this store only moves strings.
pub struct ConfigRepo;

impl ConfigRepo {
    /// Read a configuration value by key.
    pub async fn get(pool: &PgPool, clave: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT valor FROM configuracion WHERE clave = $1")
                .bind(clave)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(valor,)| valor))
    }

    /// Insert or replace a configuration value.
    pub async fn upsert(pool: &PgPool, clave: &str, valor: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO configuracion (clave, valor) VALUES ($1, $2) \
             ON CONFLICT (clave) DO UPDATE SET valor = EXCLUDED.valor, updated_at = NOW()",
        )
        .bind(clave)
        .bind(valor)
        .execute(pool)
        .await?;
        Ok(())
    }
}
