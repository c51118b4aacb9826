//! Repository for the `presupuestos` table and its child collections.

use chrono::Utc;
use sqlx::PgPool;

use presup_core::economics::ResumenEconomico;
use presup_core::types::{DbId, Timestamp};

use crate::models::presupuesto::{
    ContextoPresupuesto, DesplazamientoPresupuesto, LineaPresupuesto, LineasPresupuesto,
    MaterialPresupuesto, Presupuesto, TrabajoPresupuesto,
};

const COLUMNS: &str = "id, codigo, estado, nombre_cliente, fecha, validez_dias, observaciones, \
     iva_porcentaje, base_imponible, total_cliente, iva_importe, total_con_iva, \
     precio_unitario_vehiculo, total_bloque_a, total_bloque_b, total_bloque_c, \
     total_bloque_d, total_bloque_e, total_desplazamientos, version_oferta, \
     fecha_emision_oferta, created_at, updated_at";

const CONTEXTO_COLUMNS: &str = "id, presupuesto_id, num_vehiculos, tipo_vehiculo, \
     plantilla_codigo, textos_comerciales, extras";

/// Provides access to quotes, their line collections, and their context.
pub struct PresupuestoRepo;

impl PresupuestoRepo {
    /// Find a quote by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Presupuesto>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presupuestos WHERE id = $1");
        sqlx::query_as::<_, Presupuesto>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a quote's lifecycle state. Transition validity is checked by
    /// the caller against the state machine before this runs.
    pub async fn update_estado(
        pool: &PgPool,
        id: DbId,
        estado: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE presupuestos SET estado = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(estado)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Force-expire every live quote whose validity window has closed.
    ///
    /// Single batched UPDATE: atomic at the store, idempotent, and safe to
    /// run concurrently with user edits. This is the sweep-only bypass of
    /// the transition table (it may take `borrador` straight to `expirado`).
    pub async fn expire_overdue(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE presupuestos \
             SET estado = 'expirado', updated_at = NOW() \
             WHERE estado IN ('borrador', 'enviado', 'negociacion') \
               AND fecha + make_interval(days => validez_dias) < $1",
        )
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Persist a freshly computed economic summary into the cache columns.
    pub async fn update_totales(
        pool: &PgPool,
        id: DbId,
        resumen: &ResumenEconomico,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE presupuestos SET \
                 base_imponible = $2, iva_importe = $3, total_con_iva = $4, \
                 precio_unitario_vehiculo = $5, total_bloque_a = $6, total_bloque_b = $7, \
                 total_bloque_c = $8, total_bloque_d = $9, total_bloque_e = $10, \
                 total_desplazamientos = $11, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(resumen.base_imponible)
        .bind(resumen.iva_importe)
        .bind(resumen.total_con_iva)
        .bind(resumen.precio_unitario_vehiculo)
        .bind(resumen.totales_bloque.a)
        .bind(resumen.totales_bloque.b)
        .bind(resumen.totales_bloque.c)
        .bind(resumen.totales_bloque.d)
        .bind(resumen.totales_bloque.e)
        .bind(resumen.total_desplazamientos)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record an offer emission: bump the version counter and stamp the
    /// issue date (the quote's offer snapshot).
    pub async fn registrar_emision(
        pool: &PgPool,
        id: DbId,
        version: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE presupuestos \
             SET version_oferta = $2, fecha_emision_oferta = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(version)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Line collections ---------------------------------------------------

    /// Load all four line collections of a quote.
    pub async fn lineas(pool: &PgPool, id: DbId) -> Result<LineasPresupuesto, sqlx::Error> {
        let lineas = sqlx::query_as::<_, LineaPresupuesto>(
            "SELECT id, presupuesto_id, bloque, concepto, cantidad, precio_unitario, subtotal, orden \
             FROM presupuesto_lineas WHERE presupuesto_id = $1 ORDER BY orden ASC, id ASC",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let trabajos = sqlx::query_as::<_, TrabajoPresupuesto>(
            "SELECT id, presupuesto_id, concepto, subtotal \
             FROM presupuesto_trabajos WHERE presupuesto_id = $1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let materiales = sqlx::query_as::<_, MaterialPresupuesto>(
            "SELECT id, presupuesto_id, descripcion, cantidad, precio_unitario, subtotal \
             FROM presupuesto_materiales WHERE presupuesto_id = $1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let desplazamientos = sqlx::query_as::<_, DesplazamientoPresupuesto>(
            "SELECT id, presupuesto_id, descripcion, subtotal \
             FROM presupuesto_desplazamientos WHERE presupuesto_id = $1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(LineasPresupuesto {
            lineas,
            trabajos,
            materiales,
            desplazamientos,
        })
    }

    // -- Context ------------------------------------------------------------

    /// Load a quote's technical context, if any.
    pub async fn contexto(
        pool: &PgPool,
        presupuesto_id: DbId,
    ) -> Result<Option<ContextoPresupuesto>, sqlx::Error> {
        let query =
            format!("SELECT {CONTEXTO_COLUMNS} FROM presupuesto_contextos WHERE presupuesto_id = $1");
        sqlx::query_as::<_, ContextoPresupuesto>(&query)
            .bind(presupuesto_id)
            .fetch_optional(pool)
            .await
    }

    /// Write a quote context's `extras` bag, creating the context row with a
    /// default vehicle count when none exists yet. The caller merges the bag
    /// (read-merge-write); this persists the merged value.
    pub async fn upsert_contexto_extras(
        pool: &PgPool,
        presupuesto_id: DbId,
        extras: &serde_json::Value,
    ) -> Result<ContextoPresupuesto, sqlx::Error> {
        let query = format!(
            "INSERT INTO presupuesto_contextos (presupuesto_id, num_vehiculos, extras) \
             VALUES ($1, 1, $2) \
             ON CONFLICT (presupuesto_id) DO UPDATE SET extras = EXCLUDED.extras \
             RETURNING {CONTEXTO_COLUMNS}"
        );
        sqlx::query_as::<_, ContextoPresupuesto>(&query)
            .bind(presupuesto_id)
            .bind(extras)
            .fetch_one(pool)
            .await
    }
}
