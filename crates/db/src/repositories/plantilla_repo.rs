//! Repository for the `plantillas_oferta` and `plantilla_modulos` tables.

use sqlx::PgPool;

use presup_core::types::DbId;

use crate::models::plantilla::{ModuloPlantilla, PlantillaOferta};

const PLANTILLA_COLUMNS: &str =
    "id, codigo, nombre, version, secciones, activo, created_at, updated_at";

const MODULO_COLUMNS: &str = "id, plantilla_id, clave, titulo, contenido, habilitado, orden";

/// Provides access to offer template specs and their default module sets.
pub struct PlantillaRepo;

impl PlantillaRepo {
    /// Find the active template spec for a code.
    pub async fn find_active_by_codigo(
        pool: &PgPool,
        codigo: &str,
    ) -> Result<Option<PlantillaOferta>, sqlx::Error> {
        let query = format!(
            "SELECT {PLANTILLA_COLUMNS} FROM plantillas_oferta \
             WHERE codigo = $1 AND activo = true"
        );
        sqlx::query_as::<_, PlantillaOferta>(&query)
            .bind(codigo)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a template code, falling open to the configured default code
    /// when the requested one is unknown or inactive. The document must
    /// always render something, so an unknown code is not an error.
    pub async fn resolve(
        pool: &PgPool,
        codigo: &str,
        default_codigo: &str,
    ) -> Result<Option<PlantillaOferta>, sqlx::Error> {
        if let Some(plantilla) = Self::find_active_by_codigo(pool, codigo).await? {
            return Ok(Some(plantilla));
        }
        if codigo != default_codigo {
            tracing::warn!(codigo, default_codigo, "Unknown template code, using default");
            return Self::find_active_by_codigo(pool, default_codigo).await;
        }
        Ok(None)
    }

    /// List a template's default modules in sort order.
    pub async fn modulos(
        pool: &PgPool,
        plantilla_id: DbId,
    ) -> Result<Vec<ModuloPlantilla>, sqlx::Error> {
        let query = format!(
            "SELECT {MODULO_COLUMNS} FROM plantilla_modulos \
             WHERE plantilla_id = $1 ORDER BY orden ASC, clave ASC"
        );
        sqlx::query_as::<_, ModuloPlantilla>(&query)
            .bind(plantilla_id)
            .fetch_all(pool)
            .await
    }
}
