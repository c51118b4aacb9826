//! Offer template models.

use serde::Serialize;
use sqlx::FromRow;

use presup_core::types::{DbId, Timestamp};

/// A row from the `plantillas_oferta` table: a named, versioned structural
/// definition of the offer document. `secciones` is the ordered section list
/// with localized headings, stored as JSON.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlantillaOferta {
    pub id: DbId,
    pub codigo: String,
    pub nombre: String,
    pub version: i32,
    pub secciones: serde_json::Value,
    pub activo: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `plantilla_modulos` table: one default content block of a
/// template.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModuloPlantilla {
    pub id: DbId,
    pub plantilla_id: DbId,
    pub clave: String,
    pub titulo: String,
    pub contenido: String,
    pub habilitado: bool,
    pub orden: i32,
}

impl ModuloPlantilla {
    /// Convert to the core merge shape.
    pub fn into_modulo(self) -> presup_core::modules::Modulo {
        presup_core::modules::Modulo {
            clave: self.clave,
            titulo: self.titulo,
            contenido: self.contenido,
            habilitado: self.habilitado,
            orden: self.orden,
        }
    }
}
