//! Quote ("presupuesto") models and request DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use presup_core::economics::TotalesAlmacenados;
use presup_core::types::{DbId, Timestamp};

/// A row from the `presupuestos` table.
///
/// The total columns are a cache of the last computed economics: always
/// derivable from the line collections, never hand-edited independently of
/// them. `version_oferta` / `fecha_emision_oferta` capture the last issued
/// offer (zero-or-one snapshot).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Presupuesto {
    pub id: DbId,
    pub codigo: String,
    pub estado: String,
    pub nombre_cliente: Option<String>,
    pub fecha: Timestamp,
    pub validez_dias: i32,
    pub observaciones: Option<String>,
    pub iva_porcentaje: Decimal,
    pub base_imponible: Decimal,
    pub total_cliente: Decimal,
    pub iva_importe: Decimal,
    pub total_con_iva: Decimal,
    pub precio_unitario_vehiculo: Decimal,
    pub total_bloque_a: Decimal,
    pub total_bloque_b: Decimal,
    pub total_bloque_c: Decimal,
    pub total_bloque_d: Decimal,
    pub total_bloque_e: Decimal,
    pub total_desplazamientos: Decimal,
    pub version_oferta: Option<i32>,
    pub fecha_emision_oferta: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Presupuesto {
    /// The stored totals, as the aggregation core consumes them.
    pub fn totales_almacenados(&self) -> TotalesAlmacenados {
        TotalesAlmacenados {
            base_imponible: self.base_imponible,
            total_cliente: self.total_cliente,
            iva_importe: self.iva_importe,
            total_con_iva: self.total_con_iva,
            precio_unitario_vehiculo: self.precio_unitario_vehiculo,
            bloque_a: self.total_bloque_a,
            bloque_b: self.total_bloque_b,
            bloque_c: self.total_bloque_c,
            bloque_d: self.total_bloque_d,
            bloque_e: self.total_bloque_e,
            desplazamientos: self.total_desplazamientos,
        }
    }
}

/// A row from the `presupuesto_contextos` table (zero-or-one per quote).
/// `extras` is an open JSON bag; the reserved key for quote-level module
/// overrides lives inside it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContextoPresupuesto {
    pub id: DbId,
    pub presupuesto_id: DbId,
    pub num_vehiculos: i32,
    pub tipo_vehiculo: Option<String>,
    pub plantilla_codigo: Option<String>,
    pub textos_comerciales: Option<String>,
    pub extras: serde_json::Value,
}

/// An engine-generated line from `presupuesto_lineas`, tagged with a block.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LineaPresupuesto {
    pub id: DbId,
    pub presupuesto_id: DbId,
    pub bloque: String,
    pub concepto: String,
    pub cantidad: Decimal,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
    pub orden: i32,
}

/// A legacy trade-work line from `presupuesto_trabajos`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrabajoPresupuesto {
    pub id: DbId,
    pub presupuesto_id: DbId,
    pub concepto: String,
    pub subtotal: Decimal,
}

/// A legacy material line from `presupuesto_materiales`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaterialPresupuesto {
    pub id: DbId,
    pub presupuesto_id: DbId,
    pub descripcion: String,
    pub cantidad: Decimal,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
}

/// A displacement/travel line from `presupuesto_desplazamientos`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DesplazamientoPresupuesto {
    pub id: DbId,
    pub presupuesto_id: DbId,
    pub descripcion: String,
    pub subtotal: Decimal,
}

/// All line collections of a quote, loaded together for aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct LineasPresupuesto {
    pub lineas: Vec<LineaPresupuesto>,
    pub trabajos: Vec<TrabajoPresupuesto>,
    pub materiales: Vec<MaterialPresupuesto>,
    pub desplazamientos: Vec<DesplazamientoPresupuesto>,
}

impl LineasPresupuesto {
    /// Total number of economic lines across all collections.
    pub fn total(&self) -> usize {
        self.lineas.len() + self.trabajos.len() + self.materiales.len()
            + self.desplazamientos.len()
    }
}

/// DTO for a state transition request.
#[derive(Debug, Clone, Deserialize)]
pub struct TransicionRequest {
    pub estado: String,
}

/// DTO for issuing an offer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmitirOfertaRequest {
    /// Annex name -> reference, carried verbatim into the payload.
    #[serde(default)]
    pub anexos: std::collections::BTreeMap<String, String>,
    /// Skip the external PDF renderer even when one is configured.
    #[serde(default)]
    pub sin_pdf: bool,
}
