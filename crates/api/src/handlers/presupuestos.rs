//! Handlers for quote detail, lifecycle transitions, readiness, and
//! economics.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use presup_core::economics::{self, Bloque, EntradaEconomica, LineaEconomica, ResumenEconomico};
use presup_core::emission::{self, ContextoEmision, EmisionSnapshot, ResultadoEmision};
use presup_core::quote_state::{self, EstadoPresupuesto};
use presup_core::types::{DbId, Timestamp};
use presup_core::CoreError;
use presup_db::models::presupuesto::{
    ContextoPresupuesto, LineasPresupuesto, Presupuesto, TransicionRequest,
};
use presup_db::repositories::PresupuestoRepo;
use presup_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Full quote view: the row plus its line collections, context, and the
/// computed validity window.
#[derive(Debug, Serialize)]
pub struct DetallePresupuesto {
    #[serde(flatten)]
    pub presupuesto: Presupuesto,
    pub fecha_expiracion: Timestamp,
    /// Whether the validity window has already closed. The sweep may not
    /// have run yet, so `estado` can lag behind this flag.
    pub vencido: bool,
    pub lineas: LineasPresupuesto,
    pub contexto: Option<ContextoPresupuesto>,
}

impl DetallePresupuesto {
    fn new(
        presupuesto: Presupuesto,
        lineas: LineasPresupuesto,
        contexto: Option<ContextoPresupuesto>,
        now: Timestamp,
    ) -> Self {
        let fecha_expiracion =
            quote_state::expiry_date(presupuesto.fecha, presupuesto.validez_dias);
        let vencido = quote_state::is_expired(presupuesto.fecha, presupuesto.validez_dias, now);
        Self {
            presupuesto,
            fecha_expiracion,
            vencido,
            lineas,
            contexto,
        }
    }
}

// -- Shared loading helpers -------------------------------------------------

/// Load a quote or fail with 404.
pub(crate) async fn load_presupuesto(pool: &DbPool, id: DbId) -> Result<Presupuesto, AppError> {
    let presupuesto = PresupuestoRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "presupuesto",
            id,
        })?;
    Ok(presupuesto)
}

/// Assemble the aggregation input from a quote's persisted pieces.
pub(crate) fn entrada_economica(
    presupuesto: &Presupuesto,
    lineas: &LineasPresupuesto,
    num_vehiculos: i32,
) -> Result<EntradaEconomica, CoreError> {
    let engine_lines = lineas
        .lineas
        .iter()
        .map(|l| {
            Ok(LineaEconomica {
                bloque: Bloque::from_str_value(&l.bloque)?,
                subtotal: l.subtotal,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(EntradaEconomica {
        lineas: engine_lines,
        trabajos: lineas.trabajos.iter().map(|t| t.subtotal).collect(),
        materiales: lineas.materiales.iter().map(|m| m.subtotal).collect(),
        desplazamientos: lineas.desplazamientos.iter().map(|d| d.subtotal).collect(),
        almacenado: presupuesto.totales_almacenados(),
        iva_porcentaje: presupuesto.iva_porcentaje,
        num_vehiculos,
    })
}

/// Compute the economic summary for a quote from fresh line data.
///
/// Without a context there is no vehicle count, so the per-vehicle unit
/// price stays zero rather than degenerating to the full base.
pub(crate) fn resumen_para(
    presupuesto: &Presupuesto,
    lineas: &LineasPresupuesto,
    contexto: Option<&ContextoPresupuesto>,
) -> Result<ResumenEconomico, CoreError> {
    let num_vehiculos = contexto.map(|c| c.num_vehiculos).unwrap_or(0);
    let entrada = entrada_economica(presupuesto, lineas, num_vehiculos)?;
    Ok(economics::compute_economics(&entrada))
}

/// Evaluate the emission readiness checklist for a loaded quote.
pub(crate) fn readiness_para(
    presupuesto: &Presupuesto,
    lineas: &LineasPresupuesto,
    contexto: Option<&ContextoPresupuesto>,
) -> Result<ResultadoEmision, CoreError> {
    let resumen = resumen_para(presupuesto, lineas, contexto)?;
    let estado = EstadoPresupuesto::from_str_value(&presupuesto.estado)?;
    let snapshot = EmisionSnapshot {
        nombre_cliente: presupuesto.nombre_cliente.clone(),
        num_lineas: lineas.total(),
        base_imponible: resumen.base_imponible,
        total_con_iva: resumen.total_con_iva,
        estado,
        contexto: contexto.map(|c| ContextoEmision {
            plantilla_codigo: c.plantilla_codigo.clone(),
            num_vehiculos: c.num_vehiculos,
            tipo_vehiculo: c.tipo_vehiculo.clone(),
            textos_comerciales: c.textos_comerciales.clone(),
        }),
    };
    Ok(emission::check_emission_readiness(&snapshot))
}

// -- Handlers ---------------------------------------------------------------

/// GET /presupuestos/{id}
pub async fn get_detalle(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DetallePresupuesto>>> {
    let presupuesto = load_presupuesto(&state.pool, id).await?;
    let lineas = PresupuestoRepo::lineas(&state.pool, id).await?;
    let contexto = PresupuestoRepo::contexto(&state.pool, id).await?;
    Ok(Json(DataResponse::new(DetallePresupuesto::new(
        presupuesto,
        lineas,
        contexto,
        chrono::Utc::now(),
    ))))
}

/// POST /presupuestos/{id}/transicion
///
/// Validates against the transition table before writing; terminal states
/// never move again through this endpoint.
pub async fn transicion(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<TransicionRequest>,
) -> AppResult<Json<DataResponse<Presupuesto>>> {
    let presupuesto = load_presupuesto(&state.pool, id).await?;
    let from = EstadoPresupuesto::from_str_value(&presupuesto.estado)?;
    let to = EstadoPresupuesto::from_str_value(&body.estado)?;
    quote_state::validate_transition(from, to)?;

    PresupuestoRepo::update_estado(&state.pool, id, to.as_str()).await?;
    tracing::info!(id, from = from.as_str(), to = to.as_str(), "Quote transitioned");

    let actualizado = load_presupuesto(&state.pool, id).await?;
    Ok(Json(DataResponse::new(actualizado)))
}

/// GET /presupuestos/{id}/emision/readiness
pub async fn emision(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ResultadoEmision>>> {
    let presupuesto = load_presupuesto(&state.pool, id).await?;
    let lineas = PresupuestoRepo::lineas(&state.pool, id).await?;
    let contexto = PresupuestoRepo::contexto(&state.pool, id).await?;
    let resultado = readiness_para(&presupuesto, &lineas, contexto.as_ref())?;
    Ok(Json(DataResponse::new(resultado)))
}

/// GET /presupuestos/{id}/economia
///
/// Computes the summary from fresh line data and persists it into the
/// quote's cache columns before responding.
pub async fn economia(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ResumenEconomico>>> {
    let presupuesto = load_presupuesto(&state.pool, id).await?;
    let lineas = PresupuestoRepo::lineas(&state.pool, id).await?;
    let contexto = PresupuestoRepo::contexto(&state.pool, id).await?;
    let resumen = resumen_para(&presupuesto, &lineas, contexto.as_ref())?;
    PresupuestoRepo::update_totales(&state.pool, id, &resumen).await?;
    Ok(Json(DataResponse::new(resumen)))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use presup_core::emission::FallaEmision;
    use presup_db::models::presupuesto::{LineaPresupuesto, TrabajoPresupuesto};

    use super::*;

    fn presupuesto_base() -> Presupuesto {
        Presupuesto {
            id: 1,
            codigo: "PRE-2026-001".to_string(),
            estado: "enviado".to_string(),
            nombre_cliente: Some("Talleres Oca".to_string()),
            fecha: Utc::now(),
            validez_dias: 30,
            observaciones: None,
            iva_porcentaje: dec!(21),
            base_imponible: Decimal::ZERO,
            total_cliente: Decimal::ZERO,
            iva_importe: Decimal::ZERO,
            total_con_iva: Decimal::ZERO,
            precio_unitario_vehiculo: Decimal::ZERO,
            total_bloque_a: Decimal::ZERO,
            total_bloque_b: Decimal::ZERO,
            total_bloque_c: Decimal::ZERO,
            total_bloque_d: Decimal::ZERO,
            total_bloque_e: Decimal::ZERO,
            total_desplazamientos: Decimal::ZERO,
            version_oferta: None,
            fecha_emision_oferta: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lineas_vacias() -> LineasPresupuesto {
        LineasPresupuesto {
            lineas: Vec::new(),
            trabajos: Vec::new(),
            materiales: Vec::new(),
            desplazamientos: Vec::new(),
        }
    }

    fn linea(bloque: &str, subtotal: Decimal) -> LineaPresupuesto {
        LineaPresupuesto {
            id: 0,
            presupuesto_id: 1,
            bloque: bloque.to_string(),
            concepto: "linea".to_string(),
            cantidad: Decimal::ONE,
            precio_unitario: subtotal,
            subtotal,
            orden: 0,
        }
    }

    #[test]
    fn engine_lines_map_into_their_blocks() {
        let presupuesto = presupuesto_base();
        let mut lineas = lineas_vacias();
        lineas.lineas.push(linea("A_SUMINISTRO_EQUIPOS", dec!(100)));
        lineas.lineas.push(linea("C_MANO_OBRA", dec!(250)));

        let resumen = resumen_para(&presupuesto, &lineas, None).unwrap();
        assert_eq!(resumen.totales_bloque.a, dec!(100));
        assert_eq!(resumen.totales_bloque.c, dec!(250));
        assert_eq!(resumen.base_imponible, dec!(350.00));
    }

    #[test]
    fn legacy_trabajos_fall_back_to_block_c() {
        let presupuesto = presupuesto_base();
        let mut lineas = lineas_vacias();
        lineas.trabajos.push(TrabajoPresupuesto {
            id: 0,
            presupuesto_id: 1,
            concepto: "Mano de obra".to_string(),
            subtotal: dec!(480),
        });

        let resumen = resumen_para(&presupuesto, &lineas, None).unwrap();
        assert_eq!(resumen.totales_bloque.c, dec!(480));
    }

    #[test]
    fn unknown_block_tag_is_an_error() {
        let presupuesto = presupuesto_base();
        let mut lineas = lineas_vacias();
        lineas.lineas.push(linea("F_NO_EXISTE", dec!(10)));

        assert!(entrada_economica(&presupuesto, &lineas, 1).is_err());
    }

    #[test]
    fn readiness_flags_empty_quote() {
        let presupuesto = Presupuesto {
            nombre_cliente: None,
            ..presupuesto_base()
        };
        let lineas = lineas_vacias();

        let resultado = readiness_para(&presupuesto, &lineas, None).unwrap();
        assert!(!resultado.listo);
        assert!(resultado.fallas.contains(&FallaEmision::ClienteSinNombre));
        assert!(resultado
            .fallas
            .contains(&FallaEmision::SinLineasEconomicas));
    }

    #[test]
    fn missing_context_yields_zero_unit_price() {
        let presupuesto = presupuesto_base();
        let mut lineas = lineas_vacias();
        lineas.lineas.push(linea("A_SUMINISTRO_EQUIPOS", dec!(1000)));

        let resumen = resumen_para(&presupuesto, &lineas, None).unwrap();
        assert_eq!(resumen.precio_unitario_vehiculo, Decimal::ZERO);

        let contexto = ContextoPresupuesto {
            id: 1,
            presupuesto_id: 1,
            num_vehiculos: 2,
            tipo_vehiculo: None,
            plantilla_codigo: None,
            textos_comerciales: None,
            extras: serde_json::json!({}),
        };
        let resumen = resumen_para(&presupuesto, &lineas, Some(&contexto)).unwrap();
        assert_eq!(resumen.precio_unitario_vehiculo, dec!(500.00));
    }

    #[test]
    fn detail_view_exposes_the_validity_window() {
        let mut presupuesto = presupuesto_base();
        presupuesto.fecha = Utc::now() - chrono::Duration::days(40);
        presupuesto.validez_dias = 30;
        let esperado = presupuesto.fecha + chrono::Duration::days(30);

        let detalle =
            DetallePresupuesto::new(presupuesto, lineas_vacias(), None, Utc::now());
        assert_eq!(detalle.fecha_expiracion, esperado);
        assert!(detalle.vencido);

        let mut presupuesto = presupuesto_base();
        presupuesto.fecha = Utc::now() - chrono::Duration::days(40);
        presupuesto.validez_dias = 60;
        let detalle =
            DetallePresupuesto::new(presupuesto, lineas_vacias(), None, Utc::now());
        assert!(!detalle.vencido);
    }

    #[test]
    fn readiness_passes_for_complete_quote() {
        let presupuesto = presupuesto_base();
        let mut lineas = lineas_vacias();
        lineas.lineas.push(linea("B_MATERIALES_INSTALACION", dec!(1200)));

        let contexto = ContextoPresupuesto {
            id: 1,
            presupuesto_id: 1,
            num_vehiculos: 2,
            tipo_vehiculo: Some("Furgoneta".to_string()),
            plantilla_codigo: Some("ESTANDAR".to_string()),
            textos_comerciales: Some("Condiciones estandar".to_string()),
            extras: serde_json::json!({}),
        };
        let resultado = readiness_para(&presupuesto, &lineas, Some(&contexto)).unwrap();
        assert!(resultado.listo, "unexpected failures: {:?}", resultado.fallas);
    }
}
