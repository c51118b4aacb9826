//! Offer emission: readiness gate, payload assembly, content hash, document
//! rendering, and the emission record.

use axum::extract::{Path, State};
use axum::Json;
use base64::Engine as _;
use chrono::Utc;
use serde::Serialize;

use presup_core::modules::extract_quote_overrides;
use presup_core::offer::{self, CabeceraOferta, OfertaPayload, SeccionPlantilla};
use presup_core::types::DbId;
use presup_core::CoreError;
use presup_db::models::presupuesto::EmitirOfertaRequest;
use presup_db::repositories::PresupuestoRepo;

use crate::error::AppResult;
use crate::handlers::plantillas::{load_plantilla, resolve_global};
use crate::handlers::presupuestos::{load_presupuesto, readiness_para, resumen_para};
use crate::render;
use crate::response::DataResponse;
use crate::state::AppState;

/// The emitted offer: payload, its content hash, and the rendered document.
#[derive(Debug, Serialize)]
pub struct OfertaEmitida {
    pub payload: OfertaPayload,
    pub hash: String,
    pub html: String,
    /// Base64-encoded PDF when an external renderer is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
}

/// POST /presupuestos/{id}/oferta
///
/// Emission is all-or-nothing: every readiness check must pass before any
/// state is touched. Re-emitting the same quote bumps the offer version.
pub async fn emitir(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<EmitirOfertaRequest>,
) -> AppResult<Json<DataResponse<OfertaEmitida>>> {
    let presupuesto = load_presupuesto(&state.pool, id).await?;
    let lineas = PresupuestoRepo::lineas(&state.pool, id).await?;
    let contexto = PresupuestoRepo::contexto(&state.pool, id).await?;

    // Readiness gate.
    let resultado = readiness_para(&presupuesto, &lineas, contexto.as_ref())?;
    if !resultado.listo {
        let labels: Vec<String> = resultado.fallas.iter().map(|f| f.label()).collect();
        return Err(CoreError::Validation(format!(
            "Quote {id} is not ready for emission: {}",
            labels.join("; ")
        ))
        .into());
    }

    // Economics, recomputed fresh and persisted alongside the emission.
    let resumen = resumen_para(&presupuesto, &lineas, contexto.as_ref())?;
    PresupuestoRepo::update_totales(&state.pool, id, &resumen).await?;

    // Template and module resolution.
    let default_codigo = &state.config.default_template_code;
    let codigo_plantilla = contexto
        .as_ref()
        .and_then(|c| c.plantilla_codigo.as_deref())
        .unwrap_or(default_codigo);
    let plantilla = load_plantilla(&state.pool, codigo_plantilla, default_codigo).await?;
    let quote_overrides = contexto
        .as_ref()
        .map(|c| extract_quote_overrides(&c.extras))
        .unwrap_or_default();
    let modulos = resolve_global(&state.pool, &plantilla, &quote_overrides).await?;

    // Payload assembly.
    let version = presupuesto.version_oferta.unwrap_or(0) + 1;
    let codigo_oferta = format!("{}-O{version}", presupuesto.codigo);
    let cabecera = CabeceraOferta {
        codigo_presupuesto: presupuesto.codigo.clone(),
        nombre_cliente: presupuesto.nombre_cliente.clone(),
        observaciones: presupuesto.observaciones.clone(),
        num_vehiculos: contexto.as_ref().map(|c| c.num_vehiculos),
        tipo_vehiculo: contexto.as_ref().and_then(|c| c.tipo_vehiculo.clone()),
    };
    let payload = offer::build_offer_payload(
        codigo_oferta,
        version,
        Utc::now().to_rfc3339(),
        plantilla.codigo.clone(),
        plantilla.version,
        cabecera,
        resumen,
        modulos,
        body.anexos,
    );
    let hash = offer::payload_hash(&payload)?;

    // Document rendering, driven by the template's section list.
    let secciones: Vec<SeccionPlantilla> =
        serde_json::from_value(plantilla.secciones.clone()).unwrap_or_default();
    let html = offer::render_document(&payload, &secciones);

    let pdf_base64 = match (&state.config.renderer_url, body.sin_pdf) {
        (Some(url), false) => {
            let pdf = render::render_pdf(&state.http, url, &html).await?;
            tracing::info!(id, bytes = pdf.len(), "Offer PDF rendered");
            Some(base64::engine::general_purpose::STANDARD.encode(pdf))
        }
        _ => None,
    };

    PresupuestoRepo::registrar_emision(&state.pool, id, version).await?;
    tracing::info!(id, version, %hash, "Offer emitted");

    Ok(Json(DataResponse::new(OfertaEmitida {
        payload,
        hash,
        html,
        pdf_base64,
    })))
}
