//! Offer payload assembly, content hashing, and document rendering.
//!
//! The payload is the versioned, JSON-serializable structure the offer
//! document is rendered from. Serialization is deterministic -- struct field
//! order plus `BTreeMap` for the open annex map -- so its SHA-256 digest is a
//! stable content identity: any change to line items, overrides, or template
//! selection changes the hash.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::economics::ResumenEconomico;
use crate::error::CoreError;
use crate::modules::Modulo;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Quote header data carried into the offer document.
#[derive(Debug, Clone, Serialize)]
pub struct CabeceraOferta {
    pub codigo_presupuesto: String,
    pub nombre_cliente: Option<String>,
    pub observaciones: Option<String>,
    pub num_vehiculos: Option<i32>,
    pub tipo_vehiculo: Option<String>,
}

/// The complete, hashable offer payload.
#[derive(Debug, Clone, Serialize)]
pub struct OfertaPayload {
    pub codigo_oferta: String,
    pub version_oferta: i32,
    pub fecha_emision: String,
    pub plantilla_codigo: String,
    pub plantilla_version: i32,
    pub cabecera: CabeceraOferta,
    pub resumen: ResumenEconomico,
    /// Enabled modules only, already in render order.
    pub modulos: Vec<Modulo>,
    /// Annex name -> reference. BTreeMap keeps key order stable regardless
    /// of insertion order.
    pub anexos: BTreeMap<String, String>,
}

/// Assemble the offer payload from its resolved parts.
///
/// Filters the module list down to enabled modules; `modulos` is expected
/// pre-sorted by the module resolver.
#[allow(clippy::too_many_arguments)]
pub fn build_offer_payload(
    codigo_oferta: String,
    version_oferta: i32,
    fecha_emision_iso: String,
    plantilla_codigo: String,
    plantilla_version: i32,
    cabecera: CabeceraOferta,
    resumen: ResumenEconomico,
    modulos: Vec<Modulo>,
    anexos: BTreeMap<String, String>,
) -> OfertaPayload {
    OfertaPayload {
        codigo_oferta,
        version_oferta,
        fecha_emision: fecha_emision_iso,
        plantilla_codigo,
        plantilla_version,
        cabecera,
        resumen,
        modulos: modulos.into_iter().filter(|m| m.habilitado).collect(),
        anexos,
    }
}

// ---------------------------------------------------------------------------
// Content hash
// ---------------------------------------------------------------------------

/// SHA-256 hex digest of arbitrary bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Content-identity hash of a payload: SHA-256 over its canonical JSON.
pub fn payload_hash(payload: &OfertaPayload) -> Result<String, CoreError> {
    let bytes = serde_json::to_vec(payload)
        .map_err(|e| CoreError::Internal(format!("Offer payload serialization failed: {e}")))?;
    Ok(sha256_hex(&bytes))
}

// ---------------------------------------------------------------------------
// Document rendering
// ---------------------------------------------------------------------------

/// One section of the template spec: a key selecting what to render and a
/// localized heading.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct SeccionPlantilla {
    pub clave: String,
    pub titulo: String,
}

/// Render the printable HTML document for a payload.
///
/// The template spec's ordered section list drives the layout; sections with
/// an unknown key are skipped so older specs keep rendering. The returned
/// string is complete HTML, ready for the external PDF renderer.
pub fn render_document(payload: &OfertaPayload, secciones: &[SeccionPlantilla]) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Oferta {}</title>\n</head>\n<body>\n",
        escape_html(&payload.codigo_oferta)
    ));

    html.push_str(&format!(
        "<header>\n<h1>Oferta {} (v{})</h1>\n<p>Presupuesto {} &mdash; {}</p>\n<p>Fecha de emision: {}</p>\n</header>\n",
        escape_html(&payload.codigo_oferta),
        payload.version_oferta,
        escape_html(&payload.cabecera.codigo_presupuesto),
        escape_html(payload.cabecera.nombre_cliente.as_deref().unwrap_or("")),
        escape_html(&payload.fecha_emision),
    ));

    for seccion in secciones {
        match seccion.clave.as_str() {
            "modulos" => render_modules(&mut html, &seccion.titulo, payload),
            "economia" => render_economics(&mut html, &seccion.titulo, payload),
            "anexos" => render_annexes(&mut html, &seccion.titulo, payload),
            _ => {}
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_modules(html: &mut String, titulo: &str, payload: &OfertaPayload) {
    html.push_str(&format!("<section>\n<h2>{}</h2>\n", escape_html(titulo)));
    for modulo in &payload.modulos {
        html.push_str(&format!(
            "<article>\n<h3>{}</h3>\n<p>{}</p>\n</article>\n",
            escape_html(&modulo.titulo),
            escape_html(&modulo.contenido),
        ));
    }
    html.push_str("</section>\n");
}

fn render_economics(html: &mut String, titulo: &str, payload: &OfertaPayload) {
    let r = &payload.resumen;
    html.push_str(&format!("<section>\n<h2>{}</h2>\n<table>\n", escape_html(titulo)));
    let filas = [
        ("A. Suministro de equipos", r.totales_bloque.a),
        ("B. Materiales de instalacion", r.totales_bloque.b),
        ("C. Mano de obra", r.totales_bloque.c),
        ("D. Mantenimiento (anos 1-3)", r.totales_bloque.d),
        ("E. Opcionales (anos 4-5)", r.totales_bloque.e),
        ("Desplazamientos", r.total_desplazamientos),
        ("Base imponible", r.base_imponible),
        ("IVA", r.iva_importe),
        ("Total con IVA", r.total_con_iva),
    ];
    for (etiqueta, importe) in filas {
        html.push_str(&format!(
            "<tr><td>{etiqueta}</td><td>{importe}</td></tr>\n"
        ));
    }
    html.push_str("</table>\n</section>\n");
}

fn render_annexes(html: &mut String, titulo: &str, payload: &OfertaPayload) {
    if payload.anexos.is_empty() {
        return;
    }
    html.push_str(&format!("<section>\n<h2>{}</h2>\n<ul>\n", escape_html(titulo)));
    for (nombre, referencia) in &payload.anexos {
        html.push_str(&format!(
            "<li>{}: {}</li>\n",
            escape_html(nombre),
            escape_html(referencia)
        ));
    }
    html.push_str("</ul>\n</section>\n");
}

/// Minimal HTML escaping for text content.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::{compute_economics, Bloque, EntradaEconomica, LineaEconomica, TotalesAlmacenados};
    use rust_decimal_macros::dec;

    fn resumen() -> ResumenEconomico {
        compute_economics(&EntradaEconomica {
            lineas: vec![LineaEconomica {
                bloque: Bloque::ASuministroEquipos,
                subtotal: dec!(1000),
            }],
            trabajos: vec![],
            materiales: vec![],
            desplazamientos: vec![],
            almacenado: TotalesAlmacenados::default(),
            iva_porcentaje: dec!(21),
            num_vehiculos: 2,
        })
    }

    fn modulo(clave: &str, habilitado: bool, orden: i32) -> Modulo {
        Modulo {
            clave: clave.to_string(),
            titulo: format!("Titulo {clave}"),
            contenido: "Texto <con> simbolos & \"comillas\"".to_string(),
            habilitado,
            orden,
        }
    }

    fn payload_with_anexos(anexos: BTreeMap<String, String>) -> OfertaPayload {
        build_offer_payload(
            "PRE-2026-0001-O2".to_string(),
            2,
            "2026-08-30T10:00:00Z".to_string(),
            "ESTANDAR".to_string(),
            3,
            CabeceraOferta {
                codigo_presupuesto: "PRE-2026-0001".to_string(),
                nombre_cliente: Some("Autocares Garcia SL".to_string()),
                observaciones: None,
                num_vehiculos: Some(2),
                tipo_vehiculo: Some("autocar".to_string()),
            },
            resumen(),
            vec![modulo("intro", true, 10), modulo("oculto", false, 20)],
            anexos,
        )
    }

    #[test]
    fn disabled_modules_are_excluded_from_payload() {
        let payload = payload_with_anexos(BTreeMap::new());
        assert_eq!(payload.modulos.len(), 1);
        assert_eq!(payload.modulos[0].clave, "intro");
    }

    #[test]
    fn hash_is_stable_across_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("planos".to_string(), "anexo-1.pdf".to_string());
        a.insert("certificados".to_string(), "anexo-2.pdf".to_string());

        let mut b = BTreeMap::new();
        b.insert("certificados".to_string(), "anexo-2.pdf".to_string());
        b.insert("planos".to_string(), "anexo-1.pdf".to_string());

        let hash_a = payload_hash(&payload_with_anexos(a)).unwrap();
        let hash_b = payload_hash(&payload_with_anexos(b)).unwrap();
        assert_eq!(hash_a, hash_b);
        assert_eq!(hash_a.len(), 64);
    }

    #[test]
    fn any_content_change_changes_the_hash() {
        let base = payload_hash(&payload_with_anexos(BTreeMap::new())).unwrap();

        let mut changed = payload_with_anexos(BTreeMap::new());
        changed.modulos[0].contenido.push('!');
        assert_ne!(base, payload_hash(&changed).unwrap());

        let mut changed = payload_with_anexos(BTreeMap::new());
        changed.plantilla_codigo = "ALTERNATIVA".to_string();
        assert_ne!(base, payload_hash(&changed).unwrap());
    }

    #[test]
    fn document_renders_sections_in_spec_order() {
        let payload = payload_with_anexos(BTreeMap::from([(
            "planos".to_string(),
            "anexo-1.pdf".to_string(),
        )]));
        let secciones = vec![
            SeccionPlantilla {
                clave: "modulos".to_string(),
                titulo: "Alcance de la oferta".to_string(),
            },
            SeccionPlantilla {
                clave: "economia".to_string(),
                titulo: "Resumen economico".to_string(),
            },
            SeccionPlantilla {
                clave: "desconocida".to_string(),
                titulo: "Ignorada".to_string(),
            },
            SeccionPlantilla {
                clave: "anexos".to_string(),
                titulo: "Anexos".to_string(),
            },
        ];
        let html = render_document(&payload, &secciones);

        let pos_modulos = html.find("Alcance de la oferta").unwrap();
        let pos_economia = html.find("Resumen economico").unwrap();
        let pos_anexos = html.find(">Anexos<").unwrap();
        assert!(pos_modulos < pos_economia && pos_economia < pos_anexos);
        assert!(!html.contains("Ignorada"));
        // Disabled module never reaches the document.
        assert!(!html.contains("Titulo oculto"));
        // Content is escaped.
        assert!(html.contains("Texto &lt;con&gt; simbolos &amp; &quot;comillas&quot;"));
    }
}
