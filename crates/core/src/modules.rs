//! Three-layer resolution of offer document content modules.
//!
//! A template ships a default module set; administrators store per-template
//! overrides in the configuration table; each quote may carry its own
//! overrides inside the context `extras` bag. Layers merge field-wise in
//! increasing precedence (defaults < global < quote) and the result is
//! sorted by `orden`.
//!
//! Override parsing fails open: malformed or non-array stored data resolves
//! to "no overrides" so a document can always render. This trades strict
//! validation for availability, deliberately.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Reserved key inside the quote context `extras` bag holding the
/// quote-level override list. Every other key in the bag is opaque and
/// preserved verbatim on writes.
pub const EXTRAS_KEY_MODULOS: &str = "modulos_override";

/// Namespace prefix for per-template global overrides in the config store.
pub const CONFIG_PREFIX_MODULOS: &str = "plantilla.modulos.";

/// Configuration key for a template's global override list.
pub fn overrides_config_key(codigo: &str) -> String {
    format!("{CONFIG_PREFIX_MODULOS}{codigo}")
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// A resolved content module of the offer document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modulo {
    pub clave: String,
    pub titulo: String,
    pub contenido: String,
    pub habilitado: bool,
    pub orden: i32,
}

/// A partial patch for one module, keyed by `clave`. Absent fields pass the
/// underlying value through unchanged. The same shape is used at both the
/// global and the quote layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuloOverride {
    pub clave: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contenido: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habilitado: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orden: Option<i32>,
}

// ---------------------------------------------------------------------------
// Parsing (fail-open)
// ---------------------------------------------------------------------------

/// Parse a serialized global override list. Anything that is not a JSON
/// array of override objects yields an empty list.
pub fn parse_override_list(raw: &str) -> Vec<ModuloOverride> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => overrides_from_value(&value),
        Err(_) => Vec::new(),
    }
}

/// Extract the quote-level override list from a context `extras` bag.
pub fn extract_quote_overrides(extras: &Value) -> Vec<ModuloOverride> {
    match extras.get(EXTRAS_KEY_MODULOS) {
        Some(value) => overrides_from_value(value),
        None => Vec::new(),
    }
}

/// Fail-open conversion: non-arrays and malformed entries are dropped.
fn overrides_from_value(value: &Value) -> Vec<ModuloOverride> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Apply one override layer to a module list, field-wise by `clave`.
/// Overrides whose key matches no module are ignored.
pub fn apply_overrides(mut modulos: Vec<Modulo>, overrides: &[ModuloOverride]) -> Vec<Modulo> {
    for modulo in &mut modulos {
        if let Some(ov) = overrides.iter().find(|o| o.clave == modulo.clave) {
            if let Some(titulo) = &ov.titulo {
                modulo.titulo = titulo.clone();
            }
            if let Some(contenido) = &ov.contenido {
                modulo.contenido = contenido.clone();
            }
            if let Some(habilitado) = ov.habilitado {
                modulo.habilitado = habilitado;
            }
            if let Some(orden) = ov.orden {
                modulo.orden = orden;
            }
        }
    }
    modulos
}

/// Merge the three layers and sort ascending by `orden`.
///
/// Disabled modules stay in the resolved list so administration screens can
/// show them; document rendering filters on `habilitado`. Callers must
/// resolve through both layers on every render -- the merge is never cached
/// across override edits.
pub fn resolve_modules(
    defaults: Vec<Modulo>,
    global: &[ModuloOverride],
    quote: &[ModuloOverride],
) -> Vec<Modulo> {
    let merged = apply_overrides(apply_overrides(defaults, global), quote);
    let mut resolved = merged;
    resolved.sort_by_key(|m| m.orden);
    resolved
}

// ---------------------------------------------------------------------------
// Extras bag persistence helper
// ---------------------------------------------------------------------------

/// Produce the new `extras` bag after saving quote-level overrides.
///
/// Read-merge-write: every unrelated key of the existing bag is preserved
/// verbatim; only the reserved key is replaced. A missing or non-object
/// existing bag starts from an empty object.
pub fn merge_extras(existing: Option<&Value>, overrides: &[ModuloOverride]) -> Value {
    let mut bag = match existing {
        Some(Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };
    bag.insert(
        EXTRAS_KEY_MODULOS.to_string(),
        serde_json::to_value(overrides).unwrap_or(Value::Array(Vec::new())),
    );
    Value::Object(bag)
}
