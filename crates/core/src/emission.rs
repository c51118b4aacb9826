//! Offer emission readiness checklist.
//!
//! Before a quote can be issued as a formal offer document, a checklist is
//! evaluated against a pre-loaded snapshot of the quote. The result is
//! advisory for state transitions but mandatory for issuing the document:
//! the handler refuses to emit while any check fails.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::quote_state::EstadoPresupuesto;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Technical context data relevant to the checklist, when a context exists.
#[derive(Debug, Clone)]
pub struct ContextoEmision {
    pub plantilla_codigo: Option<String>,
    pub num_vehiculos: i32,
    pub tipo_vehiculo: Option<String>,
    pub textos_comerciales: Option<String>,
}

/// Pre-loaded quote data the checklist evaluates. The caller assembles this
/// from the quote row, its line counts, and the computed economics.
#[derive(Debug, Clone)]
pub struct EmisionSnapshot {
    pub nombre_cliente: Option<String>,
    pub num_lineas: usize,
    pub base_imponible: Decimal,
    pub total_con_iva: Decimal,
    pub estado: EstadoPresupuesto,
    pub contexto: Option<ContextoEmision>,
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// A failing readiness check, with a stable machine code for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "check")]
pub enum FallaEmision {
    ClienteSinNombre,
    SinLineasEconomicas,
    BaseNoPositiva,
    TotalNoPositivo,
    ContextoSinPlantilla,
    ContextoSinVehiculos,
    ContextoSinTipoVehiculo,
    ContextoSinTextos,
    EstadoInvalido { estado: String },
}

impl FallaEmision {
    /// Human-readable remediation label.
    pub fn label(&self) -> String {
        match self {
            Self::ClienteSinNombre => "El presupuesto no tiene nombre de cliente".into(),
            Self::SinLineasEconomicas => "El presupuesto no tiene lineas economicas".into(),
            Self::BaseNoPositiva => "La base imponible no es positiva".into(),
            Self::TotalNoPositivo => "El total con IVA no es positivo".into(),
            Self::ContextoSinPlantilla => {
                "El contexto tecnico no tiene solucion/plantilla seleccionada".into()
            }
            Self::ContextoSinVehiculos => {
                "El contexto tecnico no indica numero de vehiculos".into()
            }
            Self::ContextoSinTipoVehiculo => {
                "El contexto tecnico no indica tipo de vehiculo".into()
            }
            Self::ContextoSinTextos => {
                "Faltan los textos comerciales del contexto".into()
            }
            Self::EstadoInvalido { estado } => {
                format!("No se puede emitir una oferta en estado '{estado}'")
            }
        }
    }
}

/// Result of evaluating the emission checklist.
#[derive(Debug, Clone, Serialize)]
pub struct ResultadoEmision {
    pub listo: bool,
    pub fallas: Vec<FallaEmision>,
}

/// Evaluate every check and return the full list of failures.
///
/// Readiness is `true` only when the list is empty; all failing checks are
/// returned at once so the user can remediate in a single pass.
pub fn check_emission_readiness(snapshot: &EmisionSnapshot) -> ResultadoEmision {
    let mut fallas = Vec::new();

    let has_client = snapshot
        .nombre_cliente
        .as_ref()
        .is_some_and(|n| !n.trim().is_empty());
    if !has_client {
        fallas.push(FallaEmision::ClienteSinNombre);
    }

    if snapshot.num_lineas == 0 {
        fallas.push(FallaEmision::SinLineasEconomicas);
    }

    if snapshot.base_imponible <= Decimal::ZERO {
        fallas.push(FallaEmision::BaseNoPositiva);
    }
    if snapshot.total_con_iva <= Decimal::ZERO {
        fallas.push(FallaEmision::TotalNoPositivo);
    }

    if let Some(ctx) = &snapshot.contexto {
        let has_plantilla = ctx
            .plantilla_codigo
            .as_ref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_plantilla {
            fallas.push(FallaEmision::ContextoSinPlantilla);
        }
        if ctx.num_vehiculos <= 0 {
            fallas.push(FallaEmision::ContextoSinVehiculos);
        }
        let has_tipo = ctx
            .tipo_vehiculo
            .as_ref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_tipo {
            fallas.push(FallaEmision::ContextoSinTipoVehiculo);
        }
        let has_textos = ctx
            .textos_comerciales
            .as_ref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_textos {
            fallas.push(FallaEmision::ContextoSinTextos);
        }
    }

    if matches!(
        snapshot.estado,
        EstadoPresupuesto::Rechazado | EstadoPresupuesto::Expirado
    ) {
        fallas.push(FallaEmision::EstadoInvalido {
            estado: snapshot.estado.as_str().to_string(),
        });
    }

    ResultadoEmision {
        listo: fallas.is_empty(),
        fallas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ready_snapshot() -> EmisionSnapshot {
        EmisionSnapshot {
            nombre_cliente: Some("Autocares Garcia SL".to_string()),
            num_lineas: 4,
            base_imponible: dec!(12500.00),
            total_con_iva: dec!(15125.00),
            estado: EstadoPresupuesto::Enviado,
            contexto: Some(ContextoEmision {
                plantilla_codigo: Some("ESTANDAR".to_string()),
                num_vehiculos: 12,
                tipo_vehiculo: Some("autocar".to_string()),
                textos_comerciales: Some("Condiciones de instalacion...".to_string()),
            }),
        }
    }

    #[test]
    fn complete_quote_is_ready() {
        let result = check_emission_readiness(&ready_snapshot());
        assert!(result.listo);
        assert!(result.fallas.is_empty());
    }

    #[test]
    fn quote_without_context_can_still_be_ready() {
        let mut snapshot = ready_snapshot();
        snapshot.contexto = None;
        assert!(check_emission_readiness(&snapshot).listo);
    }

    #[test]
    fn missing_client_name_fails() {
        let mut snapshot = ready_snapshot();
        snapshot.nombre_cliente = Some("   ".to_string());
        let result = check_emission_readiness(&snapshot);
        assert!(!result.listo);
        assert!(result.fallas.contains(&FallaEmision::ClienteSinNombre));
    }

    #[test]
    fn non_positive_totals_fail() {
        let mut snapshot = ready_snapshot();
        snapshot.base_imponible = dec!(0);
        snapshot.total_con_iva = dec!(-1);
        let result = check_emission_readiness(&snapshot);
        assert!(result.fallas.contains(&FallaEmision::BaseNoPositiva));
        assert!(result.fallas.contains(&FallaEmision::TotalNoPositivo));
    }

    #[test]
    fn context_checks_only_apply_when_context_exists() {
        let mut snapshot = ready_snapshot();
        snapshot.contexto = Some(ContextoEmision {
            plantilla_codigo: None,
            num_vehiculos: 0,
            tipo_vehiculo: None,
            textos_comerciales: None,
        });
        let result = check_emission_readiness(&snapshot);
        assert!(result.fallas.contains(&FallaEmision::ContextoSinPlantilla));
        assert!(result.fallas.contains(&FallaEmision::ContextoSinVehiculos));
        assert!(result
            .fallas
            .contains(&FallaEmision::ContextoSinTipoVehiculo));
        assert!(result.fallas.contains(&FallaEmision::ContextoSinTextos));
    }

    #[test]
    fn rejected_and_expired_states_block_emission() {
        for estado in [EstadoPresupuesto::Rechazado, EstadoPresupuesto::Expirado] {
            let mut snapshot = ready_snapshot();
            snapshot.estado = estado;
            let result = check_emission_readiness(&snapshot);
            assert!(!result.listo);
            assert!(result.fallas.iter().any(|f| matches!(
                f,
                FallaEmision::EstadoInvalido { .. }
            )));
        }
    }

    #[test]
    fn all_failures_are_reported_together() {
        let snapshot = EmisionSnapshot {
            nombre_cliente: None,
            num_lineas: 0,
            base_imponible: dec!(0),
            total_con_iva: dec!(0),
            estado: EstadoPresupuesto::Expirado,
            contexto: None,
        };
        let result = check_emission_readiness(&snapshot);
        assert_eq!(result.fallas.len(), 5);
    }
}
