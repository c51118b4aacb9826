//! Quote commercial lifecycle state machine.
//!
//! User-initiated transitions must go through [`validate_transition`]. The
//! only sanctioned bypass is the expiry sweep, which force-expires any live
//! quote past its validity window with a single batched UPDATE -- including
//! `borrador`, which has no user-facing edge to `expirado`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Lifecycle state of a quote, stored as a lowercase string in `estado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoPresupuesto {
    Borrador,
    Enviado,
    Negociacion,
    Aceptado,
    Rechazado,
    Expirado,
}

/// All states, for exhaustive table checks.
pub const TODOS_LOS_ESTADOS: &[EstadoPresupuesto] = &[
    EstadoPresupuesto::Borrador,
    EstadoPresupuesto::Enviado,
    EstadoPresupuesto::Negociacion,
    EstadoPresupuesto::Aceptado,
    EstadoPresupuesto::Rechazado,
    EstadoPresupuesto::Expirado,
];

/// States the expiry sweep may force to `expirado`.
pub const ESTADOS_VIVOS: &[EstadoPresupuesto] = &[
    EstadoPresupuesto::Borrador,
    EstadoPresupuesto::Enviado,
    EstadoPresupuesto::Negociacion,
];

impl EstadoPresupuesto {
    /// Database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Borrador => "borrador",
            Self::Enviado => "enviado",
            Self::Negociacion => "negociacion",
            Self::Aceptado => "aceptado",
            Self::Rechazado => "rechazado",
            Self::Expirado => "expirado",
        }
    }

    /// Parse a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "borrador" => Ok(Self::Borrador),
            "enviado" => Ok(Self::Enviado),
            "negociacion" => Ok(Self::Negociacion),
            "aceptado" => Ok(Self::Aceptado),
            "rechazado" => Ok(Self::Rechazado),
            "expirado" => Ok(Self::Expirado),
            _ => Err(CoreError::Validation(format!(
                "Invalid quote state '{s}'"
            ))),
        }
    }

    /// Terminal states have no outbound transitions and lock the quote
    /// against further line-item, context, and override edits.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aceptado | Self::Rechazado | Self::Expirado)
    }

    /// A quote is editable while it has not reached a terminal state.
    pub fn is_editable(&self) -> bool {
        !self.is_terminal()
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Valid user-initiated targets reachable from `from`.
pub fn valid_transitions(from: EstadoPresupuesto) -> &'static [EstadoPresupuesto] {
    use EstadoPresupuesto::*;
    match from {
        Borrador => &[Enviado],
        Enviado => &[Negociacion, Aceptado, Rechazado, Expirado],
        Negociacion => &[Aceptado, Rechazado, Expirado],
        // Terminal states.
        Aceptado | Rechazado | Expirado => &[],
    }
}

/// Check whether a user-initiated transition is valid.
pub fn can_transition(from: EstadoPresupuesto, to: EstadoPresupuesto) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a user-initiated transition, rejecting disallowed ones.
pub fn validate_transition(
    from: EstadoPresupuesto,
    to: EstadoPresupuesto,
) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Invalid transition: {} -> {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// The instant at which a quote's validity window closes.
pub fn expiry_date(fecha: Timestamp, validez_dias: i32) -> Timestamp {
    fecha + Duration::days(i64::from(validez_dias))
}

/// Whether a quote issued at `fecha` with `validez_dias` days of validity
/// is past its window at `now`.
pub fn is_expired(fecha: Timestamp, validez_dias: i32, now: Timestamp) -> bool {
    expiry_date(fecha, validez_dias) < now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use EstadoPresupuesto::*;

    /// The full allowed-transition table from the commercial workflow.
    fn expected_targets(from: EstadoPresupuesto) -> Vec<EstadoPresupuesto> {
        match from {
            Borrador => vec![Enviado],
            Enviado => vec![Negociacion, Aceptado, Rechazado, Expirado],
            Negociacion => vec![Aceptado, Rechazado, Expirado],
            Aceptado | Rechazado | Expirado => vec![],
        }
    }

    #[test]
    fn transition_table_is_complete() {
        // For every (source, target) pair, transition succeeds iff the
        // target is in the allowed set.
        for &from in TODOS_LOS_ESTADOS {
            let expected = expected_targets(from);
            for &to in TODOS_LOS_ESTADOS {
                assert_eq!(
                    can_transition(from, to),
                    expected.contains(&to),
                    "{} -> {}",
                    from.as_str(),
                    to.as_str()
                );
            }
        }
    }

    #[test]
    fn accepted_to_draft_always_fails() {
        let err = validate_transition(Aceptado, Borrador).unwrap_err();
        assert!(err.to_string().contains("aceptado -> borrador"));
    }

    #[test]
    fn terminal_states_have_no_outbound_edges() {
        for &estado in &[Aceptado, Rechazado, Expirado] {
            assert!(estado.is_terminal());
            assert!(valid_transitions(estado).is_empty());
        }
    }

    #[test]
    fn editability_follows_terminality() {
        assert!(Borrador.is_editable());
        assert!(Enviado.is_editable());
        assert!(Negociacion.is_editable());
        assert!(!Aceptado.is_editable());
        assert!(!Rechazado.is_editable());
        assert!(!Expirado.is_editable());
    }

    #[test]
    fn draft_to_expired_is_not_a_user_transition() {
        // The sweep bypasses the table; users may not.
        assert!(!can_transition(Borrador, Expirado));
    }

    #[test]
    fn state_round_trips_through_db_string() {
        for &estado in TODOS_LOS_ESTADOS {
            assert_eq!(
                EstadoPresupuesto::from_str_value(estado.as_str()).unwrap(),
                estado
            );
        }
        assert!(EstadoPresupuesto::from_str_value("pendiente").is_err());
    }

    #[test]
    fn expiry_window_math() {
        let now = Utc::now();
        // Issued 40 days ago, valid for 30 -> expired.
        assert!(is_expired(now - Duration::days(40), 30, now));
        // Issued 40 days ago, valid for 60 -> still live.
        assert!(!is_expired(now - Duration::days(40), 60, now));
        // Boundary: the window closes strictly before now.
        assert!(!is_expired(now, 0, now));
    }
}
