//! Margin cascade and sale-price computation for catalog materials.
//!
//! The effective margin percentage for a material follows strict precedence:
//! individual override -> category margin -> general margin. The resolver is
//! a pure function over pre-loaded data; the api layer owns the recompute
//! orchestration (load margins, resolve, batch-write sale prices).

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::types::round_price;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Configuration key holding the general margin percentage.
pub const CONFIG_KEY_MARGEN_GENERAL: &str = "margen.general";

/// General margin (percent) used when no configuration row exists.
pub fn default_general_margin() -> Decimal {
    Decimal::new(30, 0)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the effective margin percentage for a material.
///
/// Never fails: a missing individual override and a missing category entry
/// simply fall through to the next layer.
pub fn resolve_margin(
    margen_propio: Option<Decimal>,
    categoria: Option<&str>,
    category_margins: &HashMap<String, Decimal>,
    general: Decimal,
) -> Decimal {
    if let Some(propio) = margen_propio {
        return propio;
    }
    if let Some(cat) = categoria {
        if let Some(m) = category_margins.get(cat) {
            return *m;
        }
    }
    general
}

/// Compute the sale price for an average cost and a resolved margin percent.
///
/// `coste_medio * (1 + m/100)`, rounded half-up to 4 decimals.
pub fn sale_price(coste_medio: Decimal, margen: Decimal) -> Decimal {
    round_price(coste_medio * (Decimal::ONE + margen / Decimal::ONE_HUNDRED))
}

/// Validate a margin percentage supplied by an administrator.
///
/// The resolver itself assumes validated input; this runs at the boundary.
pub fn validate_margin(porcentaje: Decimal) -> Result<(), CoreError> {
    if porcentaje.is_sign_negative() {
        return Err(CoreError::Validation(format!(
            "Margin percentage must not be negative, got {porcentaje}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn category_map() -> HashMap<String, Decimal> {
        let mut map = HashMap::new();
        map.insert("Videovigilancia".to_string(), dec!(40));
        map.insert("Comunicaciones".to_string(), dec!(25));
        map
    }

    #[test]
    fn individual_override_wins_over_category_and_general() {
        let m = resolve_margin(
            Some(dec!(55)),
            Some("Videovigilancia"),
            &category_map(),
            dec!(30),
        );
        assert_eq!(m, dec!(55));
    }

    #[test]
    fn category_margin_wins_over_general() {
        let m = resolve_margin(None, Some("Videovigilancia"), &category_map(), dec!(30));
        assert_eq!(m, dec!(40));
    }

    #[test]
    fn unknown_category_falls_through_to_general() {
        let m = resolve_margin(None, Some("Fontaneria"), &category_map(), dec!(30));
        assert_eq!(m, dec!(30));
    }

    #[test]
    fn no_category_falls_through_to_general() {
        let m = resolve_margin(None, None, &category_map(), dec!(30));
        assert_eq!(m, dec!(30));
    }

    #[test]
    fn sale_price_rounds_to_four_decimals() {
        // 10 * 1.40 = 14.0000
        assert_eq!(sale_price(dec!(10), dec!(40)), dec!(14.0000));
        // 3.3333 * 1.30 = 4.33329 -> 4.3333
        assert_eq!(sale_price(dec!(3.3333), dec!(30)), dec!(4.3333));
        // half-up at the 4th decimal: 1.23455 -> 1.2346 (cost 1.23455, margin 0)
        assert_eq!(sale_price(dec!(1.23455), dec!(0)), dec!(1.2346));
    }

    #[test]
    fn category_margin_change_updates_sale_price() {
        // End-to-end example: coste 10, category margin 40% -> 14.0000;
        // after the margin moves to 50% the recomputed price is 15.0000.
        let mut map = category_map();
        let general = default_general_margin();

        let precio = sale_price(
            dec!(10),
            resolve_margin(None, Some("Videovigilancia"), &map, general),
        );
        assert_eq!(precio, dec!(14.0000));

        map.insert("Videovigilancia".to_string(), dec!(50));
        let precio = sale_price(
            dec!(10),
            resolve_margin(None, Some("Videovigilancia"), &map, general),
        );
        assert_eq!(precio, dec!(15.0000));
    }

    #[test]
    fn repeated_recompute_is_idempotent() {
        // Same inputs, same resolved prices on every pass.
        let map = category_map();
        let materials = [
            (dec!(10), None, Some("Videovigilancia")),
            (dec!(7.5), Some(dec!(20)), None),
            (dec!(123.4567), None, None),
        ];
        let pass = || -> Vec<Decimal> {
            materials
                .iter()
                .map(|(coste, propio, cat)| {
                    sale_price(*coste, resolve_margin(*propio, *cat, &map, dec!(30)))
                })
                .collect()
        };
        assert_eq!(pass(), pass());
    }

    #[test]
    fn negative_margin_rejected_at_boundary() {
        assert!(validate_margin(dec!(-5)).is_err());
        assert!(validate_margin(dec!(0)).is_ok());
        assert!(validate_margin(dec!(150)).is_ok());
    }
}
