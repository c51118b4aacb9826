//! Economic aggregation for a quote's heterogeneous line collections.
//!
//! Two generations of data coexist: the newer "engine" lines, each tagged
//! with an economic block, and three legacy collections (trade-work lines,
//! material lines, displacement lines). When any engine lines exist they are
//! the sole source for the five canonical block totals; the legacy
//! collections are a fallback only.
//!
//! Every derived figure honours a stored override: a non-zero value already
//! persisted on the quote wins over the freshly summed one, so manual total
//! adjustments survive unrelated recalculation triggers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::round_money;

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Economic block tag for a quote line.
///
/// Five canonical blocks plus `Desplazamiento`, which is excluded from the
/// canonical five-block summary but included in the taxable base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bloque {
    #[serde(rename = "A_SUMINISTRO_EQUIPOS")]
    ASuministroEquipos,
    #[serde(rename = "B_MATERIALES_INSTALACION")]
    BMaterialesInstalacion,
    #[serde(rename = "C_MANO_OBRA")]
    CManoObra,
    #[serde(rename = "D_MANTENIMIENTO_1_3")]
    DMantenimiento1a3,
    #[serde(rename = "E_OPCIONALES_4_5")]
    EOpcionales4y5,
    #[serde(rename = "DESPLAZAMIENTO")]
    Desplazamiento,
}

/// The five canonical blocks, in reporting order.
pub const BLOQUES_CANONICOS: [Bloque; 5] = [
    Bloque::ASuministroEquipos,
    Bloque::BMaterialesInstalacion,
    Bloque::CManoObra,
    Bloque::DMantenimiento1a3,
    Bloque::EOpcionales4y5,
];

impl Bloque {
    /// Database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ASuministroEquipos => "A_SUMINISTRO_EQUIPOS",
            Self::BMaterialesInstalacion => "B_MATERIALES_INSTALACION",
            Self::CManoObra => "C_MANO_OBRA",
            Self::DMantenimiento1a3 => "D_MANTENIMIENTO_1_3",
            Self::EOpcionales4y5 => "E_OPCIONALES_4_5",
            Self::Desplazamiento => "DESPLAZAMIENTO",
        }
    }

    /// Parse a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "A_SUMINISTRO_EQUIPOS" => Ok(Self::ASuministroEquipos),
            "B_MATERIALES_INSTALACION" => Ok(Self::BMaterialesInstalacion),
            "C_MANO_OBRA" => Ok(Self::CManoObra),
            "D_MANTENIMIENTO_1_3" => Ok(Self::DMantenimiento1a3),
            "E_OPCIONALES_4_5" => Ok(Self::EOpcionales4y5),
            "DESPLAZAMIENTO" => Ok(Self::Desplazamiento),
            _ => Err(CoreError::Validation(format!("Invalid block '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// An engine line reduced to what aggregation needs: its block tag and its
/// precomputed subtotal (unit price x quantity).
#[derive(Debug, Clone)]
pub struct LineaEconomica {
    pub bloque: Bloque,
    pub subtotal: Decimal,
}

/// Totals already persisted on the quote row. Zero means "not stored".
#[derive(Debug, Clone, Default)]
pub struct TotalesAlmacenados {
    pub base_imponible: Decimal,
    /// Legacy client-facing grand total, second in the base fallback chain.
    pub total_cliente: Decimal,
    pub iva_importe: Decimal,
    pub total_con_iva: Decimal,
    pub precio_unitario_vehiculo: Decimal,
    pub bloque_a: Decimal,
    pub bloque_b: Decimal,
    pub bloque_c: Decimal,
    pub bloque_d: Decimal,
    pub bloque_e: Decimal,
    pub desplazamientos: Decimal,
}

/// Everything aggregation consumes, loaded fresh by the caller.
#[derive(Debug, Clone)]
pub struct EntradaEconomica {
    /// Engine lines. When non-empty, the sole source for block totals.
    pub lineas: Vec<LineaEconomica>,
    /// Legacy trade-work subtotals; fallback source for block C (labor).
    pub trabajos: Vec<Decimal>,
    /// Legacy material subtotals; fallback source for block B.
    pub materiales: Vec<Decimal>,
    /// Displacement/travel subtotals (always their own collection).
    pub desplazamientos: Vec<Decimal>,
    pub almacenado: TotalesAlmacenados,
    pub iva_porcentaje: Decimal,
    pub num_vehiculos: i32,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Per-block totals, keyed by the short block letter in API payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalesBloque {
    #[serde(rename = "A")]
    pub a: Decimal,
    #[serde(rename = "B")]
    pub b: Decimal,
    #[serde(rename = "C")]
    pub c: Decimal,
    #[serde(rename = "D")]
    pub d: Decimal,
    #[serde(rename = "E")]
    pub e: Decimal,
}

/// Normalized economic summary for a quote. Deterministic: identical inputs
/// produce an identical summary, byte for byte once serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumenEconomico {
    pub base_imponible: Decimal,
    pub iva_porcentaje: Decimal,
    pub iva_importe: Decimal,
    pub total_con_iva: Decimal,
    pub precio_unitario_vehiculo: Decimal,
    pub totales_bloque: TotalesBloque,
    pub total_desplazamientos: Decimal,
    pub total_opcionales: Decimal,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Prefer a stored value over a freshly computed one when it is positive.
///
/// The fallback chain "stored else derived" recurs for every figure in the
/// summary; partially-populated legacy records derive what they lack.
pub fn prefer_stored(stored: Decimal, computed: Decimal) -> Decimal {
    if stored > Decimal::ZERO {
        stored
    } else {
        computed
    }
}

fn sum(values: &[Decimal]) -> Decimal {
    values.iter().copied().sum()
}

/// Compute the normalized economic summary for a quote.
pub fn compute_economics(entrada: &EntradaEconomica) -> ResumenEconomico {
    let alm = &entrada.almacenado;

    // Raw block sums: engine lines when any exist, legacy collections
    // otherwise. Engine lines tagged DESPLAZAMIENTO feed the travel total,
    // never a canonical block.
    let (raw_a, raw_b, raw_c, raw_d, raw_e, engine_despl) = if !entrada.lineas.is_empty() {
        let mut por_bloque = [Decimal::ZERO; 6];
        for linea in &entrada.lineas {
            let idx = match linea.bloque {
                Bloque::ASuministroEquipos => 0,
                Bloque::BMaterialesInstalacion => 1,
                Bloque::CManoObra => 2,
                Bloque::DMantenimiento1a3 => 3,
                Bloque::EOpcionales4y5 => 4,
                Bloque::Desplazamiento => 5,
            };
            por_bloque[idx] += linea.subtotal;
        }
        (
            por_bloque[0],
            por_bloque[1],
            por_bloque[2],
            por_bloque[3],
            por_bloque[4],
            por_bloque[5],
        )
    } else {
        (
            Decimal::ZERO,
            sum(&entrada.materiales),
            sum(&entrada.trabajos),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        )
    };

    let totales_bloque = TotalesBloque {
        a: prefer_stored(alm.bloque_a, round_money(raw_a)),
        b: prefer_stored(alm.bloque_b, round_money(raw_b)),
        c: prefer_stored(alm.bloque_c, round_money(raw_c)),
        d: prefer_stored(alm.bloque_d, round_money(raw_d)),
        e: prefer_stored(alm.bloque_e, round_money(raw_e)),
    };

    let total_desplazamientos = prefer_stored(
        alm.desplazamientos,
        round_money(sum(&entrada.desplazamientos) + engine_despl),
    );

    // Taxable base: stored base, else legacy stored client total, else the
    // five blocks plus displacement.
    let suma_bloques = totales_bloque.a
        + totales_bloque.b
        + totales_bloque.c
        + totales_bloque.d
        + totales_bloque.e
        + total_desplazamientos;
    let base_imponible = prefer_stored(
        alm.base_imponible,
        prefer_stored(alm.total_cliente, round_money(suma_bloques)),
    );

    let iva_importe = prefer_stored(
        alm.iva_importe,
        round_money(base_imponible * entrada.iva_porcentaje / Decimal::ONE_HUNDRED),
    );
    let total_con_iva = prefer_stored(alm.total_con_iva, round_money(base_imponible + iva_importe));

    let precio_unitario_vehiculo = if alm.precio_unitario_vehiculo > Decimal::ZERO {
        alm.precio_unitario_vehiculo
    } else if entrada.num_vehiculos > 0 {
        round_money(base_imponible / Decimal::from(entrada.num_vehiculos))
    } else {
        Decimal::ZERO
    };

    let total_opcionales = totales_bloque.e;

    ResumenEconomico {
        base_imponible,
        iva_porcentaje: entrada.iva_porcentaje,
        iva_importe,
        total_con_iva,
        precio_unitario_vehiculo,
        totales_bloque,
        total_desplazamientos,
        total_opcionales,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entrada_vacia() -> EntradaEconomica {
        EntradaEconomica {
            lineas: vec![],
            trabajos: vec![],
            materiales: vec![],
            desplazamientos: vec![],
            almacenado: TotalesAlmacenados::default(),
            iva_porcentaje: dec!(21),
            num_vehiculos: 0,
        }
    }

    fn linea(bloque: Bloque, subtotal: Decimal) -> LineaEconomica {
        LineaEconomica { bloque, subtotal }
    }

    #[test]
    fn engine_lines_feed_block_totals() {
        let mut entrada = entrada_vacia();
        entrada.lineas = vec![
            linea(Bloque::ASuministroEquipos, dec!(1000)),
            linea(Bloque::ASuministroEquipos, dec!(250.50)),
            linea(Bloque::CManoObra, dec!(400)),
            linea(Bloque::EOpcionales4y5, dec!(120)),
        ];
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.totales_bloque.a, dec!(1250.50));
        assert_eq!(resumen.totales_bloque.b, dec!(0));
        assert_eq!(resumen.totales_bloque.c, dec!(400.00));
        assert_eq!(resumen.totales_bloque.e, dec!(120.00));
        assert_eq!(resumen.total_opcionales, dec!(120.00));
        assert_eq!(resumen.base_imponible, dec!(1770.50));
    }

    #[test]
    fn legacy_fallback_when_no_engine_lines() {
        // 3 trade-work lines of 100/200/300 map to block C.
        let mut entrada = entrada_vacia();
        entrada.trabajos = vec![dec!(100), dec!(200), dec!(300)];
        entrada.materiales = vec![dec!(50.25), dec!(49.75)];
        entrada.desplazamientos = vec![dec!(80)];
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.totales_bloque.c, dec!(600.00));
        assert_eq!(resumen.totales_bloque.b, dec!(100.00));
        assert_eq!(resumen.totales_bloque.a, dec!(0));
        assert_eq!(resumen.total_desplazamientos, dec!(80.00));
        // Displacement enters the base alongside the five blocks.
        assert_eq!(resumen.base_imponible, dec!(780.00));
    }

    #[test]
    fn engine_lines_shadow_legacy_collections() {
        let mut entrada = entrada_vacia();
        entrada.lineas = vec![linea(Bloque::CManoObra, dec!(400))];
        entrada.trabajos = vec![dec!(999)];
        entrada.materiales = vec![dec!(999)];
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.totales_bloque.c, dec!(400.00));
        assert_eq!(resumen.totales_bloque.b, dec!(0));
    }

    #[test]
    fn stored_block_total_wins_over_computed() {
        let mut entrada = entrada_vacia();
        entrada.lineas = vec![linea(Bloque::ASuministroEquipos, dec!(700))];
        entrada.almacenado.bloque_a = dec!(500);
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.totales_bloque.a, dec!(500));
    }

    #[test]
    fn tax_derivation_and_stored_tax_override() {
        let mut entrada = entrada_vacia();
        entrada.lineas = vec![linea(Bloque::ASuministroEquipos, dec!(1000))];
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.iva_importe, dec!(210.00));
        assert_eq!(resumen.total_con_iva, dec!(1210.00));

        entrada.almacenado.iva_importe = dec!(200);
        entrada.almacenado.total_con_iva = dec!(1200);
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.iva_importe, dec!(200));
        assert_eq!(resumen.total_con_iva, dec!(1200));
    }

    #[test]
    fn base_fallback_chain_prefers_stored_then_client_total() {
        let mut entrada = entrada_vacia();
        entrada.lineas = vec![linea(Bloque::ASuministroEquipos, dec!(1000))];

        entrada.almacenado.total_cliente = dec!(950);
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.base_imponible, dec!(950));

        entrada.almacenado.base_imponible = dec!(900);
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.base_imponible, dec!(900));
    }

    #[test]
    fn per_vehicle_unit_price() {
        let mut entrada = entrada_vacia();
        entrada.lineas = vec![linea(Bloque::ASuministroEquipos, dec!(1000))];
        entrada.num_vehiculos = 3;
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.precio_unitario_vehiculo, dec!(333.33));

        entrada.num_vehiculos = 0;
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.precio_unitario_vehiculo, dec!(0));

        entrada.almacenado.precio_unitario_vehiculo = dec!(350);
        let resumen = compute_economics(&entrada);
        assert_eq!(resumen.precio_unitario_vehiculo, dec!(350));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut entrada = entrada_vacia();
        entrada.lineas = vec![
            linea(Bloque::ASuministroEquipos, dec!(123.45)),
            linea(Bloque::DMantenimiento1a3, dec!(67.89)),
        ];
        entrada.desplazamientos = vec![dec!(10), dec!(20)];
        entrada.num_vehiculos = 7;
        let first = compute_economics(&entrada);
        let second = compute_economics(&entrada);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn block_round_trips_through_db_string() {
        for bloque in BLOQUES_CANONICOS
            .iter()
            .copied()
            .chain([Bloque::Desplazamiento])
        {
            assert_eq!(Bloque::from_str_value(bloque.as_str()).unwrap(), bloque);
        }
        assert!(Bloque::from_str_value("F_OTROS").is_err());
    }
}
