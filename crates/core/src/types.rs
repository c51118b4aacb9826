//! Shared type aliases and money rounding helpers.

use rust_decimal::{Decimal, RoundingStrategy};

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Round a monetary total to 2 decimal places, half-up.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a unit sale price to 4 decimal places, half-up.
///
/// Catalog sale prices keep two extra decimals so that per-unit margins
/// survive multiplication by large quantities before the 2-dp totals round.
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_rounds_half_up_at_two_decimals() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
        assert_eq!(round_money(dec!(10.004)), dec!(10.00));
        assert_eq!(round_money(dec!(-10.005)), dec!(-10.01));
    }

    #[test]
    fn price_rounds_half_up_at_four_decimals() {
        assert_eq!(round_price(dec!(14.00005)), dec!(14.0001));
        assert_eq!(round_price(dec!(14.00004)), dec!(14.0000));
    }
}
