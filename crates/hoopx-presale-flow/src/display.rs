//! Token amount display helpers.

use rust_decimal::{dec, Decimal};

/// HOOPX received for `amount_usdt` at the round's rate.
pub fn token_amount(amount_usdt: u64, rate: Decimal) -> Decimal {
    if rate.is_zero() {
        return Decimal::ZERO;
    }
    Decimal::from(amount_usdt) / rate
}

/// Formats a token amount for display.
///
/// Truncates (never rounds up) to 2 decimals at or above 100 and 6 decimals
/// below, keeping at least 2 fraction digits.
pub fn format_token_amount(amount: Decimal) -> String {
    let scale = if amount >= dec!(100) { 2 } else { 6 };
    let mut truncated = amount.trunc_with_scale(scale);
    if truncated.scale() < 2 {
        truncated.rescale(2);
    }
    truncated.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousand_usdt_at_presale_rate() {
        let amount = token_amount(1000, dec!(0.003));
        // 333333.333… truncates to 2 decimals at this magnitude.
        assert_eq!(format_token_amount(amount), "333333.33");
    }

    #[test]
    fn small_amounts_keep_six_decimals() {
        assert_eq!(format_token_amount(dec!(33.33333391)), "33.333333");
        assert_eq!(format_token_amount(dec!(99.9999999)), "99.999999");
    }

    #[test]
    fn truncation_never_rounds_up() {
        assert_eq!(format_token_amount(dec!(333333.339)), "333333.33");
        assert_eq!(format_token_amount(dec!(0.0000019)), "0.000001");
    }

    #[test]
    fn whole_amounts_keep_two_fraction_digits() {
        assert_eq!(format_token_amount(dec!(60)), "60.00");
        assert_eq!(format_token_amount(dec!(100)), "100.00");
        assert_eq!(format_token_amount(token_amount(100_000, dec!(0.003))), "33333333.33");
    }

    #[test]
    fn zero_rate_yields_zero() {
        assert_eq!(token_amount(1000, Decimal::ZERO), Decimal::ZERO);
    }
}
