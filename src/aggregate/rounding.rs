//! Rounding policy shared by every derived figure.
//!
//! - Currency: two decimals.
//! - Ratios shown as percentages: one decimal.
//! - Ties round away from zero (half-up for the non-negative values here).
//!
//! Values are snapped to 1e-6 of the target unit before the final rounding so
//! that binary noise such as `1.2499999999999998` still counts as a tie.

pub fn round_to(x: f64, decimals: u32) -> f64 {
    let f = 10f64.powi(decimals as i32);
    let snapped = ((x * f) * 1e6).round() / 1e6;
    snapped.round() / f
}

pub fn currency(x: f64) -> f64 {
    round_to(x, 2)
}

/// Percentage already on a 0..100 scale.
pub fn percent(x: f64) -> f64 {
    round_to(x, 1)
}

/// Ratio on a 0..1 scale, shown as a percentage.
pub fn ratio_to_percent(ratio: f64) -> f64 {
    percent(ratio * 100.0)
}

/// Largest currency amount accepted as a single input (one trillion).
/// Keeps every cent sum and the yearly projection far inside `i64`.
pub const MAX_AMOUNT: f64 = 1e12;

/// Currency amount in whole cents; `None` when not finite or beyond
/// [`MAX_AMOUNT`] in magnitude.
pub fn to_cents(x: f64) -> Option<i64> {
    if !x.is_finite() || x.abs() > MAX_AMOUNT {
        return None;
    }
    Some((currency(x) * 100.0).round() as i64)
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_round_up() {
        assert_eq!(ratio_to_percent(0.0125), 1.3);
        assert_eq!(currency(2.675), 2.68);
        assert_eq!(percent(42.25), 42.3);
    }

    #[test]
    fn ratios_become_one_decimal_percentages() {
        assert_eq!(ratio_to_percent(0.3456), 34.6);
        assert_eq!(ratio_to_percent(0.045), 4.5);
    }

    #[test]
    fn cents_are_exact() {
        assert_eq!(to_cents(15000.0), Some(1_500_000));
        assert_eq!(to_cents(0.1 + 0.2), Some(30));
        assert_eq!(from_cents(-100_000), -1000.0);
    }

    #[test]
    fn cents_refuse_out_of_range() {
        assert_eq!(to_cents(MAX_AMOUNT), Some(100_000_000_000_000));
        assert_eq!(to_cents(1e16), None);
        assert_eq!(to_cents(f64::INFINITY), None);
        assert_eq!(to_cents(f64::NAN), None);
    }
}
