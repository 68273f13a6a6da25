//! Decimal rounding of reported values

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places for volumes, densities, GWP and PENRE values
pub const INDICATOR_DP: u32 = 3;
/// UBP values are reported in large integer-like units
pub const UBP_DP: u32 = 0;
/// Monetary values
pub const MONEY_DP: u32 = 2;

/// Round half-to-even at `decimal_places`.
///
/// Rounding works on the exact binary value of `value`, so a double stored
/// just above or below a decimal midpoint rounds to its true nearest
/// neighbour (`0.0125` becomes `0.013`, `2.675` becomes `2.67`). The result is the nearest `f64` to the rounded decimal, so it prints
/// with at most `decimal_places` fractional digits. Values outside the
/// decimal range (or non-finite) are returned unchanged.
pub fn round_to(value: f64, decimal_places: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|decimal| decimal.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven))
        .and_then(|decimal| decimal.to_string().parse::<f64>().ok())
        .unwrap_or(value)
}
