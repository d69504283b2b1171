//! Fixed-point money math for settlement validation.
//!
//! ## Overview
//!
//! All sizes, collateral amounts and prices in the darkpool use u64 USD minor
//! units scaled by 10^6 (6 decimal places), matching the position ledger's
//! native representation. The external oracle speaks `rust_decimal::Decimal`;
//! conversion happens at that boundary and nowhere else.
//!
//! ## Why Fixed-Point?
//!
//! Settlement validation must be bit-for-bit reproducible across machines.
//! Floating point is banned; intermediate products widen to u128.
//!
//! ## Examples
//!
//! ```
//! use darkpool_core::types::price::{to_fixed, from_fixed, slippage_bps};
//!
//! let price = to_fixed("50000.123456").unwrap();
//! assert_eq!(price, 50_000_123_456);
//! assert_eq!(from_fixed(price), "50000.123456");
//!
//! // |49000 - 49500| / 49500 = 1.0101% -> 101 bps (floor)
//! assert_eq!(slippage_bps(49_000_000_000, 49_500_000_000), Some(101));
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Scaling factor for fixed-point arithmetic: 10^6
///
/// This provides 6 decimal places of precision (USD minor units).
pub const SCALE: u64 = 1_000_000;

/// Basis-point denominator: 10000 bps = 100%
pub const BPS_DENOMINATOR: u64 = 10_000;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a decimal string to fixed-point u64
///
/// Returns `None` if parsing fails, the value is negative, or it is out of
/// range after scaling.
pub fn to_fixed(s: &str) -> Option<u64> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_fixed(decimal)
}

/// Convert a Decimal to fixed-point u64
///
/// Returns `None` for negative or out-of-range values. Sub-minor-unit
/// precision is rounded to the nearest unit.
pub fn decimal_to_fixed(d: Decimal) -> Option<u64> {
    if d.is_sign_negative() {
        return None;
    }

    let scaled = d.checked_mul(Decimal::from(SCALE))?;
    let rounded = scaled.round_dp(0);
    rounded.to_u64()
}

/// Convert fixed-point u64 to a Decimal
pub fn fixed_to_decimal(value: u64) -> Decimal {
    Decimal::from(value) / Decimal::from(SCALE)
}

/// Convert fixed-point u64 to a string with 6 decimal places
pub fn from_fixed(value: u64) -> String {
    let decimal = fixed_to_decimal(value);
    format!("{:.6}", decimal)
}

// ============================================================================
// Settlement Arithmetic
// ============================================================================

/// Absolute price deviation from a reference, in basis points (floor).
///
/// Computes `|price - reference| * 10000 / reference` with u128
/// intermediates. Returns `None` if the reference price is zero.
pub fn slippage_bps(price: u64, reference: u64) -> Option<u64> {
    if reference == 0 {
        return None;
    }

    let diff = if price >= reference {
        price - reference
    } else {
        reference - price
    };

    let bps = (diff as u128) * (BPS_DENOMINATOR as u128) / (reference as u128);
    u64::try_from(bps).ok()
}

/// Proportional share `amount * numerator / denominator` (floor).
///
/// Used for collateral deltas: `collateral * matched_size / order_size`.
/// Returns `None` if the denominator is zero or the result overflows u64.
pub fn proportional(amount: u64, numerator: u64, denominator: u64) -> Option<u64> {
    if denominator == 0 {
        return None;
    }

    let share = (amount as u128) * (numerator as u128) / (denominator as u128);
    u64::try_from(share).ok()
}

/// Fee amount for a given size at a basis-point rate (floor).
///
/// Returns `None` only on u64 overflow of the result.
pub fn fee_amount(size: u64, fee_rate_bps: u16) -> Option<u64> {
    let fee = (size as u128) * (fee_rate_bps as u128) / (BPS_DENOMINATOR as u128);
    u64::try_from(fee).ok()
}

/// Volume-weighted average price over (size, price) terms.
///
/// Returns `None` if total volume is zero or the result overflows u64.
pub fn weighted_average_price<I>(terms: I) -> Option<u64>
where
    I: IntoIterator<Item = (u64, u64)>,
{
    let mut total_volume: u128 = 0;
    let mut total_value: u128 = 0;

    for (size, price) in terms {
        total_volume += size as u128;
        total_value += (size as u128) * (price as u128);
    }

    if total_volume == 0 {
        return None;
    }

    u64::try_from(total_value / total_volume).ok()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_constant() {
        assert_eq!(SCALE, 1_000_000);
    }

    #[test]
    fn test_to_fixed_basic() {
        assert_eq!(to_fixed("1.0"), Some(1_000_000));
        assert_eq!(to_fixed("1"), Some(1_000_000));
        assert_eq!(to_fixed("0.5"), Some(500_000));
        assert_eq!(to_fixed("0.000001"), Some(1));
        assert_eq!(to_fixed("50000.123456"), Some(50_000_123_456));
    }

    #[test]
    fn test_to_fixed_edge_cases() {
        assert_eq!(to_fixed("0"), Some(0));

        // Negative values should return None
        assert_eq!(to_fixed("-1.0"), None);

        // Invalid strings should return None
        assert_eq!(to_fixed("abc"), None);
        assert_eq!(to_fixed(""), None);
    }

    #[test]
    fn test_from_fixed() {
        assert_eq!(from_fixed(1_000_000), "1.000000");
        assert_eq!(from_fixed(500_000), "0.500000");
        assert_eq!(from_fixed(1), "0.000001");
        assert_eq!(from_fixed(50_000_123_456), "50000.123456");
    }

    #[test]
    fn test_roundtrip() {
        let values = ["1.0", "0.5", "50000.123456", "0.000001", "123456.789012"];

        for s in values {
            let fixed = to_fixed(s).unwrap();
            let back = from_fixed(fixed);
            let original = Decimal::from_str(s).unwrap();
            let converted = Decimal::from_str(&back).unwrap();
            assert_eq!(original, converted, "Roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_slippage_bps() {
        // Exact match: zero deviation
        assert_eq!(slippage_bps(100, 100), Some(0));

        // |49000 - 49500| / 49500 ~ 1.01% -> 101 bps after flooring
        assert_eq!(slippage_bps(49_000_000_000, 49_500_000_000), Some(101));

        // |49000 - 48900| / 48900 ~ 0.20% -> 20 bps
        assert_eq!(slippage_bps(49_000_000_000, 48_900_000_000), Some(20));

        // Symmetric in direction of deviation
        assert_eq!(
            slippage_bps(49_500_000_000, 49_000_000_000),
            slippage_bps(48_500_000_000, 49_000_000_000),
        );

        // Zero reference is undefined
        assert_eq!(slippage_bps(100, 0), None);
    }

    #[test]
    fn test_slippage_boundary() {
        // Exactly 1% deviation is exactly 100 bps
        assert_eq!(slippage_bps(10_100, 10_000), Some(100));
        assert_eq!(slippage_bps(9_900, 10_000), Some(100));
    }

    #[test]
    fn test_proportional() {
        // 200 collateral, half the order matched -> 100
        assert_eq!(proportional(200_000_000, 500, 1000), Some(100_000_000));

        // Full match -> full collateral
        assert_eq!(proportional(200_000_000, 1000, 1000), Some(200_000_000));

        // Zero denominator is undefined
        assert_eq!(proportional(200, 1, 0), None);

        // Large values survive via u128 intermediates
        assert_eq!(
            proportional(u64::MAX, u64::MAX, u64::MAX),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_fee_amount() {
        // 30 bps on 1_000_000_000 -> 3_000_000
        assert_eq!(fee_amount(1_000_000_000, 30), Some(3_000_000));
        assert_eq!(fee_amount(1_000_000_000, 0), Some(0));
        // 100% fee
        assert_eq!(fee_amount(500, 10_000), Some(500));
    }

    #[test]
    fn test_weighted_average_price() {
        // Single term: vwap = price
        assert_eq!(weighted_average_price([(100, 50)]), Some(50));

        // Equal sizes: midpoint
        assert_eq!(weighted_average_price([(100, 40), (100, 60)]), Some(50));

        // Weighted toward the larger trade
        assert_eq!(weighted_average_price([(300, 40), (100, 80)]), Some(50));

        // No volume is undefined
        assert_eq!(weighted_average_price([]), None);
        assert_eq!(weighted_average_price([(0, 100)]), None);
    }
}
