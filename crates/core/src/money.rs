//! Money normalization.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places monetary values are normalized to by default.
pub const DEFAULT_DECIMAL_PLACES: u32 = 2;

/// Round `value` to `places` decimal places, half away from zero.
///
/// The result always carries exactly `places` digits of scale, so `30`
/// normalizes to `30.00` both for display and on the wire.
pub fn normalize(value: Decimal, places: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(normalize(dec!(2.345), 2), dec!(2.35));
        assert_eq!(normalize(dec!(2.344), 2), dec!(2.34));
        assert_eq!(normalize(dec!(-2.345), 2), dec!(-2.35));
        assert_eq!(normalize(dec!(0.005), 2), dec!(0.01));
    }

    #[test]
    fn pads_scale_to_requested_places() {
        let v = normalize(dec!(30), 2);
        assert_eq!(v.scale(), 2);
        assert_eq!(v.to_string(), "30.00");
    }

    #[test]
    fn zero_places_rounds_to_integer() {
        assert_eq!(normalize(dec!(12.5), 0), dec!(13));
        assert_eq!(normalize(dec!(12.49), 0), dec!(12));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: normalizing twice is the same as normalizing once.
        #[test]
        fn normalize_is_idempotent(mantissa in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..8) {
            let value = Decimal::new(mantissa, scale);
            let once = normalize(value, DEFAULT_DECIMAL_PLACES);
            prop_assert_eq!(normalize(once, DEFAULT_DECIMAL_PLACES), once);
        }

        /// Property: the rounding error never exceeds half a unit in the last place.
        #[test]
        fn rounding_error_is_bounded(mantissa in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..8) {
            let value = Decimal::new(mantissa, scale);
            let diff = (normalize(value, 2) - value).abs();
            prop_assert!(diff <= dec!(0.005));
        }
    }
}
