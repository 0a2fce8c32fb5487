//! Rounding for reported tonnages.
//!
//! Methodology arithmetic runs in `f64`; only the figures that end up on a
//! credit record (buffer amount, buffered tons) are rounded, via
//! `rust_decimal` so that halves round away from zero instead of following
//! binary floating-point representation.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on buffer amounts and buffered tonnage.
pub const TONNAGE_DP: u32 = 4;

/// Round half-up (away from zero) to `dp` decimal places.
///
/// Non-finite input is returned unchanged; callers reject it separately.
pub fn round_half_up(value: f64, dp: u32) -> f64 {
    match Decimal::from_f64(value) {
        Some(d) => d
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or(value),
        None => value,
    }
}

/// Round to [`TONNAGE_DP`] places.
pub fn round_tons(value: f64) -> f64 {
    round_half_up(value, TONNAGE_DP)
}

/// Round half-up to two places, as used for quality scores.
pub fn round_score(value: f64) -> f64 {
    round_half_up(value, 2)
}
