//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::{STAT_MAX, STAT_MIN};

/// Clamp a meter value into `[STAT_MIN, STAT_MAX]`.
#[must_use]
pub fn clamp_stat(value: i64) -> u8 {
    let clamped = value.clamp(i64::from(STAT_MIN), i64::from(STAT_MAX));
    cast::<i64, u8>(clamped).unwrap_or(STAT_MIN)
}

/// Truncate a f64 toward zero into the u64 range, returning 0 for non-finite
/// or non-positive values.
#[must_use]
pub fn truncate_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.min(max).trunc()).unwrap_or(u64::MAX)
}

/// Clamp an i64 into the u32 range.
#[must_use]
pub fn clamp_i64_to_u32(value: i64) -> u32 {
    let clamped = value.clamp(0, i64::from(u32::MAX));
    cast::<i64, u32>(clamped).unwrap_or(0)
}
