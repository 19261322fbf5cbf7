//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert u64 milliseconds to f64 while allowing precision loss in a single location.
#[must_use]
pub fn ms_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert a count to f64 for averaging.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Widen a count for comparisons against u64 limits.
#[must_use]
pub fn count_to_u64(value: usize) -> u64 {
    cast::<usize, u64>(value).unwrap_or(u64::MAX)
}

/// Floor a non-negative f64 into u64 milliseconds, returning 0 for NaN or negative values.
#[must_use]
pub fn floor_f64_to_ms(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.min(max).floor()).unwrap_or(u64::MAX)
}

/// Round a non-negative f64 into u64 milliseconds, returning 0 for NaN or negative values.
#[must_use]
pub fn round_f64_to_ms(value: f64) -> u64 {
    floor_f64_to_ms(value.round())
}

/// Evenly place `index` (1-based) of `count` points strictly inside `[start, end]`.
///
/// Uses integer arithmetic so the result is exact for millisecond spans;
/// `u128` keeps the intermediate product from overflowing.
#[must_use]
pub fn interior_point(start: u64, end: u64, index: u32, count: u32) -> u64 {
    let span = u128::from(end.saturating_sub(start));
    let offset = span * u128::from(index) / (u128::from(count) + 1);
    start.saturating_add(u64::try_from(offset).unwrap_or(u64::MAX))
}
