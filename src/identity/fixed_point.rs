// src/identity/fixed_point.rs
//
// Fractional quantities (amounts, probabilities, crafting times) never enter
// an identity as floats. They are scaled and truncated to integers first so
// ids stay stable across float formatting differences.

/// Scale factor applied before truncation.
///
/// Stored identities depend on this value; it must not change.
pub const FIXED_POINT_PRECISION: f64 = 1000.0;

/// Converts a fractional quantity to its fixed-point form.
///
/// Truncates toward zero (no rounding): `1.0059` becomes `1005`.
pub fn fixed_point(value: f64) -> i64 {
    (value * FIXED_POINT_PRECISION) as i64
}
