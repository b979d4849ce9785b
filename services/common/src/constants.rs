//! Fixed-point scales shared across the workspace

/// Fixed-point scale: 4 decimal places (1.0 == 10_000)
pub const SCALE_4: i64 = 10_000;

/// Basis points in one whole unit
pub const BASIS_POINTS: i64 = 10_000;

/// Percent scale (100% == 100)
pub const PERCENT_SCALE: i64 = 100;
