// src/identity/mod.rs
//
// Content identity
//
// Provides:
// - Field-selection metadata (which fields feed an identity)
// - The identity calculator (structural hash -> 128-bit id)
// - Fixed-point normalization for fractional quantities

pub mod calculator;
pub mod field;
pub mod fixed_point;

pub use calculator::{canonical_bytes, compute_id, identity_shape, Shape};
pub use field::{FieldEntry, FieldValue, Identifiable, Marker};
pub use fixed_point::{fixed_point, FIXED_POINT_PRECISION};
