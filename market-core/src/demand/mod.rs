//! Turning a scenario's population into customers per vendor.
//!
//! Scoring and cannibalization are pure per-vendor lookups; allocation walks
//! the segments in priority order against a shared capacity pool.

pub mod allocation;
pub mod cannibalization;
pub mod scoring;

pub use allocation::*;
pub use cannibalization::*;
pub use scoring::*;
