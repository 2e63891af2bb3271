use thiserror::Error;

use crate::types::{Turn, VendorId};

/// Failures surfaced by construction, configuration and inventory settlement.
///
/// Market saturation (no eligible vendor, no stock, no staff minutes) is never
/// an error; it degrades into loss buckets instead.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed configuration json: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error("invalid menu item `{name}`: {reason}")]
    InvalidMenuItem { name: String, reason: String },

    #[error("invalid finished lot `{item}`: {reason}")]
    InvalidLot { item: String, reason: String },

    /// A lot reached settlement in a state no production step can create.
    #[error("corrupted finished lot `{item}` (produced turn {production_turn}): {reason}")]
    CorruptLot {
        item: String,
        production_turn: Turn,
        reason: String,
    },

    #[error("unknown vendor {0:?}")]
    UnknownVendor(VendorId),
}
