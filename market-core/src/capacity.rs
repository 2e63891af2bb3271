use std::collections::HashMap;

use crate::agents::Vendor;
use crate::config::MarketConfig;
use crate::types::{Customers, VendorId};

// === EXPLOITABLE CAPACITY ===

/// Customers the premises can physically turn over in one turn:
/// `seats * periods/day * days/turn * concept throughput`, floored.
pub fn exploitable_capacity(vendor: &Vendor, config: &MarketConfig) -> Customers {
    let raw = f64::from(vendor.seats)
        * config.services_per_turn() as f64
        * vendor.concept().throughput_coefficient();
    raw.floor().clamp(0.0, Customers::MAX as f64) as Customers
}

/// Bound an allocation by each vendor's exploitable capacity.
///
/// Vendors missing from `allocation` get 0.
pub fn clamp_capacity(
    vendors: &[&Vendor],
    allocation: &HashMap<VendorId, Customers>,
    config: &MarketConfig,
) -> HashMap<VendorId, Customers> {
    vendors
        .iter()
        .map(|vendor| {
            let allocated = allocation.get(&vendor.id).copied().unwrap_or(0);
            (vendor.id, allocated.min(exploitable_capacity(vendor, config)))
        })
        .collect()
}

// === SERVICE MINUTES ===

/// Customers the remaining front-of-house minutes can serve, capped at `clients_cap`.
///
/// Unbounded minutes leave the cap untouched.
pub fn service_capacity(vendor: &Vendor, clients_cap: Customers) -> Customers {
    let Some(minutes_left) = vendor.service_minutes_left else {
        return clients_cap;
    };
    let per_cover = vendor.concept().minutes_per_cover();
    if per_cover <= 0.0 {
        return clients_cap;
    }
    let covers = (minutes_left.max(0.0) / per_cover).floor();
    if covers >= f64::from(clients_cap) {
        clients_cap
    } else {
        covers as Customers
    }
}
