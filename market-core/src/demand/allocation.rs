use std::collections::HashMap;

use crate::agents::Vendor;
use crate::capacity::exploitable_capacity;
use crate::config::MarketConfig;
use crate::scenario::{Scenario, demand_in_priority_order};
use crate::types::{Concept, Customers, Segment, VendorId};

#[cfg(feature = "instrument")]
use crate::types::KeyToU64;

use super::cannibalization::{concept_counts, factor_for};
use super::scoring::{attraction_score, is_eligible};

// === RANKING ===

/// An eligible vendor's standing for one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedVendor {
    pub vendor: VendorId,
    pub raw_score: f64,
    pub cannibalization: f64,
    pub adjusted_score: f64,
}

/// Eligible vendors for `segment`, best adjusted score first.
///
/// The sort is stable: ties keep the input (roster) order.
pub fn rank_for_segment(
    vendors: &[&Vendor],
    segment: Segment,
    counts: &HashMap<Concept, usize>,
    config: &MarketConfig,
) -> Vec<RankedVendor> {
    let mut ranked: Vec<RankedVendor> = vendors
        .iter()
        .filter(|vendor| is_eligible(vendor, segment, config))
        .map(|vendor| {
            let raw_score = attraction_score(vendor, segment, config).max(0.0);
            let cannibalization = factor_for(vendor, counts, config.cannibalization_alpha);
            RankedVendor {
                vendor: vendor.id,
                raw_score,
                cannibalization,
                adjusted_score: raw_score * cannibalization,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.adjusted_score.total_cmp(&a.adjusted_score));
    ranked
}

// === ALLOCATION ===

/// Customers attributed to vendors before service and stock constraints,
/// plus what each segment left on the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationReport {
    pub allocated: HashMap<VendorId, Customers>,
    /// Demand per segment in processing order.
    pub segment_demand: Vec<(Segment, Customers)>,
    /// Demand that found no eligible vendor or no remaining capacity, per segment.
    pub unserved: Vec<(Segment, Customers)>,
}

impl AllocationReport {
    pub fn total_unserved(&self) -> u64 {
        self.unserved.iter().map(|(_, n)| u64::from(*n)).sum()
    }
}

/// Segmented greedy allocation with budget gate, saturation and overflow.
///
/// Segments are processed in priority order and draw from one capacity pool
/// per vendor shared across segments, so earlier segments win under scarcity.
pub fn allocate_demand_report(
    vendors: &[&Vendor],
    scenario: &Scenario,
    config: &MarketConfig,
) -> AllocationReport {
    let segment_demand = demand_in_priority_order(scenario, config);
    let counts = concept_counts(vendors.iter().copied());

    let mut capacity_left: HashMap<VendorId, Customers> = vendors
        .iter()
        .map(|v| (v.id, exploitable_capacity(v, config)))
        .collect();
    let mut allocated: HashMap<VendorId, Customers> = vendors.iter().map(|v| (v.id, 0)).collect();
    let mut unserved = Vec::with_capacity(segment_demand.len());

    for &(segment, quantity) in &segment_demand {
        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "segment_demand",
            segment = segment.as_str(),
            demand = u64::from(quantity),
        );

        let mut remaining = quantity;
        if remaining > 0 {
            for ranked in rank_for_segment(vendors, segment, &counts, config) {
                if remaining == 0 {
                    break;
                }
                let Some(cap) = capacity_left.get_mut(&ranked.vendor) else {
                    continue;
                };
                if *cap == 0 {
                    continue;
                }

                let take = remaining.min(*cap);
                *cap -= take;
                remaining -= take;
                *allocated.entry(ranked.vendor).or_insert(0) += take;

                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "allocation",
                    segment = segment.as_str(),
                    vendor_id = ranked.vendor.to_u64(),
                    raw_score = ranked.raw_score,
                    adjusted_score = ranked.adjusted_score,
                    customers = u64::from(take),
                );
            }
        }

        #[cfg(feature = "instrument")]
        if remaining > 0 {
            tracing::info!(
                target: "unserved",
                segment = segment.as_str(),
                customers = u64::from(remaining),
            );
        }

        unserved.push((segment, remaining));
    }

    AllocationReport {
        allocated,
        segment_demand,
        unserved,
    }
}

/// `{vendor: customers attributed}` before the capacity clamp.
pub fn allocate_demand(
    vendors: &[&Vendor],
    scenario: &Scenario,
    config: &MarketConfig,
) -> HashMap<VendorId, Customers> {
    allocate_demand_report(vendors, scenario, config).allocated
}

/// Customers no vendor could take this turn, replaying the allocation.
pub fn estimate_lost_customers(
    vendors: &[&Vendor],
    scenario: &Scenario,
    config: &MarketConfig,
) -> u64 {
    allocate_demand_report(vendors, scenario, config).total_unserved()
}
