use serde::{Deserialize, Serialize};

use crate::agents::Vendor;
use crate::types::Customers;

// === CONSTANTS ===

/// Notoriety lost per percentage point of unmet demand.
pub const NOTORIETY_PENALTY_PER_POINT: f64 = 0.02;
/// Cap on the relative notoriety loss in one turn.
pub const NOTORIETY_PENALTY_MAX: f64 = 0.10;

/// Unmet demand of one vendor for one turn, split by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossBreakdown {
    /// Servable customers turned away for lack of finished goods.
    pub stock: Customers,
    /// Customers the premises took but the staff could not serve.
    pub capacity: Customers,
    /// Demand beyond the physical seat turnover.
    pub other: Customers,
}

impl LossBreakdown {
    pub fn total(&self) -> Customers {
        self.stock + self.capacity + self.other
    }
}

/// Split `demanded - sold` into stock, capacity and residual losses.
///
/// Demand is pushed through successive bottlenecks: seat turnover
/// (`cap_rh`), staff minutes (`cap_service`), then stock on hand. Each
/// bucket is what one stage drops, so the buckets always sum to
/// `demanded - sold` when `sold` respects every bound.
pub fn attribute_losses(
    demanded: Customers,
    cap_rh: Customers,
    cap_service: Customers,
    available: Customers,
    sold: Customers,
) -> LossBreakdown {
    let rh_stage = demanded.min(cap_rh);
    let service_stage = rh_stage.min(cap_service);
    let stock_stage = service_stage.min(available);
    let sold = sold.min(stock_stage);

    LossBreakdown {
        other: demanded - rh_stage,
        capacity: rh_stage - service_stage,
        // any shortfall of `sold` below the stock bound counts as stock loss
        stock: service_stage - sold,
    }
}

/// Erode notoriety in proportion to unmet demand, at most 10% per turn.
///
/// Returns the new notoriety (rounded to 3 decimals, within [0, 1]).
pub fn apply_notoriety_penalty(vendor: &mut Vendor, demanded: Customers, lost: Customers) -> f64 {
    if demanded == 0 || lost == 0 {
        return vendor.notoriety;
    }
    let frac = (f64::from(lost) / f64::from(demanded)).min(1.0);
    let delta = (NOTORIETY_PENALTY_PER_POINT * frac * 100.0).min(NOTORIETY_PENALTY_MAX);
    let next = vendor.notoriety.clamp(0.0, 1.0) * (1.0 - delta);
    vendor.notoriety = ((next * 1000.0).round() / 1000.0).clamp(0.0, 1.0);
    vendor.notoriety
}
