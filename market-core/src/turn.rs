use serde::{Deserialize, Serialize};

use crate::agents::Vendor;
use crate::capacity::{clamp_capacity, exploitable_capacity, service_capacity};
use crate::config::MarketConfig;
use crate::demand::allocate_demand_report;
use crate::error::MarketError;
use crate::losses::{LossBreakdown, apply_notoriety_penalty, attribute_losses};
use crate::scenario::Scenario;
use crate::types::{Customers, Portions, Price, Segment, Turn, VendorId};

#[cfg(feature = "instrument")]
use crate::types::KeyToU64;

// === RESULTS ===

/// One vendor's settlement for one turn, as handed to accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorTurnResult {
    pub vendor: VendorId,
    pub turn: Turn,
    /// Customers attributed by the allocator.
    pub customers_allocated: Customers,
    /// Allocation bounded by exploitable seat capacity.
    pub capacity: Customers,
    /// `capacity` further bounded by remaining service minutes.
    pub service_capacity: Customers,
    /// Sellable portions before the sale.
    pub stock_available: Portions,
    pub customers_served: Customers,
    pub revenue: Price,
    pub median_price: Price,
    pub losses: LossBreakdown,
    pub notoriety_after: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: Turn,
    pub segment_demand: Vec<(Segment, Customers)>,
    pub unserved_by_segment: Vec<(Segment, Customers)>,
    /// Per vendor, in roster order.
    pub vendors: Vec<VendorTurnResult>,
}

impl TurnReport {
    pub fn total_demand(&self) -> u64 {
        self.segment_demand.iter().map(|(_, n)| u64::from(*n)).sum()
    }

    pub fn total_served(&self) -> u64 {
        self.vendors.iter().map(|v| u64::from(v.customers_served)).sum()
    }

    pub fn total_revenue(&self) -> Price {
        self.vendors.iter().map(|v| v.revenue).sum()
    }

    pub fn total_unserved(&self) -> u64 {
        self.unserved_by_segment.iter().map(|(_, n)| u64::from(*n)).sum()
    }

    pub fn vendor(&self, id: VendorId) -> Option<&VendorTurnResult> {
        self.vendors.iter().find(|v| v.vendor == id)
    }
}

// === PRE-TURN ===

/// Turn-start housekeeping: drop expired lots and refill service minutes.
///
/// Returns the number of portions discarded.
pub fn begin_turn(vendor: &mut Vendor, turn: Turn) -> Portions {
    let discarded = vendor.inventory.cleanup_expired(turn);

    #[cfg(feature = "instrument")]
    if discarded > 0 {
        tracing::info!(
            target: "expiry",
            turn = turn,
            vendor_id = vendor.id.to_u64(),
            portions = u64::from(discarded),
        );
    }

    vendor.reset_service_minutes();
    discarded
}

// === SETTLEMENT ===

/// Settle one vendor: staff-minute clamp, stock bound, sale, losses and
/// reputation/staff feedback.
///
/// `allocated` is the allocator's raw attribution and `capacity` the same
/// figure after [`clamp_capacity`]. On a corrupted lot the vendor is left
/// untouched.
pub fn settle_vendor(
    vendor: &mut Vendor,
    allocated: Customers,
    capacity: Customers,
    turn: Turn,
    config: &MarketConfig,
) -> Result<VendorTurnResult, MarketError> {
    let capacity = capacity.min(exploitable_capacity(vendor, config));

    // 1. SERVICE CLAMP
    let serv_cap = service_capacity(vendor, capacity);

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "service_clamp",
        turn = turn,
        vendor_id = vendor.id.to_u64(),
        allocated = u64::from(allocated),
        capacity = u64::from(capacity),
        service_capacity = u64::from(serv_cap),
        minutes_left = vendor.service_minutes_left.unwrap_or(f64::INFINITY),
    );

    // 2. INVENTORY
    let available = vendor.inventory.total_portions(turn);
    let target = serv_cap.min(available);
    let sale = vendor.inventory.sell_best_grade_first(target, turn)?;
    vendor.consume_service_minutes(sale.units);

    #[cfg(feature = "instrument")]
    for line in &sale.lines {
        tracing::info!(
            target: "sale",
            turn = turn,
            vendor_id = vendor.id.to_u64(),
            item = line.item.as_str(),
            grade_rank = u64::from(line.grade.rank()),
            units = u64::from(line.units),
            unit_price = line.unit_price,
        );
    }

    // 3. LOSSES
    let losses = attribute_losses(allocated, capacity, serv_cap, available, sale.units);
    let notoriety_after = apply_notoriety_penalty(vendor, allocated, losses.total());

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "loss",
        turn = turn,
        vendor_id = vendor.id.to_u64(),
        demanded = u64::from(allocated),
        served = u64::from(sale.units),
        lost_stock = u64::from(losses.stock),
        lost_capacity = u64::from(losses.capacity),
        lost_other = u64::from(losses.other),
        notoriety = notoriety_after,
    );

    // 4. STAFF
    vendor.update_staff_satisfaction();

    Ok(VendorTurnResult {
        vendor: vendor.id,
        turn,
        customers_allocated: allocated,
        capacity,
        service_capacity: serv_cap,
        stock_available: available,
        customers_served: sale.units,
        revenue: sale.revenue,
        median_price: vendor.median_price(),
        losses,
        notoriety_after,
    })
}

/// Reject a turn that could not settle every vendor. Never mutates.
pub fn validate_turn(vendors: &[&mut Vendor], scenario: &Scenario) -> Result<(), MarketError> {
    scenario.validate()?;
    for vendor in vendors {
        vendor.inventory.validate()?;
    }
    Ok(())
}

/// Settle a whole market for one turn. Vendors are processed in slice order.
///
/// Pre-turn housekeeping ([`begin_turn`]) is the caller's job. On error no
/// vendor has been touched.
pub fn settle_turn(
    turn: Turn,
    vendors: &mut [&mut Vendor],
    scenario: &Scenario,
    config: &MarketConfig,
) -> Result<TurnReport, MarketError> {
    validate_turn(vendors, scenario)?;

    // 1. ALLOCATION PHASE
    let view: Vec<&Vendor> = vendors.iter().map(|v| &**v).collect();
    let allocation = allocate_demand_report(&view, scenario, config);
    let clamped = clamp_capacity(&view, &allocation.allocated, config);

    // 2. SETTLEMENT PHASE
    let mut results = Vec::with_capacity(vendors.len());
    for vendor in vendors.iter_mut() {
        let allocated = allocation.allocated.get(&vendor.id).copied().unwrap_or(0);
        let capacity = clamped.get(&vendor.id).copied().unwrap_or(0);
        results.push(settle_vendor(vendor, allocated, capacity, turn, config)?);
    }

    let report = TurnReport {
        turn,
        segment_demand: allocation.segment_demand,
        unserved_by_segment: allocation.unserved,
        vendors: results,
    };

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "turn",
        turn = turn,
        vendors = report.vendors.len() as u64,
        demand = report.total_demand(),
        served = report.total_served(),
        unserved = report.total_unserved(),
        revenue = report.total_revenue(),
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{FinishedLot, MenuItem};
    use crate::types::{Concept, Grade};

    fn stocked_bistro(id: u64, seats: u32, portions: Portions) -> Vendor {
        let mut v = Vendor::new(VendorId::from_u64(id), "bistro", Concept::Bistro, seats)
            .with_menu(vec![MenuItem::new("plat du jour", 16.0, 0.7).unwrap()]);
        v.inventory
            .add_lot(FinishedLot::new("plat du jour", Grade::G1Fresh, 16.0, portions, 1, 2).unwrap());
        v
    }

    #[test]
    fn settle_vendor_bounds_by_minutes_then_stock() {
        let config = MarketConfig::default();
        // 60 covers worth of minutes, 40 portions
        let mut v = stocked_bistro(1, 10, 40).with_service_minutes(240.0);
        let result = settle_vendor(&mut v, 100, 80, 1, &config).unwrap();

        assert_eq!(result.service_capacity, 60);
        assert_eq!(result.stock_available, 40);
        assert_eq!(result.customers_served, 40);
        assert_eq!(result.revenue, 640.0);
        assert_eq!(result.losses.other, 20);
        assert_eq!(result.losses.capacity, 20);
        assert_eq!(result.losses.stock, 20);
        assert_eq!(v.service_minutes_left, Some(80.0));
        assert!(result.notoriety_after < 0.5);
    }

    #[test]
    fn fully_served_vendor_keeps_notoriety() {
        let config = MarketConfig::default();
        let mut v = stocked_bistro(1, 10, 100);
        let result = settle_vendor(&mut v, 50, 50, 1, &config).unwrap();
        assert_eq!(result.customers_served, 50);
        assert_eq!(result.losses.total(), 0);
        assert_eq!(result.notoriety_after, 0.5);
        assert_eq!(v.inventory.total_portions(1), 50);
    }

    #[test]
    fn corrupted_stock_aborts_before_any_mutation() {
        let config = MarketConfig::default();
        let mut v = stocked_bistro(1, 10, 10).with_service_minutes(1000.0);
        v.inventory.push_unchecked(FinishedLot {
            item: "ghost".into(),
            grade: Grade::G2Canned,
            unit_price: f64::NAN,
            portions: 3,
            production_turn: 1,
            expiry_turn: 3,
        });

        let err = settle_vendor(&mut v, 10, 10, 1, &config).unwrap_err();
        assert!(matches!(err, MarketError::CorruptLot { .. }));
        assert_eq!(v.service_minutes_left, Some(1000.0));
        assert_eq!(v.notoriety, 0.5);
        assert_eq!(v.inventory.total_portions(1), 13);
    }

    #[test]
    fn corrupt_vendor_later_in_order_leaves_earlier_ones_unsold() {
        let config = MarketConfig::default();
        let scenario = Scenario::new("lunch", 100, 1)
            .with_share(Segment::Worker, 1.0)
            .unwrap();
        let mut a = stocked_bistro(1, 10, 100).with_service_minutes(1000.0);
        let mut b = stocked_bistro(2, 10, 100);
        b.inventory.push_unchecked(FinishedLot {
            item: "ghost".into(),
            grade: Grade::G1Fresh,
            unit_price: f64::NAN,
            portions: 1,
            production_turn: 1,
            expiry_turn: 2,
        });

        let err = settle_turn(1, &mut [&mut a, &mut b], &scenario, &config).unwrap_err();
        assert!(matches!(err, MarketError::CorruptLot { .. }));
        assert_eq!(a.inventory.total_portions(1), 100);
        assert_eq!(a.notoriety, 0.5);
        assert_eq!(a.service_minutes_left, Some(1000.0));
    }

    #[test]
    fn begin_turn_discards_expired_and_refills_minutes() {
        let mut v = stocked_bistro(1, 10, 10).with_service_minutes(100.0);
        v.consume_service_minutes(10);
        // lot produced turn 1, shelf 2: last sellable turn 3
        assert_eq!(begin_turn(&mut v, 3), 0);
        assert_eq!(v.service_minutes_left, Some(100.0));
        assert_eq!(begin_turn(&mut v, 4), 10);
        assert!(v.inventory.lots().is_empty());
    }

    #[test]
    fn settle_turn_reports_every_vendor_in_order() {
        let config = MarketConfig::default();
        let scenario = Scenario::new("lunch", 200, 1)
            .with_share(Segment::Worker, 1.0)
            .unwrap();
        let mut a = stocked_bistro(1, 2, 500); // 96 covers
        let mut b = stocked_bistro(2, 2, 500);

        let report = settle_turn(1, &mut [&mut a, &mut b], &scenario, &config).unwrap();
        assert_eq!(report.vendors[0].vendor, a.id);
        assert_eq!(report.vendors[1].vendor, b.id);
        assert_eq!(report.total_demand(), 200);
        assert_eq!(report.total_served(), 192);
        assert_eq!(report.total_unserved(), 8);
        assert_eq!(report.total_revenue(), 192.0 * 16.0);
    }
}
