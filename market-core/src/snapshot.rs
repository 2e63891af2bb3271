use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agents::Vendor;
use crate::market::Market;
use crate::turn::{TurnReport, VendorTurnResult};
use crate::types::{Concept, Customers, KeyToU64, Portions, Price, Segment, Turn};

// ============================================================================
// Serializable snapshots for JS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct VendorSnapshot {
    pub id: u64,
    pub name: String,
    pub concept: Concept,
    pub seats: u32,
    pub median_price: Price,
    pub notoriety: f64,
    pub staff_satisfaction: f64,
    pub service_minutes_left: Option<f64>,
    pub stock_portions: Portions,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct MarketSnapshot {
    pub turn: Turn,
    pub vendors: Vec<VendorSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct VendorResultSnapshot {
    pub vendor: u64,
    pub customers_allocated: Customers,
    pub capacity: Customers,
    pub service_capacity: Customers,
    pub stock_available: Portions,
    pub customers_served: Customers,
    pub revenue: Price,
    pub lost_stock: Customers,
    pub lost_capacity: Customers,
    pub lost_other: Customers,
    pub notoriety_after: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TurnSnapshot {
    pub turn: Turn,
    pub segment_demand: Vec<(Segment, Customers)>,
    pub unserved: Vec<(Segment, Customers)>,
    pub vendors: Vec<VendorResultSnapshot>,
    pub total_revenue: Price,
}

impl VendorSnapshot {
    pub fn capture(vendor: &Vendor, turn: Turn) -> Self {
        Self {
            id: vendor.id.to_u64(),
            name: vendor.name.clone(),
            concept: vendor.concept(),
            seats: vendor.seats,
            median_price: vendor.median_price(),
            notoriety: vendor.notoriety,
            staff_satisfaction: vendor.staff_satisfaction,
            service_minutes_left: vendor.service_minutes_left,
            stock_portions: vendor.inventory.total_portions(turn),
        }
    }
}

impl From<&Market> for MarketSnapshot {
    fn from(market: &Market) -> Self {
        Self {
            turn: market.turn,
            vendors: market
                .vendors_in_order()
                .into_iter()
                .map(|v| VendorSnapshot::capture(v, market.turn))
                .collect(),
        }
    }
}

impl From<&VendorTurnResult> for VendorResultSnapshot {
    fn from(r: &VendorTurnResult) -> Self {
        Self {
            vendor: r.vendor.to_u64(),
            customers_allocated: r.customers_allocated,
            capacity: r.capacity,
            service_capacity: r.service_capacity,
            stock_available: r.stock_available,
            customers_served: r.customers_served,
            revenue: r.revenue,
            lost_stock: r.losses.stock,
            lost_capacity: r.losses.capacity,
            lost_other: r.losses.other,
            notoriety_after: r.notoriety_after,
        }
    }
}

impl From<&TurnReport> for TurnSnapshot {
    fn from(report: &TurnReport) -> Self {
        Self {
            turn: report.turn,
            segment_demand: report.segment_demand.clone(),
            unserved: report.unserved_by_segment.clone(),
            vendors: report.vendors.iter().map(VendorResultSnapshot::from).collect(),
            total_revenue: report.total_revenue(),
        }
    }
}
