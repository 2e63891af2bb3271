//! Per-turn demand settlement for a restaurant market.
//!
//! Each turn a scenario's population is split into segments, matched to
//! eligible vendors by attraction score, bounded by seat turnover, staff
//! minutes and finished-goods stock, and any unmet demand is attributed to a
//! cause that feeds back into the vendor's notoriety.
//!
//! Pipeline: [`scenario::segment_demand`] -> [`demand::scoring`] ->
//! [`demand::cannibalization`] -> [`demand::allocate_demand`] ->
//! [`capacity`] -> [`agents::FinishedGoodsInventory`] -> [`losses`].

use wasm_bindgen::prelude::*;

pub mod agents;
pub mod capacity;
pub mod config;
pub mod demand;
pub mod error;
pub mod losses;
pub mod market;
pub mod scenario;
pub mod snapshot;
pub mod turn;
pub mod types;

#[cfg(feature = "instrument")]
pub use instrument;

pub use agents::{FinishedGoodsInventory, FinishedLot, MenuItem, Sale, SaleLine, Vendor};
pub use capacity::{clamp_capacity, exploitable_capacity, service_capacity};
pub use config::{ConceptFitTable, MarketConfig, ScoringWeights};
pub use demand::{AllocationReport, allocate_demand, allocate_demand_report, estimate_lost_customers};
pub use error::MarketError;
pub use losses::{LossBreakdown, apply_notoriety_penalty, attribute_losses};
pub use market::Market;
pub use scenario::{Scenario, segment_demand};
pub use snapshot::*;
pub use turn::{TurnReport, VendorTurnResult, begin_turn, settle_turn, settle_vendor, validate_turn};
pub use types::*;

// ============================================================================
// WASM API - Market simulation
// ============================================================================

#[wasm_bindgen]
pub struct MarketSim {
    market: Market,
    scenario: Scenario,
    last_report: Option<TurnReport>,
}

#[wasm_bindgen]
impl MarketSim {
    #[wasm_bindgen(constructor)]
    pub fn new(population: u64) -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Self {
            market: Market::default(),
            scenario: Scenario::new("browser", population, 0),
            last_report: None,
        }
    }

    /// Build from a partial `MarketConfig` object; absent fields keep their defaults.
    #[wasm_bindgen]
    pub fn with_config(population: u64, config: JsValue) -> Result<MarketSim, JsError> {
        console_error_panic_hook::set_once();

        let config: MarketConfig = serde_wasm_bindgen::from_value(config)?;
        Ok(Self {
            market: Market::new(config)?,
            scenario: Scenario::new("browser", population, 0),
            last_report: None,
        })
    }

    #[wasm_bindgen]
    pub fn set_segment_share(&mut self, segment: Segment, share: f64) -> Result<(), JsError> {
        let mut scenario = self.scenario.clone();
        scenario.segment_shares.retain(|(s, _)| *s != segment);
        self.scenario = scenario.with_share(segment, share)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn add_vendor(&mut self, name: String, concept: Concept, seats: u32) -> u64 {
        self.market.add_vendor(name, concept, seats).to_u64()
    }

    #[wasm_bindgen]
    pub fn add_menu_item(
        &mut self,
        vendor: u64,
        name: String,
        price: f64,
        quality: f64,
        grade_hint: Option<Grade>,
    ) -> Result<(), JsError> {
        let mut item = MenuItem::new(name, price, quality)?;
        if let Some(grade) = grade_hint {
            item = item.with_grade_hint(grade);
        }
        self.vendor_mut(vendor)?.menu.push(item);
        Ok(())
    }

    /// Stock a lot produced this turn, sellable for `shelf_turns` more turns.
    #[wasm_bindgen]
    pub fn add_lot(
        &mut self,
        vendor: u64,
        item: String,
        grade: Grade,
        unit_price: f64,
        portions: u32,
        shelf_turns: u32,
    ) -> Result<(), JsError> {
        let lot = FinishedLot::new(item, grade, unit_price, portions, self.market.turn, shelf_turns)?;
        self.vendor_mut(vendor)?.inventory.add_lot(lot);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_service_minutes(&mut self, vendor: u64, minutes_per_turn: f64) -> Result<(), JsError> {
        let v = self.vendor_mut(vendor)?;
        let minutes = minutes_per_turn.max(0.0);
        v.service_minutes_budget = Some(minutes);
        v.service_minutes_left = Some(minutes);
        Ok(())
    }

    /// Settle one turn and return its summary
    #[wasm_bindgen]
    pub fn advance_turn(&mut self) -> Result<TurnSnapshot, JsError> {
        let report = self.market.run_turn(&self.scenario)?;
        let snapshot = TurnSnapshot::from(&report);
        self.last_report = Some(report);
        Ok(snapshot)
    }

    #[wasm_bindgen]
    pub fn get_turn(&self) -> u32 {
        self.market.turn
    }

    #[wasm_bindgen]
    pub fn last_turn(&self) -> Option<TurnSnapshot> {
        self.last_report.as_ref().map(TurnSnapshot::from)
    }

    #[wasm_bindgen]
    pub fn get_state_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot::from(&self.market)
    }

    #[wasm_bindgen]
    pub fn estimate_lost_customers(&self) -> u64 {
        self.market.estimate_lost_customers(&self.scenario)
    }
}

impl MarketSim {
    fn vendor_mut(&mut self, raw: u64) -> Result<&mut Vendor, JsError> {
        let id = VendorId::from_u64(raw);
        self.market
            .vendor_mut(id)
            .ok_or_else(|| JsError::from(MarketError::UnknownVendor(id)))
    }
}
