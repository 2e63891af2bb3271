// Market state: the competing vendors of one simulation run

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::agents::Vendor;
use crate::config::MarketConfig;
use crate::demand::estimate_lost_customers;
use crate::error::MarketError;
use crate::scenario::Scenario;
use crate::turn::{TurnReport, begin_turn, settle_turn, validate_turn};
use crate::types::{Concept, Turn, VendorId};

/// Vendor registry plus the turn clock.
///
/// The roster fixes processing order: vendors settle in the order they were
/// added, whatever the slot map's internal layout.
#[derive(Debug, Clone)]
pub struct Market {
    pub turn: Turn,
    config: MarketConfig,
    vendors: SlotMap<VendorId, Vendor>,
    roster: Vec<VendorId>,
}

impl Default for Market {
    fn default() -> Self {
        Self {
            turn: 0,
            config: MarketConfig::default(),
            vendors: SlotMap::with_key(),
            roster: Vec::new(),
        }
    }
}

impl Market {
    pub fn new(config: MarketConfig) -> Result<Self, MarketError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    // === Vendor Management ===

    /// Add a vendor with default attributes, returns its ID
    pub fn add_vendor(&mut self, name: impl Into<String>, concept: Concept, seats: u32) -> VendorId {
        let name = name.into();
        self.insert_with(|id| Vendor::new(id, name, concept, seats))
    }

    /// Add a vendor built from its freshly minted ID.
    ///
    /// The returned ID wins over whatever the closure stored in `Vendor::id`.
    pub fn insert_with(&mut self, build: impl FnOnce(VendorId) -> Vendor) -> VendorId {
        let id = self.vendors.insert_with_key(|id| {
            let mut vendor = build(id);
            vendor.id = id;
            vendor
        });
        self.roster.push(id);
        id
    }

    pub fn vendor(&self, id: VendorId) -> Option<&Vendor> {
        self.vendors.get(id)
    }

    pub fn vendor_mut(&mut self, id: VendorId) -> Option<&mut Vendor> {
        self.vendors.get_mut(id)
    }

    pub fn remove_vendor(&mut self, id: VendorId) -> Result<Vendor, MarketError> {
        let vendor = self.vendors.remove(id).ok_or(MarketError::UnknownVendor(id))?;
        self.roster.retain(|v| *v != id);
        Ok(vendor)
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn roster(&self) -> &[VendorId] {
        &self.roster
    }

    /// Vendors in processing order
    pub fn vendors_in_order(&self) -> Vec<&Vendor> {
        self.roster.iter().filter_map(|id| self.vendors.get(*id)).collect()
    }

    fn vendors_in_order_mut(&mut self) -> Vec<&mut Vendor> {
        let mut by_id: HashMap<VendorId, &mut Vendor> = self.vendors.iter_mut().collect();
        self.roster.iter().filter_map(|id| by_id.remove(id)).collect()
    }

    /// Customers the current market would leave unserved for `scenario`.
    pub fn estimate_lost_customers(&self, scenario: &Scenario) -> u64 {
        estimate_lost_customers(&self.vendors_in_order(), scenario, &self.config)
    }

    // === Turn Processing ===

    /// Advance one turn.
    ///
    /// A turn that would fail (corrupt stock, invalid scenario) is rejected
    /// before anything moves, clock included.
    ///
    /// 0. Advance the turn counter
    /// 1. Expiry cleanup and service-minute refill for every vendor
    /// 2. Allocation and capacity clamp across the market
    /// 3. Per-vendor settlement in roster order
    pub fn run_turn(&mut self, scenario: &Scenario) -> Result<TurnReport, MarketError> {
        let config = self.config.clone();
        let turn = self.turn + 1;

        let mut vendors = self.vendors_in_order_mut();
        validate_turn(&vendors, scenario)?;

        // === 1. PRE-TURN PHASE ===
        for vendor in vendors.iter_mut() {
            begin_turn(vendor, turn);
        }

        // === 2-3. SETTLEMENT PHASE ===
        let report = settle_turn(turn, &mut vendors, scenario, &config)?;
        self.turn = turn;
        Ok(report)
    }

    /// Play every turn of `scenario`, stopping at the first failure.
    pub fn run(&mut self, scenario: &Scenario) -> Result<Vec<TurnReport>, MarketError> {
        (0..scenario.turns).map(|_| self.run_turn(scenario)).collect()
    }
}
