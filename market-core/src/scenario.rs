use serde::{Deserialize, Serialize};

use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::types::{Customers, Segment, Turn};

/// Market demand profile for a run (one turn = one month).
///
/// Shares are fractions of the total population and are deliberately not
/// normalised: a table summing to 0.8 leaves 20% of the population at home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Potential customers per turn.
    pub population: u64,
    /// Segment shares in declared order. The order matters: see [`demand_in_priority_order`].
    pub segment_shares: Vec<(Segment, f64)>,
    pub turns: Turn,
}

impl Scenario {
    pub fn new(name: impl Into<String>, population: u64, turns: Turn) -> Self {
        Self {
            name: name.into(),
            population,
            segment_shares: Vec::new(),
            turns,
        }
    }

    /// Append a segment share. Duplicates, negative shares and shares whose
    /// demand does not fit in [`Customers`] are rejected.
    pub fn with_share(mut self, segment: Segment, share: f64) -> Result<Self, MarketError> {
        self.check_share(segment, share)?;
        if self.segment_shares.iter().any(|(s, _)| *s == segment) {
            return Err(MarketError::InvalidConfig(format!(
                "segment {} declared twice in scenario `{}`",
                segment.as_str(),
                self.name
            )));
        }
        self.segment_shares.push((segment, share));
        Ok(self)
    }

    /// Re-check every share against the current population.
    pub fn validate(&self) -> Result<(), MarketError> {
        for &(segment, share) in &self.segment_shares {
            self.check_share(segment, share)?;
        }
        Ok(())
    }

    fn check_share(&self, segment: Segment, share: f64) -> Result<(), MarketError> {
        if !share.is_finite() || share < 0.0 {
            return Err(MarketError::InvalidConfig(format!(
                "share for {} must be a non-negative number, got {share}",
                segment.as_str()
            )));
        }
        let demand = rounded_demand(self.population, share);
        if demand > f64::from(Customers::MAX) {
            return Err(MarketError::InvalidConfig(format!(
                "{} demand of {demand} customers in scenario `{}` exceeds {}",
                segment.as_str(),
                self.name,
                Customers::MAX
            )));
        }
        Ok(())
    }

    pub fn share(&self, segment: Segment) -> Option<f64> {
        self.segment_shares
            .iter()
            .find(|(s, _)| *s == segment)
            .map(|(_, share)| *share)
    }
}

// === SEGMENT DEMAND ===

// Ties go to the even neighbour: 2.5 -> 2, 12.5 -> 12.
fn rounded_demand(population: u64, share: f64) -> f64 {
    (population as f64 * share.max(0.0)).round_ties_even()
}

/// Integral customers per segment: `round(population * share)`, in declared order.
///
/// Assumes a scenario that passed [`Scenario::validate`]; larger demand saturates.
pub fn segment_demand(scenario: &Scenario) -> Vec<(Segment, Customers)> {
    scenario
        .segment_shares
        .iter()
        .map(|&(segment, share)| {
            let raw = rounded_demand(scenario.population, share);
            (segment, raw.clamp(0.0, f64::from(Customers::MAX)) as Customers)
        })
        .collect()
}

/// Segment demand in the order segments claim shared capacity.
///
/// With no explicit `segment_priority` this is the scenario's declared order.
/// Otherwise the listed segments go first (in listed order), then the rest in
/// declared order. Segments listed but absent from the scenario are ignored.
pub fn demand_in_priority_order(
    scenario: &Scenario,
    config: &MarketConfig,
) -> Vec<(Segment, Customers)> {
    let demand = segment_demand(scenario);
    let Some(priority) = &config.segment_priority else {
        return demand;
    };

    let mut ordered: Vec<(Segment, Customers)> = priority
        .iter()
        .filter_map(|seg| demand.iter().find(|(s, _)| s == seg).copied())
        .collect();
    for entry in &demand {
        if !priority.contains(&entry.0) {
            ordered.push(*entry);
        }
    }
    ordered
}
