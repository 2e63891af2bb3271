use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::types::{Concept, Price, Segment};

// === DEFAULTS ===

pub const DEFAULT_BUDGET_TOLERANCE: f64 = 1.20;
pub const DEFAULT_CANNIBALIZATION_ALPHA: f64 = 0.5;
pub const DEFAULT_CONCEPT_FIT: f64 = 0.6;
pub const DEFAULT_SEGMENT_BUDGET: Price = 15.0;
pub const DEFAULT_VISIBILITY_SCALE: f64 = 5.0;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Blend weights of the attraction score terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Concept <-> segment structural fit.
    pub fit: f64,
    /// Menu price against segment budget.
    pub price: f64,
    /// Perceived menu quality (recipes, grade expectations, staff).
    pub quality: f64,
    pub notoriety: f64,
    /// Location visibility.
    pub visibility: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            fit: 0.25,
            price: 0.25,
            quality: 0.25,
            notoriety: 0.15,
            visibility: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.fit + self.price + self.quality + self.notoriety + self.visibility
    }

    fn validate(&self) -> Result<(), MarketError> {
        let all = [
            ("fit", self.fit),
            ("price", self.price),
            ("quality", self.quality),
            ("notoriety", self.notoriety),
            ("visibility", self.visibility),
        ];
        for (name, w) in all {
            if !w.is_finite() || w < 0.0 {
                return Err(MarketError::InvalidConfig(format!(
                    "weight `{name}` must be a non-negative number, got {w}"
                )));
            }
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MarketError::InvalidConfig(format!(
                "scoring weights must sum to 1, got {:.6}",
                self.sum()
            )));
        }
        Ok(())
    }
}

/// Static concept x segment fit lookup. Missing pairs read as [`DEFAULT_CONCEPT_FIT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptFitTable(pub BTreeMap<Concept, BTreeMap<Segment, f64>>);

impl ConceptFitTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, concept: Concept, segment: Segment) -> f64 {
        self.0
            .get(&concept)
            .and_then(|row| row.get(&segment))
            .copied()
            .unwrap_or(DEFAULT_CONCEPT_FIT)
            .clamp(0.0, 1.0)
    }

    pub fn set(&mut self, concept: Concept, segment: Segment, fit: f64) {
        self.0.entry(concept).or_default().insert(segment, fit);
    }
}

impl Default for ConceptFitTable {
    fn default() -> Self {
        use Segment::*;
        let rows = [
            (
                Concept::FastFood,
                [(Student, 0.90), (Worker, 0.60), (Family, 0.60), (Tourist, 0.50), (Senior, 0.40)],
            ),
            (
                Concept::Bistro,
                [(Student, 0.60), (Worker, 0.80), (Family, 0.75), (Tourist, 0.70), (Senior, 0.70)],
            ),
            (
                Concept::FineDining,
                [(Student, 0.30), (Worker, 0.60), (Family, 0.70), (Tourist, 0.85), (Senior, 0.80)],
            ),
        ];
        let mut table = Self::empty();
        for (concept, row) in rows {
            for (segment, fit) in row {
                table.set(concept, segment, fit);
            }
        }
        table
    }
}

/// Tunables of the demand settlement core.
///
/// Every field has a documented default; gaps in the fit table or budgets
/// fall back to neutral values at lookup time rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Median menu price may exceed the segment budget by this factor before
    /// the vendor becomes ineligible (1.20 = 20% over budget tolerated).
    pub budget_tolerance: f64,
    /// Strength of the same-concept score dilution.
    pub cannibalization_alpha: f64,
    /// Service periods per day (lunch + dinner).
    pub service_periods_per_day: u32,
    /// Days in one turn.
    pub days_per_turn: u32,
    /// Raw visibility values are divided by this to land in [0, 1].
    pub visibility_scale: f64,
    /// Budget used for a segment missing from `segment_budgets`.
    pub default_segment_budget: Price,
    pub segment_budgets: BTreeMap<Segment, Price>,
    pub weights: ScoringWeights,
    pub concept_fit: ConceptFitTable,
    /// Explicit segment processing order under scarce capacity. Segments not
    /// listed keep the scenario's declared order after the listed ones.
    pub segment_priority: Option<Vec<Segment>>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            budget_tolerance: DEFAULT_BUDGET_TOLERANCE,
            cannibalization_alpha: DEFAULT_CANNIBALIZATION_ALPHA,
            service_periods_per_day: 2,
            days_per_turn: 30,
            visibility_scale: DEFAULT_VISIBILITY_SCALE,
            default_segment_budget: DEFAULT_SEGMENT_BUDGET,
            segment_budgets: Segment::all().map(|s| (s, s.default_budget())).collect(),
            weights: ScoringWeights::default(),
            concept_fit: ConceptFitTable::default(),
            segment_priority: None,
        }
    }
}

impl MarketConfig {
    /// Parse and validate a configuration document. Absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, MarketError> {
        let config: MarketConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MarketError> {
        if !self.budget_tolerance.is_finite() || self.budget_tolerance <= 0.0 {
            return Err(MarketError::InvalidConfig(format!(
                "budget_tolerance must be positive, got {}",
                self.budget_tolerance
            )));
        }
        if !self.cannibalization_alpha.is_finite() || self.cannibalization_alpha < 0.0 {
            return Err(MarketError::InvalidConfig(format!(
                "cannibalization_alpha must be non-negative, got {}",
                self.cannibalization_alpha
            )));
        }
        if !self.visibility_scale.is_finite() || self.visibility_scale <= 0.0 {
            return Err(MarketError::InvalidConfig(format!(
                "visibility_scale must be positive, got {}",
                self.visibility_scale
            )));
        }
        for (segment, budget) in &self.segment_budgets {
            if !budget.is_finite() || *budget <= 0.0 {
                return Err(MarketError::InvalidConfig(format!(
                    "budget for {} must be positive, got {budget}",
                    segment.as_str()
                )));
            }
        }
        for (concept, row) in &self.concept_fit.0 {
            for (segment, fit) in row {
                if !(0.0..=1.0).contains(fit) {
                    return Err(MarketError::InvalidConfig(format!(
                        "fit {}/{} must lie in [0, 1], got {fit}",
                        concept.as_str(),
                        segment.as_str()
                    )));
                }
            }
        }
        self.weights.validate()
    }

    pub fn segment_budget(&self, segment: Segment) -> Price {
        self.segment_budgets
            .get(&segment)
            .copied()
            .unwrap_or(self.default_segment_budget)
    }

    /// Seat turnovers available in one turn, before the concept coefficient.
    pub fn services_per_turn(&self) -> u64 {
        u64::from(self.service_periods_per_day) * u64::from(self.days_per_turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = MarketConfig::default();
        config.validate().unwrap();
        assert!((config.weights.sum() - 1.0).abs() < 1e-12);
        assert_eq!(config.services_per_turn(), 60);
    }

    #[test]
    fn missing_fit_entries_fall_back_to_neutral() {
        let table = ConceptFitTable::empty();
        assert_eq!(table.get(Concept::Bistro, Segment::Senior), DEFAULT_CONCEPT_FIT);
        assert_eq!(
            ConceptFitTable::default().get(Concept::FastFood, Segment::Student),
            0.90
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MarketConfig::from_json(
            r#"{ "budget_tolerance": 1.5, "segment_priority": ["tourist", "student"] }"#,
        )
        .unwrap();
        assert_eq!(config.budget_tolerance, 1.5);
        assert_eq!(config.cannibalization_alpha, DEFAULT_CANNIBALIZATION_ALPHA);
        assert_eq!(
            config.segment_priority,
            Some(vec![Segment::Tourist, Segment::Student])
        );
        assert_eq!(config.segment_budget(Segment::Family), 55.0);
    }

    #[test]
    fn json_fit_table_overrides_pairs() {
        let config = MarketConfig::from_json(
            r#"{ "concept_fit": { "bistro": { "senior": 0.95 } } }"#,
        )
        .unwrap();
        assert_eq!(config.concept_fit.get(Concept::Bistro, Segment::Senior), 0.95);
        // replaced table: other pairs read the neutral default
        assert_eq!(
            config.concept_fit.get(Concept::FastFood, Segment::Student),
            DEFAULT_CONCEPT_FIT
        );
    }

    #[test]
    fn weights_must_sum_to_one() {
        let err = MarketConfig::from_json(r#"{ "weights": { "fit": 0.9 } }"#).unwrap_err();
        assert!(matches!(err, MarketError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = MarketConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, MarketError::ConfigJson(_)));
    }
}
