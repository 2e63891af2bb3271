use crate::agents::Vendor;
use crate::config::MarketConfig;
use crate::types::{Price, Segment};

// === ELIGIBILITY ===

/// Hard budget gate: the median menu price must not exceed the segment
/// budget times the tolerance. An empty menu prices at 0 and always passes.
pub fn is_eligible(vendor: &Vendor, segment: Segment, config: &MarketConfig) -> bool {
    vendor.median_price() <= config.segment_budget(segment) * config.budget_tolerance
}

// === SCORE TERMS ===

/// 1.0 at or under budget, then linear decay reaching 0 at twice the budget.
pub fn price_fit(price: Price, budget: Price) -> f64 {
    if budget <= 0.0 {
        return 0.0;
    }
    if price <= budget {
        return 1.0;
    }
    let gap = (price - budget) / budget;
    (1.0 - gap).clamp(0.0, 1.0)
}

/// Mean recipe quality, adjusted for what the concept expects of each item's
/// ingredient grade, scaled by staff satisfaction. Empty menu scores 0.
pub fn perceived_quality(vendor: &Vendor) -> f64 {
    if vendor.menu.is_empty() {
        return 0.0;
    }
    let concept = vendor.concept();
    let total: f64 = vendor
        .menu
        .iter()
        .map(|item| (item.quality * concept.grade_expectation(item.grade_hint)).clamp(0.0, 1.0))
        .sum();
    let mean = total / vendor.menu.len() as f64;
    (mean * vendor.staff_satisfaction.clamp(0.0, 1.0)).clamp(0.0, 1.0)
}

pub fn normalized_visibility(vendor: &Vendor, config: &MarketConfig) -> f64 {
    (vendor.visibility / config.visibility_scale).clamp(0.0, 1.0)
}

/// Individual attraction terms, each already clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTerms {
    pub fit: f64,
    pub price: f64,
    pub quality: f64,
    pub notoriety: f64,
    pub visibility: f64,
}

impl ScoreTerms {
    pub fn blend(&self, config: &MarketConfig) -> f64 {
        let w = &config.weights;
        let score = w.fit * self.fit
            + w.price * self.price
            + w.quality * self.quality
            + w.notoriety * self.notoriety
            + w.visibility * self.visibility;
        score.clamp(0.0, 1.0)
    }
}

pub fn score_terms(vendor: &Vendor, segment: Segment, config: &MarketConfig) -> ScoreTerms {
    ScoreTerms {
        fit: config.concept_fit.get(vendor.concept(), segment),
        price: price_fit(vendor.median_price(), config.segment_budget(segment)),
        quality: perceived_quality(vendor),
        notoriety: vendor.notoriety.clamp(0.0, 1.0),
        visibility: normalized_visibility(vendor, config),
    }
}

/// Raw attraction of `vendor` for `segment`, in [0, 1]. Does not apply the
/// eligibility gate or cannibalization.
pub fn attraction_score(vendor: &Vendor, segment: Segment, config: &MarketConfig) -> f64 {
    score_terms(vendor, segment, config).blend(config)
}
