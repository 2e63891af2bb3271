use std::collections::HashMap;

use crate::agents::Vendor;
use crate::types::Concept;

/// Number of competing vendors per concept.
pub fn concept_counts<'a>(vendors: impl IntoIterator<Item = &'a Vendor>) -> HashMap<Concept, usize> {
    let mut counts = HashMap::new();
    for vendor in vendors {
        *counts.entry(vendor.concept()).or_insert(0) += 1;
    }
    counts
}

/// Score dampening for a vendor sharing its concept with `same_concept - 1` rivals.
///
/// `1 / max(1, sqrt(1 + alpha * (n - 1)))`: 1.0 for a sole representative,
/// decreasing and saturating with `n`, never reaching zero.
pub fn cannibalization_factor(same_concept: usize, alpha: f64) -> f64 {
    if same_concept <= 1 {
        return 1.0;
    }
    let rivals = (same_concept - 1) as f64;
    1.0 / (1.0 + alpha.max(0.0) * rivals).sqrt().max(1.0)
}

/// Factor for `vendor` given the market's concept counts.
pub fn factor_for(vendor: &Vendor, counts: &HashMap<Concept, usize>, alpha: f64) -> f64 {
    let n = counts.get(&vendor.concept()).copied().unwrap_or(1);
    cannibalization_factor(n, alpha)
}
