use crate::agents::FinishedGoodsInventory;
use crate::error::MarketError;
use crate::types::{Concept, Customers, Grade, Price, VendorId};

// === DEFAULTS ===

pub const DEFAULT_NOTORIETY: f64 = 0.5;
/// Mid-scale visibility (raw scale 0..5).
pub const DEFAULT_VISIBILITY: f64 = 2.5;
pub const DEFAULT_STAFF_SATISFACTION: f64 = 1.0;

/// A priced dish on a vendor's menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub name: String,
    pub price: Price,
    /// Intrinsic recipe quality in [0, 1].
    pub quality: f64,
    /// Dominant ingredient grade, if known. Drives concept expectation multipliers.
    pub grade_hint: Option<Grade>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, price: Price, quality: f64) -> Result<Self, MarketError> {
        let name = name.into();
        if !price.is_finite() || price < 0.0 {
            return Err(MarketError::InvalidMenuItem {
                name,
                reason: format!("price must be a non-negative number, got {price}"),
            });
        }
        if !(0.0..=1.0).contains(&quality) {
            return Err(MarketError::InvalidMenuItem {
                name,
                reason: format!("quality must lie in [0, 1], got {quality}"),
            });
        }
        Ok(Self {
            name,
            price,
            quality,
            grade_hint: None,
        })
    }

    pub fn with_grade_hint(mut self, grade: Grade) -> Self {
        self.grade_hint = Some(grade);
        self
    }
}

/// A competing restaurant.
///
/// Every field is populated at construction; readers never probe for
/// missing attributes. Notoriety, service minutes and inventory are mutated
/// once per turn by the settlement core.
#[derive(Debug, Clone, PartialEq)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    concept: Concept,
    /// Physical seats of the premises.
    pub seats: u32,
    pub menu: Vec<MenuItem>,
    /// Reputation in [0, 1].
    pub notoriety: f64,
    /// Raw location visibility, normalised by `MarketConfig::visibility_scale`.
    pub visibility: f64,
    /// Staff satisfaction in [0, 1]; scales perceived quality.
    pub staff_satisfaction: f64,
    /// Front-of-house minutes the staff roster provides per turn. `None` = unbounded.
    pub service_minutes_budget: Option<f64>,
    /// Minutes left in the current turn. `None` = unbounded.
    pub service_minutes_left: Option<f64>,
    pub inventory: FinishedGoodsInventory,
}

impl Vendor {
    pub fn new(id: VendorId, name: impl Into<String>, concept: Concept, seats: u32) -> Self {
        Self {
            id,
            name: name.into(),
            concept,
            seats,
            menu: Vec::new(),
            notoriety: DEFAULT_NOTORIETY,
            visibility: DEFAULT_VISIBILITY,
            staff_satisfaction: DEFAULT_STAFF_SATISFACTION,
            service_minutes_budget: None,
            service_minutes_left: None,
            inventory: FinishedGoodsInventory::default(),
        }
    }

    pub fn with_menu(mut self, menu: Vec<MenuItem>) -> Self {
        self.menu = menu;
        self
    }

    pub fn with_notoriety(mut self, notoriety: f64) -> Self {
        self.notoriety = notoriety.clamp(0.0, 1.0);
        self
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = visibility.max(0.0);
        self
    }

    pub fn with_staff_satisfaction(mut self, satisfaction: f64) -> Self {
        self.staff_satisfaction = satisfaction.clamp(0.0, 1.0);
        self
    }

    /// Bound front-of-house throughput by a per-turn staff minute budget.
    pub fn with_service_minutes(mut self, minutes_per_turn: f64) -> Self {
        let minutes = minutes_per_turn.max(0.0);
        self.service_minutes_budget = Some(minutes);
        self.service_minutes_left = Some(minutes);
        self
    }

    pub fn with_inventory(mut self, inventory: FinishedGoodsInventory) -> Self {
        self.inventory = inventory;
        self
    }

    /// Concept is fixed for the vendor's lifetime.
    pub fn concept(&self) -> Concept {
        self.concept
    }

    /// Median menu price; an empty menu prices at 0.
    pub fn median_price(&self) -> Price {
        let mut prices: Vec<Price> = self.menu.iter().map(|item| item.price).collect();
        if prices.is_empty() {
            return 0.0;
        }
        prices.sort_by(|a, b| a.total_cmp(b));
        let mid = prices.len() / 2;
        if prices.len() % 2 == 1 {
            prices[mid]
        } else {
            0.5 * (prices[mid - 1] + prices[mid])
        }
    }

    /// Turn-start hook: refill service minutes from the staff budget.
    pub fn reset_service_minutes(&mut self) {
        self.service_minutes_left = self.service_minutes_budget;
    }

    /// Charge the minutes needed to serve `customers`. No-op when unbounded.
    pub fn consume_service_minutes(&mut self, customers: Customers) {
        let needed = f64::from(customers) * self.concept.minutes_per_cover();
        if let Some(left) = self.service_minutes_left.as_mut() {
            *left = (*left - needed).max(0.0);
        }
    }

    /// Share of the turn's service budget already consumed, if bounded.
    pub fn service_utilization(&self) -> Option<f64> {
        let budget = self.service_minutes_budget?;
        let left = self.service_minutes_left.unwrap_or(budget);
        if budget <= 0.0 {
            return Some(0.0);
        }
        Some(((budget - left) / budget).clamp(0.0, 1.0))
    }

    /// Drift staff satisfaction with service load: overwork and idleness both hurt.
    pub fn update_staff_satisfaction(&mut self) {
        let Some(ratio) = self.service_utilization() else {
            return;
        };
        let delta = if ratio > 0.95 {
            -0.06
        } else if ratio > 0.85 {
            -0.03
        } else if ratio < 0.35 {
            -0.02
        } else if ratio < 0.55 {
            0.01
        } else {
            0.02
        };
        self.staff_satisfaction = (self.staff_satisfaction + delta).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: Price) -> MenuItem {
        MenuItem::new(format!("dish@{price}"), price, 0.7).unwrap()
    }

    fn bistro() -> Vendor {
        Vendor::new(VendorId::from_u64(1), "Chez Test", Concept::Bistro, 30)
    }

    #[test]
    fn construction_assigns_defaults() {
        let v = bistro();
        assert_eq!(v.notoriety, DEFAULT_NOTORIETY);
        assert_eq!(v.visibility, DEFAULT_VISIBILITY);
        assert_eq!(v.staff_satisfaction, DEFAULT_STAFF_SATISFACTION);
        assert!(v.service_minutes_left.is_none());
        assert_eq!(v.inventory.lots().len(), 0);
    }

    #[test]
    fn median_price_handles_odd_even_and_empty() {
        assert_eq!(bistro().median_price(), 0.0);
        let odd = bistro().with_menu(vec![item(14.0), item(9.0), item(30.0)]);
        assert_eq!(odd.median_price(), 14.0);
        let even = bistro().with_menu(vec![item(10.0), item(20.0), item(12.0), item(16.0)]);
        assert_eq!(even.median_price(), 14.0);
    }

    #[test]
    fn invalid_menu_items_are_rejected() {
        assert!(MenuItem::new("free lunch", -1.0, 0.5).is_err());
        assert!(MenuItem::new("perfect", 10.0, 1.2).is_err());
        assert!(MenuItem::new("nan", f64::NAN, 0.5).is_err());
    }

    #[test]
    fn service_minutes_consume_and_reset() {
        let mut v = bistro().with_service_minutes(100.0);
        v.consume_service_minutes(10); // 10 x 4.0
        assert_eq!(v.service_minutes_left, Some(60.0));
        v.consume_service_minutes(1000);
        assert_eq!(v.service_minutes_left, Some(0.0));
        v.reset_service_minutes();
        assert_eq!(v.service_minutes_left, Some(100.0));

        let mut unbounded = bistro();
        unbounded.consume_service_minutes(1000);
        assert!(unbounded.service_minutes_left.is_none());
    }

    #[test]
    fn satisfaction_drifts_with_load() {
        let mut overworked = bistro().with_service_minutes(100.0).with_staff_satisfaction(0.8);
        overworked.consume_service_minutes(25); // 100% used
        overworked.update_staff_satisfaction();
        assert!((overworked.staff_satisfaction - 0.74).abs() < 1e-9);

        let mut comfortable = bistro().with_service_minutes(100.0).with_staff_satisfaction(0.8);
        comfortable.consume_service_minutes(15); // 60% used
        comfortable.update_staff_satisfaction();
        assert!((comfortable.staff_satisfaction - 0.82).abs() < 1e-9);

        let mut unbounded = bistro().with_staff_satisfaction(0.8);
        unbounded.update_staff_satisfaction();
        assert_eq!(unbounded.staff_satisfaction, 0.8);
    }
}
