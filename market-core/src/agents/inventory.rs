// Finished-goods inventory: perishable lots of ready-to-sell portions

use crate::error::MarketError;
use crate::types::{Grade, Portions, Price, Turn};

/// A batch of ready-to-sell portions from one production run.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedLot {
    pub item: String,
    pub grade: Grade,
    pub unit_price: Price,
    pub portions: Portions,
    pub production_turn: Turn,
    /// Last turn the lot can be sold.
    pub expiry_turn: Turn,
}

impl FinishedLot {
    /// New lot sellable from `production_turn` through `production_turn + shelf_turns`.
    pub fn new(
        item: impl Into<String>,
        grade: Grade,
        unit_price: Price,
        portions: Portions,
        production_turn: Turn,
        shelf_turns: Turn,
    ) -> Result<Self, MarketError> {
        let lot = Self {
            item: item.into(),
            grade,
            unit_price,
            portions,
            production_turn,
            expiry_turn: production_turn.saturating_add(shelf_turns),
        };
        lot.check().map_err(|reason| MarketError::InvalidLot {
            item: lot.item.clone(),
            reason,
        })?;
        Ok(lot)
    }

    pub fn is_expired(&self, turn: Turn) -> bool {
        turn > self.expiry_turn
    }

    fn check(&self) -> Result<(), String> {
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(format!(
                "unit price must be a non-negative number, got {}",
                self.unit_price
            ));
        }
        if self.expiry_turn < self.production_turn {
            return Err(format!(
                "expires at turn {} before its production turn {}",
                self.expiry_turn, self.production_turn
            ));
        }
        Ok(())
    }
}

/// Portions taken from one lot during a sale.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub item: String,
    pub grade: Grade,
    pub units: Portions,
    pub unit_price: Price,
}

/// Outcome of depleting finished goods for a turn's customers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sale {
    pub units: Portions,
    /// Each unit at its own lot's price, unrounded.
    pub revenue: Price,
    pub lines: Vec<SaleLine>,
}

/// Ordered collection of finished lots.
///
/// Lots with zero portions never survive a sale; expired lots are dropped
/// by [`FinishedGoodsInventory::cleanup_expired`] at turn start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinishedGoodsInventory {
    lots: Vec<FinishedLot>,
}

impl FinishedGoodsInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lot(&mut self, lot: FinishedLot) {
        if lot.portions > 0 {
            self.lots.push(lot);
        }
    }

    /// Insert a lot without validation. Only for simulating upstream corruption.
    #[doc(hidden)]
    pub fn push_unchecked(&mut self, lot: FinishedLot) {
        self.lots.push(lot);
    }

    pub fn lots(&self) -> &[FinishedLot] {
        &self.lots
    }

    /// Sellable portions at `turn`, saturating at `Portions::MAX`.
    pub fn total_portions(&self, turn: Turn) -> Portions {
        let total: u64 = self
            .lots
            .iter()
            .filter(|lot| !lot.is_expired(turn))
            .map(|lot| u64::from(lot.portions))
            .sum();
        Portions::try_from(total).unwrap_or(Portions::MAX)
    }

    /// Fail on the first corrupted lot. Never mutates.
    pub fn validate(&self) -> Result<(), MarketError> {
        for lot in &self.lots {
            lot.check().map_err(|reason| MarketError::CorruptLot {
                item: lot.item.clone(),
                production_turn: lot.production_turn,
                reason,
            })?;
        }
        Ok(())
    }

    /// Drop expired and empty lots. Returns the number of portions discarded.
    pub fn cleanup_expired(&mut self, turn: Turn) -> Portions {
        let mut discarded: Portions = 0;
        self.lots.retain(|lot| {
            if lot.is_expired(turn) {
                discarded = discarded.saturating_add(lot.portions);
                false
            } else {
                lot.portions > 0
            }
        });
        discarded
    }

    /// Distinct grades still sellable at `turn`, best first.
    pub fn available_grades(&self, turn: Turn) -> Vec<Grade> {
        let mut grades = Vec::new();
        for idx in self.sale_order(turn) {
            let grade = self.lots[idx].grade;
            if !grades.contains(&grade) {
                grades.push(grade);
            }
        }
        grades
    }

    /// Indices of sellable lots: best grade first, then oldest production turn.
    fn sale_order(&self, turn: Turn) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.lots.len())
            .filter(|&i| !self.lots[i].is_expired(turn) && self.lots[i].portions > 0)
            .collect();
        // stable: equal grade and age keep insertion order
        order.sort_by_key(|&i| {
            let lot = &self.lots[i];
            (std::cmp::Reverse(lot.grade.rank()), lot.production_turn)
        });
        order
    }

    /// Sell up to `quantity` portions, best grade first then oldest, each unit
    /// at its own lot's price. Never sells more than the sellable stock.
    ///
    /// Fails without touching stock if any lot is corrupted.
    pub fn sell_best_grade_first(
        &mut self,
        quantity: Portions,
        turn: Turn,
    ) -> Result<Sale, MarketError> {
        self.validate()?;

        let mut sale = Sale::default();
        if quantity == 0 {
            return Ok(sale);
        }

        let mut need = quantity;
        for idx in self.sale_order(turn) {
            if need == 0 {
                break;
            }
            let lot = &mut self.lots[idx];
            let take = lot.portions.min(need);
            lot.portions -= take;
            need -= take;
            sale.units += take;
            sale.revenue += f64::from(take) * lot.unit_price;
            sale.lines.push(SaleLine {
                item: lot.item.clone(),
                grade: lot.grade,
                units: take,
                unit_price: lot.unit_price,
            });
        }
        self.lots.retain(|lot| lot.portions > 0);
        Ok(sale)
    }
}
