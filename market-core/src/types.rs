use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use tsify_next::Tsify;

// ============================================================================
// IDs - Using slotmap for generational indices
// ============================================================================

new_key_type! {
    pub struct VendorId;
}

/// Trait for converting SlotMap keys to u64 for the WASM boundary and logs
pub trait KeyToU64 {
    fn to_u64(self) -> u64;
}

impl KeyToU64 for VendorId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl VendorId {
    /// Rebuild a key from its ffi form (see [`KeyToU64`]).
    pub fn from_u64(raw: u64) -> Self {
        VendorId::from(slotmap::KeyData::from_ffi(raw))
    }
}

// === TYPE ALIASES ===

pub type Turn = u32;
pub type Price = f64;
pub type Customers = u32;
pub type Portions = u32;

// ============================================================================
// Segments - Demographic customer cohorts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Student,
    Worker,
    Family,
    Tourist,
    Senior,
}

impl Segment {
    /// Returns an iterator over all segments
    pub fn all() -> impl Iterator<Item = Segment> {
        [
            Segment::Student,
            Segment::Worker,
            Segment::Family,
            Segment::Tourist,
            Segment::Senior,
        ]
        .into_iter()
    }

    /// Average spend per visit used when no budget is configured.
    pub fn default_budget(self) -> Price {
        match self {
            Segment::Student => 10.0,
            Segment::Worker => 18.0,
            // basket for a table of 3-4
            Segment::Family => 55.0,
            Segment::Tourist => 28.0,
            Segment::Senior => 20.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Student => "student",
            Segment::Worker => "worker",
            Segment::Family => "family",
            Segment::Tourist => "tourist",
            Segment::Senior => "senior",
        }
    }
}

// ============================================================================
// Concept - A vendor's business category
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    FastFood,
    Bistro,
    FineDining,
}

impl Concept {
    pub fn all() -> impl Iterator<Item = Concept> {
        [Concept::FastFood, Concept::Bistro, Concept::FineDining].into_iter()
    }

    /// Share of raw seat capacity that can actually be turned over in a turn.
    pub fn throughput_coefficient(self) -> f64 {
        match self {
            Concept::FastFood => 1.00,
            Concept::Bistro => 0.80,
            Concept::FineDining => 0.50,
        }
    }

    /// Front-of-house staff minutes needed to serve one cover.
    pub fn minutes_per_cover(self) -> f64 {
        match self {
            Concept::FastFood => 1.5,
            Concept::Bistro => 4.0,
            Concept::FineDining => 7.0,
        }
    }

    /// Perceived-quality multiplier for a menu item given its ingredient grade hint.
    ///
    /// Only fresh, frozen and sous-vide hints are recognised; anything else
    /// (including no hint) uses the concept's "undetermined" multiplier.
    pub fn grade_expectation(self, hint: Option<Grade>) -> f64 {
        match (self, hint) {
            (Concept::FastFood, Some(Grade::G5SousVide)) => 0.95,
            (Concept::FastFood, Some(Grade::G1Fresh)) => 1.00,
            (Concept::FastFood, Some(Grade::G3Frozen)) => 0.95,
            (Concept::FastFood, _) => 0.98,

            (Concept::Bistro, Some(Grade::G5SousVide)) => 0.98,
            (Concept::Bistro, Some(Grade::G1Fresh)) => 1.00,
            (Concept::Bistro, Some(Grade::G3Frozen)) => 0.95,
            (Concept::Bistro, _) => 0.98,

            (Concept::FineDining, Some(Grade::G5SousVide)) => 1.00,
            (Concept::FineDining, Some(Grade::G1Fresh)) => 1.00,
            // frozen is frowned upon in fine dining
            (Concept::FineDining, Some(Grade::G3Frozen)) => 0.85,
            (Concept::FineDining, _) => 0.92,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Concept::FastFood => "fast_food",
            Concept::Bistro => "bistro",
            Concept::FineDining => "fine_dining",
        }
    }
}

// ============================================================================
// Grade - Processing tier of ingredients and finished goods
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    G1Fresh,
    G2Canned,
    G3Frozen,
    G4ReadyRaw,
    G5SousVide,
}

impl Grade {
    /// Perceived quality rank, higher is better. Best grades are sold first.
    pub fn rank(self) -> u8 {
        match self {
            Grade::G5SousVide => 5,
            Grade::G4ReadyRaw => 4,
            Grade::G1Fresh => 3,
            Grade::G3Frozen => 2,
            Grade::G2Canned => 1,
        }
    }
}
