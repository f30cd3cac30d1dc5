//! Tile catalog: the fixed, weighted table of tile kinds.

use thiserror::Error;

/// Tolerance when checking that spawn weights sum to 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Standard tiles at or above this many points can be used as deceit-pair bait.
pub const VALUABLE_POINTS: i32 = 10;

/// How a crushed tile is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCategory {
    /// Positive points, multiplied by the combo.
    Standard,
    /// Negative points, never multiplied; score is clamped at zero.
    PenaltyHeavy,
    /// Looks standard, but crushing it resets the score to zero.
    Bomb,
}

/// One immutable kind of tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileKind {
    pub id: &'static str,
    pub label: &'static str,
    /// Short glyph drawn inside the tile.
    pub asset: &'static str,
    pub category: TileCategory,
    pub points: i32,
    /// Spawn probability mass in [0, 1].
    pub weight: f64,
}

impl TileKind {
    pub fn is_bomb(&self) -> bool {
        self.category == TileCategory::Bomb
    }

    /// Standard tile worth enough to tempt the player next to a bomb.
    pub fn is_valuable(&self) -> bool {
        self.category == TileCategory::Standard && self.points >= VALUABLE_POINTS
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog has no tile kinds")]
    Empty,
    #[error("tile kind {id:?} has weight {weight} outside [0, 1]")]
    WeightOutOfRange { id: &'static str, weight: f64 },
    #[error("tile weights sum to {0}, expected 1")]
    WeightSum(f64),
}

const fn kind(
    id: &'static str,
    label: &'static str,
    asset: &'static str,
    category: TileCategory,
    points: i32,
    weight: f64,
) -> TileKind {
    TileKind { id, label, asset, category, points, weight }
}

/// Built-in table. The bomb uses an ordinary-looking label and glyph on purpose.
const STANDARD_KINDS: [TileKind; 12] = [
    kind("star", "Star", "*", TileCategory::Standard, 200, 0.02),
    kind("crown", "Crown", "^", TileCategory::Standard, 100, 0.05),
    kind("cone", "Cone", "A", TileCategory::Standard, 50, 0.08),
    kind("pineapple", "Pineapple", "#", TileCategory::Standard, 50, 0.08),
    kind("orb", "Orb", "o", TileCategory::Bomb, -1000, 0.10),
    kind("ninja", "Ninja", "N", TileCategory::Standard, 5, 0.12),
    kind("frog", "Frog", "F", TileCategory::Standard, 5, 0.12),
    kind("mic", "Mic", "M", TileCategory::Standard, 5, 0.12),
    kind("octopus", "Octopus", "@", TileCategory::Standard, 5, 0.12),
    kind("pebble", "Pebble", ".", TileCategory::Standard, 2, 0.07),
    kind("stone", "Stone", ":", TileCategory::Standard, 2, 0.07),
    kind("thorn", "Thorn", "x", TileCategory::PenaltyHeavy, -25, 0.05),
];

/// Ordered list of tile kinds whose weights sum to 1.
#[derive(Debug, Clone)]
pub struct Catalog {
    kinds: Vec<TileKind>,
}

impl Catalog {
    /// Validates weights; a bad table is a programming error and is never renormalised.
    pub fn new(kinds: Vec<TileKind>) -> Result<Self, CatalogError> {
        if kinds.is_empty() {
            return Err(CatalogError::Empty);
        }
        for k in &kinds {
            if !(0.0..=1.0).contains(&k.weight) {
                return Err(CatalogError::WeightOutOfRange { id: k.id, weight: k.weight });
            }
        }
        let sum: f64 = kinds.iter().map(|k| k.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CatalogError::WeightSum(sum));
        }
        Ok(Self { kinds })
    }

    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(STANDARD_KINDS.to_vec())
    }

    pub fn kinds(&self) -> &[TileKind] {
        &self.kinds
    }

    pub fn bomb(&self) -> Option<&TileKind> {
        self.kinds.iter().find(|k| k.is_bomb())
    }

    pub fn valuable(&self) -> impl Iterator<Item = &TileKind> {
        self.kinds.iter().filter(|k| k.is_valuable())
    }

    /// Cumulative-weight lookup for a uniform roll in [0, 1).
    /// Falls back to the last kind when rounding leaves the roll unmatched.
    pub fn pick(&self, roll: f64) -> &TileKind {
        let mut cumulative = 0.0;
        for k in &self.kinds {
            cumulative += k.weight;
            if cumulative >= roll {
                return k;
            }
        }
        // `new` rejects empty catalogs.
        &self.kinds[self.kinds.len() - 1]
    }
}
