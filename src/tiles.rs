//! Tile factory: weighted kind draws and positioned falling-tile instances.

use crate::catalog::{Catalog, TileKind};
use rand::Rng;

/// Vertical position (percent of play-area height) new tiles start at, above the visible area.
pub const SPAWN_Y: f64 = -10.0;
/// Base descent band for single spawns, in percent per tick.
const SPEED_MIN: f64 = 0.8;
const SPEED_SPREAD: f64 = 0.6;
/// Deceit pairs fall in a slightly narrower band.
const PAIR_SPEED_SPREAD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u64);

/// Resolution state. `Live` is left at most once and never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Live,
    Crushed,
    Missed,
}

/// One falling tile.
#[derive(Debug, Clone)]
pub struct LiveTile {
    pub id: TileId,
    pub kind: TileKind,
    pub lane: usize,
    /// Percent of play-area height; negative is above the visible area.
    pub y: f64,
    /// Percent per tick.
    pub speed: f64,
    pub state: TileState,
}

impl LiveTile {
    pub fn is_live(&self) -> bool {
        self.state == TileState::Live
    }
}

/// Draws kinds from a catalog and builds tile instances. Owns the id counter.
#[derive(Debug)]
pub struct TileFactory<R: Rng> {
    catalog: Catalog,
    rng: R,
    next_id: u64,
}

impl<R: Rng> TileFactory<R> {
    pub fn new(catalog: Catalog, rng: R) -> Self {
        Self {
            catalog,
            rng,
            next_id: 1,
        }
    }

    /// Uniform roll in [0, 1), also used by the spawn scheduler.
    pub fn roll(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    pub fn draw_kind(&mut self) -> TileKind {
        let roll = self.roll();
        *self.catalog.pick(roll)
    }

    pub fn spawn_single(&mut self, lanes: usize) -> LiveTile {
        let kind = self.draw_kind();
        let lane = self.rng.random_range(0..lanes.max(1));
        let speed = SPEED_MIN + self.roll() * SPEED_SPREAD;
        self.make(kind, lane, speed)
    }

    /// Bomb plus valuable bait in adjacent lanes at one shared speed.
    /// `None` when the catalog has no bomb or no valuable kind, or there is only one lane.
    pub fn spawn_deceit_pair(&mut self, lanes: usize) -> Option<[LiveTile; 2]> {
        if lanes < 2 {
            return None;
        }
        let bomb = *self.catalog.bomb()?;
        let valuable: Vec<TileKind> = self.catalog.valuable().copied().collect();
        if valuable.is_empty() {
            return None;
        }
        let lane = self.rng.random_range(0..lanes);
        let neighbour = if lane == lanes - 1 { lane - 1 } else { lane + 1 };
        let bait = valuable[self.rng.random_range(0..valuable.len())];
        let speed = SPEED_MIN + self.roll() * PAIR_SPEED_SPREAD;
        Some([self.make(bomb, lane, speed), self.make(bait, neighbour, speed)])
    }

    fn make(&mut self, kind: TileKind, lane: usize, speed: f64) -> LiveTile {
        let id = TileId(self.next_id);
        self.next_id += 1;
        LiveTile {
            id,
            kind,
            lane,
            y: SPAWN_Y,
            speed,
            state: TileState::Live,
        }
    }
}
