//! Simulation loop: per-tick descent, ground detection and eviction.

use crate::tiles::{LiveTile, TileId, TileState};

/// Fixed simulation tick in milliseconds (50 Hz).
pub const TICK_MS: u64 = 20;
/// Percent of play-area height where an unresolved tile counts as missed.
pub const GROUND_Y: f64 = 95.0;
/// Crushed tiles are evicted once they rise above this.
pub const CRUSHED_EXIT_Y: f64 = -20.0;
/// Rise per tick of a crushed tile during its exit animation.
pub const CRUSHED_RISE: f64 = 6.0;

/// Live tiles in spawn order, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct LiveTiles {
    tiles: Vec<LiveTile>,
}

impl LiveTiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tile: LiveTile) {
        self.tiles.push(tile);
    }

    pub fn extend(&mut self, tiles: impl IntoIterator<Item = LiveTile>) {
        self.tiles.extend(tiles);
    }

    pub fn get(&self, id: TileId) -> Option<&LiveTile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut LiveTile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveTile> {
        self.tiles.iter()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Lowest (closest to the ground) live tile in a lane.
    pub fn lowest_live_in_lane(&self, lane: usize) -> Option<&LiveTile> {
        self.tiles
            .iter()
            .filter(|t| t.lane == lane && t.is_live())
            .max_by(|a, b| a.y.total_cmp(&b.y))
    }

    /// One fixed tick. Returns the ids of tiles that reached the ground this tick.
    /// No scoring happens here.
    pub fn step(&mut self) -> Vec<TileId> {
        let mut missed = Vec::new();
        for tile in &mut self.tiles {
            match tile.state {
                TileState::Live => {
                    let y = tile.y + tile.speed;
                    if y >= GROUND_Y {
                        tile.y = GROUND_Y;
                        tile.state = TileState::Missed;
                        missed.push(tile.id);
                    } else {
                        tile.y = y;
                    }
                }
                TileState::Crushed => tile.y -= CRUSHED_RISE,
                TileState::Missed => {}
            }
        }
        self.tiles.retain(|t| match t.state {
            TileState::Live => true,
            TileState::Crushed => t.y >= CRUSHED_EXIT_Y,
            TileState::Missed => false,
        });
        missed
    }
}
