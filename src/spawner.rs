//! Spawn scheduler: picks a batch shape each cycle and emits speed-scaled tiles.

use crate::difficulty;
use crate::tiles::{LiveTile, TileFactory};
use crate::timer::RepeatingTask;
use rand::Rng;
use std::time::Instant;

/// Probability that a cycle emits a deceit pair.
const DECEIT_PAIR_CHANCE: f64 = 0.20;
/// Cumulative probability up to which a cycle emits at least two tiles.
const DOUBLE_CUMULATIVE: f64 = 0.70;

/// Shape of one spawn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnBatch {
    DeceitPair,
    Triple,
    Double,
    Single,
}

impl SpawnBatch {
    /// First-matching-range rule over one uniform roll.
    pub fn choose(roll: f64, speed_multiplier: f64) -> Self {
        let triple_upper = DECEIT_PAIR_CHANCE + difficulty::triple_chance(speed_multiplier);
        if roll < DECEIT_PAIR_CHANCE {
            Self::DeceitPair
        } else if roll < triple_upper {
            Self::Triple
        } else if roll < DOUBLE_CUMULATIVE {
            Self::Double
        } else {
            Self::Single
        }
    }
}

/// Self-rescheduling spawn timer. The delay before each cycle comes from the
/// difficulty curve at the time the previous cycle fired.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    task: RepeatingTask,
    lanes: usize,
    session_secs: f64,
}

impl SpawnScheduler {
    pub fn idle(lanes: usize, session_secs: f64) -> Self {
        Self {
            task: RepeatingTask::stopped(),
            lanes,
            session_secs,
        }
    }

    pub fn start(&mut self, now: Instant, time_left: f64) {
        let interval = difficulty::spawn_interval(time_left, self.session_secs);
        self.task = RepeatingTask::start(now, interval);
    }

    pub fn stop(&mut self) {
        self.task.stop();
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.task.next_due()
    }

    /// Runs one cycle if due: returns the batch (already speed-scaled) and
    /// reschedules itself. Returns `None` when not due or stopped.
    pub fn poll<R: Rng>(
        &mut self,
        now: Instant,
        time_left: f64,
        factory: &mut TileFactory<R>,
    ) -> Option<Vec<LiveTile>> {
        let fired = self.task.poll(now)?;
        let tiles = self.spawn_batch(time_left, factory);
        self.task
            .retime(fired, difficulty::spawn_interval(time_left, self.session_secs));
        Some(tiles)
    }

    fn spawn_batch<R: Rng>(&self, time_left: f64, factory: &mut TileFactory<R>) -> Vec<LiveTile> {
        let multiplier = difficulty::speed_multiplier(time_left, self.session_secs);
        let batch = SpawnBatch::choose(factory.roll(), multiplier);
        let mut tiles = match batch {
            SpawnBatch::DeceitPair => match factory.spawn_deceit_pair(self.lanes) {
                Some(pair) => pair.to_vec(),
                None => vec![factory.spawn_single(self.lanes)],
            },
            SpawnBatch::Triple => (0..3).map(|_| factory.spawn_single(self.lanes)).collect(),
            SpawnBatch::Double => (0..2).map(|_| factory.spawn_single(self.lanes)).collect(),
            SpawnBatch::Single => vec![factory.spawn_single(self.lanes)],
        };
        for t in &mut tiles {
            t.speed *= multiplier;
        }
        log::debug!("spawn {:?}: {} tiles at {:.2}x", batch, tiles.len(), multiplier);
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::time::Duration;

    #[test]
    fn batch_ranges_at_low_difficulty() {
        assert_eq!(SpawnBatch::choose(0.0, 1.0), SpawnBatch::DeceitPair);
        assert_eq!(SpawnBatch::choose(0.19, 1.0), SpawnBatch::DeceitPair);
        assert_eq!(SpawnBatch::choose(0.20, 1.0), SpawnBatch::Triple);
        assert_eq!(SpawnBatch::choose(0.34, 1.0), SpawnBatch::Triple);
        assert_eq!(SpawnBatch::choose(0.36, 1.0), SpawnBatch::Double);
        assert_eq!(SpawnBatch::choose(0.69, 1.0), SpawnBatch::Double);
        assert_eq!(SpawnBatch::choose(0.70, 1.0), SpawnBatch::Single);
    }

    #[test]
    fn triples_grow_with_difficulty() {
        assert_eq!(SpawnBatch::choose(0.40, 1.3), SpawnBatch::Triple);
        assert_eq!(SpawnBatch::choose(0.46, 1.3), SpawnBatch::Double);
        assert_eq!(SpawnBatch::choose(0.55, 1.7), SpawnBatch::Triple);
        assert_eq!(SpawnBatch::choose(0.65, 1.7), SpawnBatch::Double);
        assert_eq!(SpawnBatch::choose(0.95, 1.7), SpawnBatch::Single);
    }

    #[test]
    fn fires_after_interval_and_scales_speed() {
        let t0 = Instant::now();
        let mut factory = TileFactory::new(Catalog::standard().unwrap(), Pcg32::seed_from_u64(9));
        let mut sched = SpawnScheduler::idle(4, 60.0);
        sched.start(t0, 0.0);
        assert!(sched.poll(t0 + Duration::from_millis(299), 0.0, &mut factory).is_none());
        let tiles = sched
            .poll(t0 + Duration::from_millis(300), 0.0, &mut factory)
            .unwrap();
        assert!((1..=3).contains(&tiles.len()));
        for t in &tiles {
            // Base band [0.8, 1.4) scaled by 1.8x.
            assert!(t.speed >= 0.8 * 1.8 && t.speed < 1.4 * 1.8);
        }
        assert_eq!(sched.next_due(), Some(t0 + Duration::from_millis(600)));
    }

    #[test]
    fn reschedules_with_current_interval() {
        let t0 = Instant::now();
        let mut factory = TileFactory::new(Catalog::standard().unwrap(), Pcg32::seed_from_u64(1));
        let mut sched = SpawnScheduler::idle(4, 60.0);
        sched.start(t0, 60.0);
        let fire = t0 + Duration::from_millis(600);
        assert!(sched.poll(fire, 30.0, &mut factory).is_some());
        assert_eq!(sched.next_due(), Some(fire + Duration::from_millis(450)));
    }

    #[test]
    fn stopped_scheduler_discards() {
        let t0 = Instant::now();
        let mut factory = TileFactory::new(Catalog::standard().unwrap(), Pcg32::seed_from_u64(1));
        let mut sched = SpawnScheduler::idle(4, 60.0);
        sched.start(t0, 60.0);
        sched.stop();
        assert!(sched.poll(t0 + Duration::from_secs(5), 60.0, &mut factory).is_none());
        assert_eq!(sched.next_due(), None);
    }
}
