//! Difficulty curve: pure functions of the seconds left in a session.

use std::time::Duration;

const BASE_SPEED_MULTIPLIER: f64 = 1.0;
const SPEED_MULTIPLIER_GAIN: f64 = 0.8;

const BASE_SPAWN_INTERVAL_MS: f64 = 600.0;
const SPAWN_INTERVAL_DROP_MS: f64 = 300.0;
/// The scheduler never fires faster than this.
pub const MIN_SPAWN_INTERVAL_MS: u64 = 300;

/// 0 at session start, 1 when time runs out.
fn progress(time_left: f64, session_secs: f64) -> f64 {
    if session_secs <= 0.0 {
        return 1.0;
    }
    let left = time_left.clamp(0.0, session_secs);
    1.0 - left / session_secs
}

/// Fall-speed multiplier; rises linearly from 1.0x to 1.8x as time runs out.
pub fn speed_multiplier(time_left: f64, session_secs: f64) -> f64 {
    BASE_SPEED_MULTIPLIER + progress(time_left, session_secs) * SPEED_MULTIPLIER_GAIN
}

/// Delay before the next spawn batch; 600 ms down to the 300 ms floor.
pub fn spawn_interval(time_left: f64, session_secs: f64) -> Duration {
    let ms = BASE_SPAWN_INTERVAL_MS - progress(time_left, session_secs) * SPAWN_INTERVAL_DROP_MS;
    Duration::from_millis(ms.round().max(MIN_SPAWN_INTERVAL_MS as f64) as u64)
}

/// Chance of a three-tile batch, keyed to the current speed multiplier.
pub fn triple_chance(speed_multiplier: f64) -> f64 {
    if speed_multiplier > 1.5 {
        0.40
    } else if speed_multiplier > 1.2 {
        0.25
    } else {
        0.15
    }
}
