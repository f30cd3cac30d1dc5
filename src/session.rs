//! Match controller: one timed session wiring countdown, simulation and spawner together.

use crate::GameConfig;
use crate::audio::{self, AudioSink, Cue, EndTier, Silent};
use crate::catalog::{Catalog, TileCategory};
use crate::crush::{
    self, CrushOutcome, CrushTargets, FeedbackQueue, PlayArea, ScoreState, ScreenPoint, Shake,
};
use crate::sim::{LiveTiles, TICK_MS};
use crate::spawner::SpawnScheduler;
use crate::tiles::{TileFactory, TileId};
use crate::timer::RepeatingTask;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::time::{Duration, Instant};

/// Pause between the countdown hitting zero and the session ending.
pub const GRACE_DELAY: Duration = Duration::from_millis(800);
const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Idle, nothing running.
    Start,
    Playing,
    /// Terminal; start a fresh session to play again.
    Over,
}

/// Final result reported once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub score: u32,
    pub crushed: u32,
}

/// Everything one session mutates. Owned exclusively by [`Session`].
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    pub time_left: u32,
    pub score: ScoreState,
    pub tiles: LiveTiles,
    pub feedback: FeedbackQueue,
    pub shake: Shake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Countdown,
    Simulation,
    Spawn,
}

type EndCallback = Box<dyn FnMut(SessionSummary)>;

pub struct Session {
    phase: Phase,
    /// Gate for every recurring activity; cleared when time runs out.
    running: bool,
    state: MatchState,
    session_secs: u32,
    countdown: RepeatingTask,
    sim: RepeatingTask,
    spawner: SpawnScheduler,
    factory: TileFactory<Pcg32>,
    ends_at: Option<Instant>,
    summary: Option<SessionSummary>,
    on_end: Option<EndCallback>,
    audio: Box<dyn AudioSink>,
}

impl Session {
    pub fn new(config: &GameConfig, catalog: Catalog) -> Self {
        let lanes = config.lanes.max(1);
        Self {
            phase: Phase::Start,
            running: false,
            state: MatchState {
                time_left: config.session_secs,
                ..MatchState::default()
            },
            session_secs: config.session_secs,
            countdown: RepeatingTask::stopped(),
            sim: RepeatingTask::stopped(),
            spawner: SpawnScheduler::idle(lanes, f64::from(config.session_secs)),
            factory: TileFactory::new(catalog, Pcg32::seed_from_u64(config.seed)),
            ends_at: None,
            summary: None,
            on_end: None,
            audio: Box::new(Silent),
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    /// Called exactly once, after the grace delay, with the final score.
    pub fn on_session_end(&mut self, callback: impl FnMut(SessionSummary) + 'static) {
        self.on_end = Some(Box::new(callback));
    }

    /// `start -> playing`. Ignored in any other phase.
    pub fn start(&mut self, now: Instant) {
        if self.phase != Phase::Start {
            return;
        }
        self.state = MatchState {
            time_left: self.session_secs,
            ..MatchState::default()
        };
        self.phase = Phase::Playing;
        self.running = true;
        self.countdown = RepeatingTask::start(now, COUNTDOWN_INTERVAL);
        self.sim = RepeatingTask::start(now, Duration::from_millis(TICK_MS));
        self.spawner.start(now, f64::from(self.session_secs));
        log::info!("session started: {}s", self.session_secs);
    }

    /// Player tapped a tile. Ignored once the session has stopped running.
    pub fn record_interaction(
        &mut self,
        id: TileId,
        point: ScreenPoint,
        area: PlayArea,
        now: Instant,
    ) -> Option<CrushOutcome> {
        if self.phase != Phase::Playing || !self.running {
            return None;
        }
        let targets = CrushTargets {
            tiles: &mut self.state.tiles,
            score: &mut self.state.score,
            feedback: &mut self.state.feedback,
            shake: &mut self.state.shake,
        };
        let outcome = crush::resolve_crush(targets, id, point, area, now)?;
        let cue = match outcome.category {
            TileCategory::Standard => Cue::Click,
            TileCategory::PenaltyHeavy | TileCategory::Bomb => Cue::Bomb,
        };
        audio::play_best_effort(self.audio.as_mut(), cue);
        Some(outcome)
    }

    /// Runs every activity that has come due up to `now`, earliest first.
    pub fn update(&mut self, now: Instant) {
        while let Some(activity) = self.next_activity(now) {
            match activity {
                Activity::Countdown => {
                    if let Some(at) = self.countdown.poll(now) {
                        self.tick_countdown(at);
                    }
                }
                Activity::Simulation => {
                    if self.sim.poll(now).is_some() && self.running {
                        self.state.tiles.step();
                    }
                }
                Activity::Spawn => {
                    let time_left = f64::from(self.state.time_left);
                    if let Some(batch) = self.spawner.poll(now, time_left, &mut self.factory) {
                        if self.running {
                            self.state.tiles.extend(batch);
                        }
                    }
                }
            }
        }
        self.state.feedback.prune(now);
        if self.ends_at.is_some_and(|end| now >= end) {
            self.finish();
        }
    }

    fn next_activity(&self, now: Instant) -> Option<Activity> {
        [
            (Activity::Countdown, self.countdown.next_due()),
            (Activity::Simulation, self.sim.next_due()),
            (Activity::Spawn, self.spawner.next_due()),
        ]
        .into_iter()
        .filter_map(|(a, due)| due.filter(|d| *d <= now).map(|d| (a, d)))
        .min_by_key(|(_, d)| *d)
        .map(|(a, _)| a)
    }

    fn tick_countdown(&mut self, at: Instant) {
        if !self.running {
            return;
        }
        self.state.time_left = self.state.time_left.saturating_sub(1);
        if self.state.time_left == 0 {
            self.halt();
            self.ends_at = Some(at + GRACE_DELAY);
        }
    }

    /// Stops all three recurring activities as a unit.
    fn halt(&mut self) {
        self.running = false;
        self.countdown.stop();
        self.sim.stop();
        self.spawner.stop();
    }

    fn finish(&mut self) {
        self.ends_at = None;
        self.phase = Phase::Over;
        let summary = SessionSummary {
            score: self.state.score.score,
            crushed: self.state.score.crushed,
        };
        self.summary = Some(summary);
        log::info!("session over: score {} crushed {}", summary.score, summary.crushed);
        audio::play_best_effort(
            self.audio.as_mut(),
            Cue::SessionEnd(EndTier::for_score(summary.score)),
        );
        if let Some(mut callback) = self.on_end.take() {
            callback(summary);
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn is_shaking(&self, now: Instant) -> bool {
        self.state.shake.is_active(now)
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.summary
    }
}
