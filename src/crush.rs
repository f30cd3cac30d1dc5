//! Crush resolution: combo timing, category scoring, feedback and shake.

use crate::catalog::TileCategory;
use crate::sim::LiveTiles;
use crate::tiles::{TileId, TileState};
use std::time::{Duration, Instant};

/// Crushes closer together than this extend the combo.
pub const COMBO_WINDOW: Duration = Duration::from_millis(800);
/// Combo counter cap; the counter doubles as the multiplier for positive tiles.
pub const COMBO_CAP: u32 = 5;
/// How long a floating feedback label stays up.
pub const FEEDBACK_LIFETIME: Duration = Duration::from_millis(900);
/// How long the shake flag stays set after a bomb or penalty tile.
pub const SHAKE_DURATION: Duration = Duration::from_millis(500);

/// Score, combo and crush count for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreState {
    pub score: u32,
    pub combo: u32,
    pub crushed: u32,
    last_crush: Option<Instant>,
}

impl ScoreState {
    /// True while another crush would still extend the combo.
    pub fn combo_active(&self, now: Instant) -> bool {
        self.combo > 1
            && self
                .last_crush
                .is_some_and(|last| now.saturating_duration_since(last) < COMBO_WINDOW)
    }
}

/// Colour class of a feedback label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTone {
    Normal,
    Warning,
    Penalty,
}

/// Floating label shown where the player crushed a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEvent {
    pub tile: TileId,
    pub text: String,
    /// Play-area relative position, percent.
    pub x_pct: f64,
    pub y_pct: f64,
    pub tone: FeedbackTone,
    pub created: Instant,
}

impl FeedbackEvent {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created)
    }
}

/// Feedback labels; each expires on its own after [`FEEDBACK_LIFETIME`].
#[derive(Debug, Clone, Default)]
pub struct FeedbackQueue {
    events: Vec<FeedbackEvent>,
}

impl FeedbackQueue {
    pub fn push(&mut self, event: FeedbackEvent) {
        self.events.push(event);
    }

    pub fn prune(&mut self, now: Instant) {
        self.events.retain(|e| e.age(now) < FEEDBACK_LIFETIME);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedbackEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Short-lived "shake" visual flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shake {
    until: Option<Instant>,
}

impl Shake {
    pub fn trigger(&mut self, now: Instant) {
        self.until = Some(now + SHAKE_DURATION);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|t| now < t)
    }
}

/// Screen position of an interaction, in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Play area rectangle on screen, in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlayArea {
    /// Point converted to percentages of the play area.
    pub fn relative(&self, p: ScreenPoint) -> (f64, f64) {
        let pct = |v: f64, origin: f64, len: f64| {
            if len > 0.0 { (v - origin) / len * 100.0 } else { 0.0 }
        };
        (pct(p.x, self.x, self.width), pct(p.y, self.y, self.height))
    }
}

/// What a resolved crush did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrushOutcome {
    pub category: TileCategory,
    /// Signed score change actually applied.
    pub delta: i64,
    pub combo: u32,
}

/// Mutable slices of match state a crush may touch.
pub struct CrushTargets<'a> {
    pub tiles: &'a mut LiveTiles,
    pub score: &'a mut ScoreState,
    pub feedback: &'a mut FeedbackQueue,
    pub shake: &'a mut Shake,
}

/// Resolves one player interaction with a tile. Returns `None` (and changes
/// nothing) if the tile is unknown or no longer live.
pub fn resolve_crush(
    targets: CrushTargets<'_>,
    id: TileId,
    point: ScreenPoint,
    area: PlayArea,
    now: Instant,
) -> Option<CrushOutcome> {
    let CrushTargets { tiles, score, feedback, shake } = targets;
    let tile = tiles.get_mut(id).filter(|t| t.is_live())?;

    let in_window = score
        .last_crush
        .is_some_and(|last| now.saturating_duration_since(last) < COMBO_WINDOW);
    score.last_crush = Some(now);
    score.combo = if in_window { (score.combo + 1).min(COMBO_CAP) } else { 1 };

    let category = tile.kind.category;
    let before = i64::from(score.score);
    let (text, tone) = match category {
        TileCategory::Bomb => {
            score.score = 0;
            shake.trigger(now);
            ("BOOM! 0".to_string(), FeedbackTone::Penalty)
        }
        TileCategory::PenaltyHeavy => {
            score.score = (before + i64::from(tile.kind.points)).max(0) as u32;
            shake.trigger(now);
            (tile.kind.points.to_string(), FeedbackTone::Warning)
        }
        TileCategory::Standard => {
            let gained = i64::from(tile.kind.points) * i64::from(score.combo);
            score.score = (before + gained).clamp(0, i64::from(u32::MAX)) as u32;
            (format!("+{gained}"), FeedbackTone::Normal)
        }
    };
    score.crushed += 1;
    tile.state = TileState::Crushed;

    let (x_pct, y_pct) = area.relative(point);
    feedback.push(FeedbackEvent {
        tile: id,
        text,
        x_pct,
        y_pct,
        tone,
        created: now,
    });

    Some(CrushOutcome {
        category,
        delta: i64::from(score.score) - before,
        combo: score.combo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TileKind;
    use crate::tiles::LiveTile;

    const AREA: PlayArea = PlayArea { x: 10.0, y: 5.0, width: 40.0, height: 20.0 };
    const POINT: ScreenPoint = ScreenPoint { x: 30.0, y: 10.0 };

    struct Fixture {
        tiles: LiveTiles,
        score: ScoreState,
        feedback: FeedbackQueue,
        shake: Shake,
        next: u64,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tiles: LiveTiles::new(),
                score: ScoreState::default(),
                feedback: FeedbackQueue::default(),
                shake: Shake::default(),
                next: 1,
            }
        }

        fn add(&mut self, category: TileCategory, points: i32) -> TileId {
            let id = TileId(self.next);
            self.next += 1;
            self.tiles.push(LiveTile {
                id,
                kind: TileKind {
                    id: "t",
                    label: "T",
                    asset: "t",
                    category,
                    points,
                    weight: 1.0,
                },
                lane: 0,
                y: 50.0,
                speed: 1.0,
                state: TileState::Live,
            });
            id
        }

        fn crush(&mut self, id: TileId, now: Instant) -> Option<CrushOutcome> {
            resolve_crush(
                CrushTargets {
                    tiles: &mut self.tiles,
                    score: &mut self.score,
                    feedback: &mut self.feedback,
                    shake: &mut self.shake,
                },
                id,
                POINT,
                AREA,
                now,
            )
        }
    }

    #[test]
    fn lone_crush_scores_face_value() {
        let mut f = Fixture::new();
        let id = f.add(TileCategory::Standard, 5);
        let out = f.crush(id, Instant::now()).unwrap();
        assert_eq!(out.delta, 5);
        assert_eq!((f.score.score, f.score.combo, f.score.crushed), (5, 1, 1));
        assert_eq!(f.tiles.get(id).unwrap().state, TileState::Crushed);
    }

    #[test]
    fn burst_combo_caps_at_five() {
        let mut f = Fixture::new();
        let t0 = Instant::now();
        let mut combos = Vec::new();
        let mut deltas = Vec::new();
        for i in 0..8u64 {
            let id = f.add(TileCategory::Standard, 10);
            let out = f.crush(id, t0 + Duration::from_millis(100 * i)).unwrap();
            combos.push(f.score.combo);
            deltas.push(out.delta);
        }
        assert_eq!(combos, vec![1, 2, 3, 4, 5, 5, 5, 5]);
        assert_eq!(deltas, vec![10, 20, 30, 40, 50, 50, 50, 50]);
    }

    #[test]
    fn combo_resets_after_window() {
        let mut f = Fixture::new();
        let t0 = Instant::now();
        let a = f.add(TileCategory::Standard, 5);
        let b = f.add(TileCategory::Standard, 5);
        let c = f.add(TileCategory::Standard, 5);
        f.crush(a, t0);
        f.crush(b, t0 + Duration::from_millis(500));
        assert_eq!(f.score.combo, 2);
        assert!(f.score.combo_active(t0 + Duration::from_millis(600)));
        assert!(!f.score.combo_active(t0 + Duration::from_millis(500) + COMBO_WINDOW));
        f.crush(c, t0 + Duration::from_millis(500) + COMBO_WINDOW + Duration::from_millis(1));
        assert_eq!(f.score.combo, 1);
    }

    #[test]
    fn bomb_zeroes_score_and_shakes() {
        let mut f = Fixture::new();
        f.score.score = 120;
        let t0 = Instant::now();
        let bomb = f.add(TileCategory::Bomb, -1000);
        let out = f.crush(bomb, t0).unwrap();
        assert_eq!(out.delta, -120);
        assert_eq!(f.score.score, 0);
        assert_eq!(f.score.crushed, 1);
        assert!(f.shake.is_active(t0));
        assert!(f.shake.is_active(t0 + SHAKE_DURATION - Duration::from_millis(1)));
        assert!(!f.shake.is_active(t0 + SHAKE_DURATION));
        let ev = f.feedback.iter().next().unwrap();
        assert_eq!(ev.text, "BOOM! 0");
        assert_eq!(ev.tone, FeedbackTone::Penalty);
    }

    #[test]
    fn penalty_tile_clamps_at_zero() {
        let mut f = Fixture::new();
        f.score.score = 10;
        let t0 = Instant::now();
        let thorn = f.add(TileCategory::PenaltyHeavy, -25);
        let out = f.crush(thorn, t0).unwrap();
        assert_eq!(f.score.score, 0);
        assert_eq!(out.delta, -10);
        assert!(f.shake.is_active(t0));
        let ev = f.feedback.iter().next().unwrap();
        assert_eq!((ev.text.as_str(), ev.tone), ("-25", FeedbackTone::Warning));
    }

    #[test]
    fn repeated_interaction_is_a_no_op() {
        let mut f = Fixture::new();
        let t0 = Instant::now();
        let id = f.add(TileCategory::Standard, 5);
        assert!(f.crush(id, t0).is_some());
        let before = f.score.clone();
        assert!(f.crush(id, t0 + Duration::from_millis(10)).is_none());
        assert_eq!(f.score, before);
        assert_eq!(f.feedback.len(), 1);
    }

    #[test]
    fn missed_or_unknown_tile_is_ignored() {
        let mut f = Fixture::new();
        let id = f.add(TileCategory::Standard, 5);
        f.tiles.get_mut(id).unwrap().state = TileState::Missed;
        assert!(f.crush(id, Instant::now()).is_none());
        assert!(f.crush(TileId(999), Instant::now()).is_none());
        assert_eq!(f.score, ScoreState::default());
    }

    #[test]
    fn feedback_position_is_relative_and_expires() {
        let mut f = Fixture::new();
        let t0 = Instant::now();
        let id = f.add(TileCategory::Standard, 5);
        f.crush(id, t0);
        let ev = f.feedback.iter().next().unwrap().clone();
        assert_eq!((ev.x_pct, ev.y_pct), (50.0, 25.0));
        assert_eq!(ev.text, "+5");
        f.feedback.prune(t0 + FEEDBACK_LIFETIME - Duration::from_millis(1));
        assert_eq!(f.feedback.len(), 1);
        f.feedback.prune(t0 + FEEDBACK_LIFETIME);
        assert!(f.feedback.is_empty());
    }
}
