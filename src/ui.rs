//! Layout and drawing: menu, header, lanes and tiles, feedback, quit menu, game over.

use crate::app::{QuitOption, Screen};
use crate::audio::EndTier;
use crate::crush::{FEEDBACK_LIFETIME, PlayArea, ScreenPoint};
use crate::leaderboard::LeaderboardEntry;
use crate::session::{Session, SessionSummary};
use crate::sim::{GROUND_Y, LiveTiles};
use crate::theme::Theme;
use crate::tiles::{LiveTile, TileId, TileState};
use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Rows above the playfield for score, time and best.
pub const HEADER_HEIGHT: u16 = 3;
/// Preferred lane width in columns, including padding.
const LANE_WIDTH: u16 = 12;
const TILE_HEIGHT: u16 = 2;
/// Red flash over the playfield when a bomb or penalty tile is crushed.
const FLASH_MS: u32 = 350;
/// Countdown turns urgent at or below this many seconds.
const URGENT_SECS: u32 = 10;
/// How far (percent of height) a feedback label drifts up over its lifetime.
const FEEDBACK_RISE_PCT: f64 = 8.0;

/// Screen geometry of the header and the lane playfield. Shared by drawing and
/// mouse hit-testing so both agree on where a tile is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayfieldLayout {
    pub header: Rect,
    /// Playfield including its border.
    pub outer: Rect,
    /// Area tiles move in.
    pub inner: Rect,
    lanes: usize,
}

impl PlayfieldLayout {
    pub fn new(area: Rect, lanes: usize) -> Self {
        let lanes = lanes.max(1);
        let wanted = u16::try_from(lanes)
            .unwrap_or(u16::MAX)
            .saturating_mul(LANE_WIDTH)
            .saturating_add(2);
        let width = wanted.min(area.width);
        let x = area.x + (area.width - width) / 2;
        let header = Rect {
            x,
            y: area.y,
            width,
            height: HEADER_HEIGHT.min(area.height),
        };
        let outer = Rect {
            x,
            y: area.y + header.height,
            width,
            height: area.height - header.height,
        };
        let inner = Block::default().borders(Borders::ALL).inner(outer);
        Self {
            header,
            outer,
            inner,
            lanes,
        }
    }

    /// Same layout moved horizontally (screen shake), never left of column 0.
    pub fn shifted(&self, dx: i16) -> Self {
        let shift = |r: Rect| Rect {
            x: r.x.saturating_add_signed(dx),
            ..r
        };
        Self {
            header: self.header,
            outer: shift(self.outer),
            inner: shift(self.inner),
            lanes: self.lanes,
        }
    }

    pub fn play_area(&self) -> PlayArea {
        PlayArea {
            x: f64::from(self.inner.x),
            y: f64::from(self.inner.y),
            width: f64::from(self.inner.width),
            height: f64::from(self.inner.height),
        }
    }

    /// Column span `(x, width)` of a lane, before padding.
    fn lane_span(&self, lane: usize) -> (u16, u16) {
        let w = usize::from(self.inner.width);
        let start = lane.min(self.lanes) * w / self.lanes;
        let end = (lane + 1).min(self.lanes) * w / self.lanes;
        // Both bounds are at most inner.width, so they fit in u16.
        (self.inner.x + start as u16, (end - start) as u16)
    }

    fn row_at(&self, y_pct: f64) -> i32 {
        i32::from(self.inner.y) + (y_pct / 100.0 * f64::from(self.inner.height)).floor() as i32
    }

    /// Visible cells of a tile, clipped to the playfield. `None` when fully off-screen.
    pub fn tile_rect(&self, tile: &LiveTile) -> Option<Rect> {
        let (lane_x, lane_w) = self.lane_span(tile.lane);
        let top = self.row_at(tile.y);
        let bottom = top + i32::from(TILE_HEIGHT);
        let min_row = i32::from(self.inner.y);
        let max_row = i32::from(self.inner.bottom());
        let (top, bottom) = (top.max(min_row), bottom.min(max_row));
        if top >= bottom || lane_w == 0 {
            return None;
        }
        let pad = u16::from(lane_w > 2);
        Some(Rect {
            x: lane_x + pad,
            y: u16::try_from(top).ok()?,
            width: lane_w - 2 * pad,
            height: u16::try_from(bottom - top).ok()?,
        })
    }

    /// Live tile under a cell. Later tiles are drawn on top, so they win.
    pub fn hit_test(&self, tiles: &LiveTiles, column: u16, row: u16) -> Option<TileId> {
        let pos = Position { x: column, y: row };
        tiles
            .iter()
            .filter(|t| t.is_live())
            .filter(|t| self.tile_rect(t).is_some_and(|r| r.contains(pos)))
            .last()
            .map(|t| t.id)
    }

    /// Centre of a tile's visible cells, used as the interaction point for lane keys.
    pub fn tile_center(&self, tile: &LiveTile) -> Option<ScreenPoint> {
        self.tile_rect(tile).map(|r| ScreenPoint {
            x: f64::from(r.x) + f64::from(r.width) / 2.0,
            y: f64::from(r.y) + f64::from(r.height) / 2.0,
        })
    }

    /// Cell at play-area percentages, if inside the playfield.
    pub fn cell_at_pct(&self, x_pct: f64, y_pct: f64) -> Option<(u16, u16)> {
        let x = i32::from(self.inner.x)
            + (x_pct / 100.0 * f64::from(self.inner.width)).floor() as i32;
        let y = self.row_at(y_pct);
        let pos = Position {
            x: u16::try_from(x).ok()?,
            y: u16::try_from(y).ok()?,
        };
        self.inner.contains(pos).then_some((pos.x, pos.y))
    }

    fn ground_row(&self) -> u16 {
        let row = self.row_at(GROUND_Y).clamp(
            i32::from(self.inner.y),
            i32::from(self.inner.bottom().saturating_sub(1)),
        );
        u16::try_from(row).unwrap_or(self.inner.y)
    }
}

/// Everything a frame needs besides the effect state.
pub struct View<'a> {
    pub screen: Screen,
    pub session: &'a Session,
    pub theme: &'a Theme,
    pub lanes: usize,
    pub best: u32,
    pub sound_enabled: bool,
    pub leaderboard: &'a [LeaderboardEntry],
    pub quit_selected: QuitOption,
    /// Leaderboard rank earned by the session that just ended.
    pub rank: Option<usize>,
    pub frame_count: u64,
    pub now: Instant,
}

/// Flash effect started when a bomb or penalty tile shakes the screen.
pub fn shake_flash(theme: &Theme) -> Effect {
    fx::fade_from(theme.urgent, theme.urgent, (FLASH_MS, Interpolation::Linear))
}

/// Playfield as drawn on a given frame: jittered one column either way while shaking.
pub fn frame_layout(area: Rect, lanes: usize, shaking: bool, frame_count: u64) -> PlayfieldLayout {
    let base = PlayfieldLayout::new(area, lanes);
    if shaking {
        base.shifted(if frame_count % 2 == 0 { 1 } else { -1 })
    } else {
        base
    }
}

/// Draw current screen. While `flash` is set it is processed over the playfield.
/// Returns the playfield layout of this frame so clicks hit-test where tiles were drawn.
pub fn draw(
    frame: &mut Frame,
    view: &View<'_>,
    flash: &mut Option<Effect>,
    flash_process_time: &mut Option<Instant>,
) -> PlayfieldLayout {
    let area = frame.area();
    match view.screen {
        Screen::Menu => {
            draw_menu(frame, view, area);
            PlayfieldLayout::new(area, view.lanes)
        }
        Screen::Playing => {
            let layout = draw_game(frame, view, area);
            if let Some(effect) = flash {
                let delta = flash_process_time
                    .map(|t| view.now.saturating_duration_since(t))
                    .unwrap_or_default();
                let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
                *flash_process_time = Some(view.now);
                frame.render_effect(effect, layout.outer, TfxDuration::from_millis(delta_ms));
            }
            layout
        }
        Screen::QuitMenu => {
            let layout = draw_game(frame, view, area);
            draw_quit_menu(frame, view.theme, view.quit_selected);
            layout
        }
        Screen::GameOver => {
            draw_game_over(frame, view, area);
            PlayfieldLayout::new(area, view.lanes)
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn leaderboard_lines<'a>(theme: &Theme, entries: &'a [LeaderboardEntry]) -> Vec<Line<'a>> {
    if entries.is_empty() {
        return vec![Line::from(Span::styled(
            " no scores yet ",
            Style::default().fg(theme.inactive_fg),
        ))];
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            Line::from(Span::styled(
                format!("{:>2}. {:<12.12} {:>6}", i + 1, e.player, e.score),
                Style::default().fg(theme.main_fg),
            ))
        })
        .collect()
}

fn draw_menu(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let popup = centered(area, 46, 14 + view.leaderboard.len().max(1) as u16);
    let bold = |c| Style::default().fg(c).add_modifier(Modifier::BOLD);
    let text = Style::default().fg(theme.main_fg);
    let hint = Style::default().fg(theme.inactive_fg);
    let sound = if view.sound_enabled { "on" } else { "off" };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" TILE", bold(theme.urgent)),
            Span::styled("CRUSH ", bold(theme.title)),
        ]),
        Line::from(""),
        Line::from(Span::styled("Crush falling tiles before they land.", text)),
        Line::from(Span::styled("One of them is a bomb in disguise.", text)),
        Line::from(""),
        Line::from(Span::styled("Click a tile, or press 1-9 / d f j k", hint)),
        Line::from(Span::styled(
            format!("Enter start   M sound: {sound}   Q quit"),
            hint,
        )),
        Line::from(""),
        Line::from(Span::styled("Top scores", bold(theme.title))),
    ];
    lines.extend(leaderboard_lines(theme, view.leaderboard));

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    frame.render_widget(p, popup);
}

fn draw_header(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let state = view.session.state();
    let text = Style::default().fg(theme.main_fg);
    let time_style = if state.time_left <= URGENT_SECS {
        Style::default().fg(theme.urgent).add_modifier(Modifier::BOLD)
    } else {
        text
    };
    let time = if view.session.is_running() {
        format!(" Time {}:{:02} ", state.time_left / 60, state.time_left % 60)
    } else {
        " Time's up! ".to_string()
    };
    let mut spans = vec![
        Span::styled(format!(" Score {} ", state.score.score), text),
        Span::styled(time, time_style),
        Span::styled(format!(" Best {} ", view.best.max(state.score.score)), text),
    ];
    if state.score.combo_active(view.now) {
        spans.push(Span::styled(
            format!(" x{} COMBO ", state.score.combo),
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let p = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line))
            .title(Span::styled(" TileCrush ", theme.title)),
    );
    frame.render_widget(p, area);
}

/// Header and playfield; returns the layout actually drawn (shifted while shaking).
fn draw_game(frame: &mut Frame, view: &View<'_>, area: Rect) -> PlayfieldLayout {
    let shaking = view.session.is_shaking(view.now);
    let layout = frame_layout(area, view.lanes, shaking, view.frame_count);
    draw_header(frame, view, layout.header);
    draw_playfield(frame, view, &layout);
    layout
}

fn draw_playfield(frame: &mut Frame, view: &View<'_>, layout: &PlayfieldLayout) {
    let theme = view.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg));
    frame.render_widget(block, layout.outer);

    let inner = layout.inner;
    let buf = frame.buffer_mut();
    let divider = Style::default().fg(theme.div_line).bg(theme.bg);
    for lane in 1..layout.lanes {
        let (x, _) = layout.lane_span(lane);
        for y in inner.top()..inner.bottom() {
            buf.set_string(x, y, "┊", divider);
        }
    }
    let ground = layout.ground_row();
    let ground_style = Style::default().fg(theme.inactive_fg).bg(theme.bg);
    buf.set_string(inner.x, ground, "─".repeat(usize::from(inner.width)), ground_style);

    for tile in view.session.state().tiles.iter() {
        if let Some(rect) = layout.tile_rect(tile) {
            draw_tile(frame, theme, tile, rect);
        }
    }

    let buf = frame.buffer_mut();
    for ev in view.session.state().feedback.iter() {
        let progress = ev.age(view.now).as_secs_f64() / FEEDBACK_LIFETIME.as_secs_f64();
        let y_pct = ev.y_pct - progress.min(1.0) * FEEDBACK_RISE_PCT;
        if let Some((x, y)) = layout.cell_at_pct(ev.x_pct, y_pct) {
            let room = usize::from(inner.right() - x);
            let style = Style::default()
                .fg(theme.tone_color(ev.tone))
                .bg(theme.bg)
                .add_modifier(Modifier::BOLD);
            buf.set_stringn(x, y, &ev.text, room, style);
        }
    }
}

/// A tile is a filled box with its glyph and label. Crushed tiles fade while rising out.
fn draw_tile(frame: &mut Frame, theme: &Theme, tile: &LiveTile, rect: Rect) {
    let color = theme.tile_color(&tile.kind);
    let (style, text) = match tile.state {
        TileState::Crushed => (
            Style::default()
                .fg(color)
                .bg(theme.bg)
                .add_modifier(Modifier::DIM),
            "✕".to_string(),
        ),
        TileState::Live | TileState::Missed => (
            Style::default()
                .fg(theme.bg)
                .bg(color)
                .add_modifier(Modifier::BOLD),
            format!("{} {}", tile.kind.asset, tile.kind.label),
        ),
    };
    let p = Paragraph::new(Line::from(text))
        .alignment(Alignment::Center)
        .style(style);
    frame.render_widget(p, rect);
}

fn draw_game_over(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let summary = view.session.summary().unwrap_or(SessionSummary {
        score: view.session.state().score.score,
        crushed: view.session.state().score.crushed,
    });
    let tier = EndTier::for_score(summary.score);
    let text = Style::default().fg(theme.main_fg);
    let popup = centered(area, 40, 14);

    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Time's up! ",
            Style::default()
                .fg(theme.bg)
                .bg(theme.urgent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            tier.message(),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", summary.score), text)),
        Line::from(Span::styled(format!(" Best: {} ", view.best), text)),
        Line::from(Span::styled(format!(" Crushed: {} ", summary.crushed), text)),
    ];
    if let Some(rank) = view.rank {
        lines.push(Line::from(Span::styled(
            format!(" New leaderboard entry: #{rank} "),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R Restart    Q Menu ",
        Style::default().fg(theme.inactive_fg),
    )));
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" TileCrush ", theme.title)),
    );
    frame.render_widget(p, popup);
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    let buf = frame.buffer_mut();
    for y in quit_rect.top()..quit_rect.bottom() {
        for x in quit_rect.left()..quit_rect.right() {
            buf[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }
    let inner = block.inner(quit_rect);
    frame.render_widget(block, quit_rect);

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::MainMenu, " Main Menu "),
        (QuitOption::Exit, " Exit "),
    ];
    let buf = frame.buffer_mut();
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            buf.set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn layout() -> PlayfieldLayout {
        PlayfieldLayout::new(Rect::new(0, 0, 80, 30), 4)
    }

    fn tile(id: u64, lane: usize, y: f64) -> LiveTile {
        let catalog = Catalog::standard().unwrap();
        LiveTile {
            id: TileId(id),
            kind: catalog.kinds()[0],
            lane,
            y,
            speed: 1.0,
            state: TileState::Live,
        }
    }

    #[test]
    fn layout_centres_lanes_below_header() {
        let l = layout();
        assert_eq!(l.header, Rect::new(15, 0, 50, 3));
        assert_eq!(l.outer, Rect::new(15, 3, 50, 27));
        assert_eq!(l.inner, Rect::new(16, 4, 48, 25));
        let area = l.play_area();
        assert_eq!((area.x, area.y, area.width, area.height), (16.0, 4.0, 48.0, 25.0));
    }

    #[test]
    fn narrow_terminal_clamps_width() {
        let l = PlayfieldLayout::new(Rect::new(0, 0, 20, 10), 4);
        assert_eq!(l.outer.width, 20);
        assert_eq!(l.inner.width, 18);
    }

    #[test]
    fn tile_rect_sits_in_its_lane() {
        let l = layout();
        assert_eq!(l.tile_rect(&tile(1, 0, 0.0)), Some(Rect::new(17, 4, 10, 2)));
        assert_eq!(l.tile_rect(&tile(2, 3, 0.0)), Some(Rect::new(53, 4, 10, 2)));
        // Partly above the playfield: only the lower row shows.
        assert_eq!(l.tile_rect(&tile(3, 0, -4.0)), Some(Rect::new(17, 4, 10, 1)));
        assert_eq!(l.tile_rect(&tile(4, 0, -10.0)), None);
    }

    #[test]
    fn hit_test_prefers_topmost_live_tile() {
        let l = layout();
        let mut tiles = LiveTiles::new();
        tiles.push(tile(1, 0, 0.0));
        tiles.push(tile(2, 0, 4.0));
        assert_eq!(l.hit_test(&tiles, 17, 4), Some(TileId(1)));
        assert_eq!(l.hit_test(&tiles, 17, 5), Some(TileId(2)));
        assert_eq!(l.hit_test(&tiles, 16, 5), None);
        tiles.get_mut(TileId(2)).unwrap().state = TileState::Crushed;
        assert_eq!(l.hit_test(&tiles, 17, 5), Some(TileId(1)));
        assert_eq!(l.hit_test(&tiles, 40, 20), None);
    }

    #[test]
    fn tile_center_maps_back_into_the_tile() {
        let l = layout();
        let t = tile(1, 1, 40.0);
        let rect = l.tile_rect(&t).unwrap();
        let c = l.tile_center(&t).unwrap();
        assert!(rect.contains(Position { x: c.x as u16, y: c.y as u16 }));
        let (x_pct, y_pct) = l.play_area().relative(c);
        assert!((0.0..=100.0).contains(&x_pct) && (0.0..=100.0).contains(&y_pct));
    }

    #[test]
    fn shift_moves_playfield_only() {
        let l = layout();
        let s = l.shifted(-1);
        assert_eq!(s.inner.x, l.inner.x - 1);
        assert_eq!(s.header, l.header);
        assert_eq!(PlayfieldLayout::new(Rect::new(0, 0, 10, 10), 4).shifted(-1).outer.x, 0);
    }

    #[test]
    fn shaken_frame_hit_tests_where_drawn() {
        let area = Rect::new(0, 0, 80, 30);
        let mut tiles = LiveTiles::new();
        tiles.push(tile(1, 0, 0.0));
        // Unshaken the tile spans columns 17..27; frame 0 of a shake moves it right.
        let still = frame_layout(area, 4, false, 0);
        let shaken = frame_layout(area, 4, true, 0);
        assert_eq!(still, layout());
        assert_eq!(still.hit_test(&tiles, 27, 4), None);
        assert_eq!(shaken.hit_test(&tiles, 27, 4), Some(TileId(1)));
        assert_eq!(shaken.hit_test(&tiles, 17, 4), None);
        assert_eq!(frame_layout(area, 4, true, 1).hit_test(&tiles, 16, 4), Some(TileId(1)));
    }

    #[test]
    fn percent_cells_and_ground() {
        let l = layout();
        assert_eq!(l.cell_at_pct(0.0, 0.0), Some((16, 4)));
        assert_eq!(l.cell_at_pct(50.0, 50.0), Some((40, 16)));
        assert_eq!(l.cell_at_pct(50.0, -5.0), None);
        assert_eq!(l.ground_row(), 27);
    }
}
