//! App: terminal init, main loop, screens, key and mouse handling.

use crate::audio::TerminalBell;
use crate::catalog::{Catalog, TileCategory};
use crate::crush::ScreenPoint;
use crate::input::{Action, key_to_action};
use crate::leaderboard::{Leaderboard, LeaderboardEntry, LocalLeaderboard, Standings};
use crate::session::{Phase, Session, SessionSummary};
use crate::settings::Settings;
use crate::theme::Theme;
use crate::tiles::TileId;
use crate::ui::{self, PlayfieldLayout, View};
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Target frame time (~60 FPS).
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::MainMenu,
            Self::MainMenu => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::MainMenu => Self::Resume,
            Self::Exit => Self::MainMenu,
        }
    }
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    catalog: Catalog,
    settings: Settings,
    leaderboard: Option<LocalLeaderboard>,
    standings: Vec<LeaderboardEntry>,
    session: Session,
    /// Sessions started so far; offsets the seed so each one differs.
    sessions_started: u64,
    ended_tx: Sender<SessionSummary>,
    ended_rx: Receiver<SessionSummary>,
    screen: Screen,
    quit_selected: QuitOption,
    best: u32,
    rank: Option<usize>,
    /// Playfield of the last drawn frame (shifted while shaking), used for hit-testing.
    layout: PlayfieldLayout,
    /// TachyonFX flash shown while the screen shakes.
    flash: Option<Effect>,
    flash_process_time: Option<Instant>,
    frame_count: u64,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme, catalog: Catalog) -> Result<Self> {
        let settings = Settings::load();
        let leaderboard = match LocalLeaderboard::open_default() {
            Ok(board) => Some(board),
            Err(e) => {
                log::warn!("leaderboard unavailable: {e}");
                None
            }
        };
        Ok(Self::with_storage(args, config, theme, catalog, settings, leaderboard))
    }

    fn with_storage(
        args: Args,
        config: GameConfig,
        theme: Theme,
        catalog: Catalog,
        settings: Settings,
        leaderboard: Option<LocalLeaderboard>,
    ) -> Self {
        let (ended_tx, ended_rx) = mpsc::channel();
        let session = Session::new(&config, catalog.clone());
        let layout = PlayfieldLayout::new(Rect::default(), config.lanes);
        let mut app = Self {
            args,
            config,
            theme,
            catalog,
            settings,
            leaderboard,
            standings: Vec::new(),
            session,
            sessions_started: 0,
            ended_tx,
            ended_rx,
            screen: Screen::Menu,
            quit_selected: QuitOption::Resume,
            best: 0,
            rank: None,
            layout,
            flash: None,
            flash_process_time: None,
            frame_count: 0,
        };
        app.refresh_standings();
        if app.args.no_menu {
            app.start_session(Instant::now());
        }
        app
    }

    fn sound_enabled(&self) -> bool {
        self.settings.sound_enabled && !self.args.no_sound
    }

    fn refresh_standings(&mut self) {
        let Some(board) = &self.leaderboard else {
            return;
        };
        match board.fetch() {
            Ok(entries) => {
                log::info!("leaderboard loaded: {} entries", entries.len());
                let standings = Standings { entries };
                self.best = self.best.max(standings.top_score().unwrap_or(0));
                self.standings = standings.entries;
            }
            Err(e) => log::warn!("leaderboard fetch failed: {e}"),
        }
    }

    /// Fresh session for every play; the previous one (and its callback) is dropped.
    fn start_session(&mut self, now: Instant) {
        let config = GameConfig {
            seed: self.config.seed.wrapping_add(self.sessions_started),
            ..self.config.clone()
        };
        self.sessions_started += 1;
        let mut session = Session::new(&config, self.catalog.clone())
            .with_audio(Box::new(TerminalBell::new(self.sound_enabled())));
        let tx = self.ended_tx.clone();
        session.on_session_end(move |summary| {
            if let Err(e) = tx.send(summary) {
                log::debug!("session result dropped: {e}");
            }
        });
        session.start(now);
        self.session = session;
        self.rank = None;
        self.flash = None;
        self.flash_process_time = None;
        self.quit_selected = QuitOption::Resume;
        self.screen = Screen::Playing;
    }

    /// Leaving mid-session discards it without recording a score.
    fn abandon_session(&mut self) {
        log::info!("session abandoned");
        self.enter_menu();
    }

    /// The menu holds an idle session; the finished or abandoned one is dropped.
    fn enter_menu(&mut self) {
        self.session = Session::new(&self.config, self.catalog.clone());
        self.flash = None;
        self.refresh_standings();
        self.screen = Screen::Menu;
    }

    fn finish_session(&mut self, summary: SessionSummary) {
        self.best = self.best.max(summary.score);
        if let Some(board) = &mut self.leaderboard {
            let entry = LeaderboardEntry::now(&self.args.player, summary.score, summary.crushed);
            match board.submit(entry) {
                Ok(rank) => self.rank = rank,
                Err(e) => log::warn!("leaderboard submit failed: {e}"),
            }
        }
        self.refresh_standings();
        self.flash = None;
        self.screen = Screen::GameOver;
    }

    fn toggle_sound(&mut self) {
        self.settings.toggle_sound();
        if let Err(e) = self.settings.save() {
            log::warn!("saving settings failed: {e}");
        }
    }

    fn crush(&mut self, id: TileId, point: ScreenPoint, now: Instant) {
        let area = self.layout.play_area();
        let Some(outcome) = self.session.record_interaction(id, point, area, now) else {
            return;
        };
        let shakes = matches!(outcome.category, TileCategory::Bomb | TileCategory::PenaltyHeavy);
        if shakes && !self.args.no_animation {
            self.flash = Some(ui::shake_flash(&self.theme));
            self.flash_process_time = None;
        }
    }

    fn crush_in_lane(&mut self, lane: usize, now: Instant) {
        if lane >= self.config.lanes {
            return;
        }
        let target = self
            .session
            .state()
            .tiles
            .lowest_live_in_lane(lane)
            .and_then(|t| self.layout.tile_center(t).map(|p| (t.id, p)));
        if let Some((id, point)) = target {
            self.crush(id, point, now);
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if self.screen != Screen::Playing {
            return;
        }
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            let hit = self
                .layout
                .hit_test(&self.session.state().tiles, mouse.column, mouse.row);
            if let Some(id) = hit {
                let point = ScreenPoint {
                    x: f64::from(mouse.column),
                    y: f64::from(mouse.row),
                };
                self.crush(id, point, now);
            }
        }
    }

    /// Returns `false` when the app should exit.
    fn handle_action(&mut self, action: Action, now: Instant) -> bool {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return false,
                Action::Confirm | Action::Restart => self.start_session(now),
                Action::ToggleSound => self.toggle_sound(),
                _ => {}
            },
            Screen::Playing => match action {
                Action::Lane(lane) => self.crush_in_lane(lane, now),
                Action::Quit => {
                    self.quit_selected = QuitOption::Resume;
                    self.screen = Screen::QuitMenu;
                }
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Lane(_) => self.quit_selected = self.quit_selected.next(),
                Action::Up => self.quit_selected = self.quit_selected.prev(),
                Action::Confirm => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::MainMenu => self.abandon_session(),
                    QuitOption::Exit => return false,
                },
                Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Restart | Action::Confirm => self.start_session(now),
                Action::Quit => self.enter_menu(),
                Action::ToggleSound => self.toggle_sound(),
                _ => {}
            },
        }
        true
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        result
    }

    /// Per-frame bookkeeping: drive the session and react to its end.
    fn advance(&mut self, now: Instant) {
        if matches!(self.screen, Screen::Playing | Screen::QuitMenu) {
            self.session.update(now);
        }
        while let Ok(summary) = self.ended_rx.try_recv() {
            self.finish_session(summary);
        }
        if self.screen == Screen::QuitMenu && self.session.phase() == Phase::Over {
            self.screen = Screen::GameOver;
        }
        if self.flash.as_ref().is_some_and(|e| e.done()) {
            self.flash = None;
            self.flash_process_time = None;
        }
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.advance(now);

            let mut layout = self.layout;
            let view = View {
                screen: self.screen,
                session: &self.session,
                theme: &self.theme,
                lanes: self.config.lanes,
                best: self.best,
                sound_enabled: self.sound_enabled(),
                leaderboard: &self.standings,
                quit_selected: self.quit_selected,
                rank: self.rank,
                frame_count: self.frame_count,
                now,
            };
            let flash = &mut self.flash;
            let flash_time = &mut self.flash_process_time;
            terminal.draw(|f| {
                layout = ui::draw(f, &view, flash, flash_time);
            })?;
            self.layout = layout;
            self.frame_count = self.frame_count.wrapping_add(1);

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let now = Instant::now();
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if !self.handle_action(key_to_action(key), now) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.handle_mouse(mouse, now),
                        _ => {}
                    }
                }
            }
        }
    }
}
