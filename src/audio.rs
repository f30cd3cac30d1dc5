//! Audio cues. The terminal build rings the bell; playback never affects game state.

use crossterm::execute;
use crossterm::style::Print;
use std::io::Write;
use thiserror::Error;

/// Score tier reached at session end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndTier {
    Legendary,
    KeepItUp,
    TryHarder,
    WarmUp,
}

impl EndTier {
    pub fn for_score(score: u32) -> Self {
        match score {
            5000.. => Self::Legendary,
            3000.. => Self::KeepItUp,
            1000.. => Self::TryHarder,
            _ => Self::WarmUp,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Legendary => "Legendary",
            Self::KeepItUp => "Keep it up",
            Self::TryHarder => "Try harder",
            Self::WarmUp => "Warm-up round",
        }
    }

    /// Lowest tier ends silently.
    pub fn has_cue(&self) -> bool {
        *self != Self::WarmUp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Click,
    Bomb,
    SessionEnd(EndTier),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output failed: {0}")]
    Output(#[from] std::io::Error),
}

pub trait AudioSink {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError>;
}

/// Plays nothing.
#[derive(Debug, Default)]
pub struct Silent;

impl AudioSink for Silent {
    fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Rings the terminal bell for bombs and scored session ends. Clicks stay quiet.
///
/// BEL goes out as a crossterm command on stdout, the same handle the ratatui
/// backend draws through. It does not move the cursor or touch the alternate screen.
#[derive(Debug)]
pub struct TerminalBell {
    enabled: bool,
}

impl TerminalBell {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn rings(cue: Cue) -> bool {
        match cue {
            Cue::Click => false,
            Cue::Bomb => true,
            Cue::SessionEnd(tier) => tier.has_cue(),
        }
    }
}

fn ring(out: &mut impl Write) -> std::io::Result<()> {
    execute!(out, Print('\x07'))
}

impl AudioSink for TerminalBell {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }
        if Self::rings(cue) {
            ring(&mut std::io::stdout())?;
        }
        Ok(())
    }
}

/// Plays a cue, logging instead of propagating failures.
pub fn play_best_effort(sink: &mut dyn AudioSink, cue: Cue) {
    if let Err(e) = sink.play(cue) {
        log::warn!("{cue:?}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl AudioSink for Broken {
        fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
            Err(std::io::Error::other("no device").into())
        }
    }

    #[test]
    fn tiers_by_score() {
        assert_eq!(EndTier::for_score(0), EndTier::WarmUp);
        assert_eq!(EndTier::for_score(999), EndTier::WarmUp);
        assert_eq!(EndTier::for_score(1000), EndTier::TryHarder);
        assert_eq!(EndTier::for_score(3000), EndTier::KeepItUp);
        assert_eq!(EndTier::for_score(12_000), EndTier::Legendary);
        assert!(!EndTier::WarmUp.has_cue());
        assert_eq!(EndTier::Legendary.message(), "Legendary");
    }

    #[test]
    fn bell_is_a_single_bel_for_loud_cues() {
        let mut out = Vec::new();
        ring(&mut out).unwrap();
        assert_eq!(out, b"\x07");
        assert!(TerminalBell::rings(Cue::Bomb));
        assert!(TerminalBell::rings(Cue::SessionEnd(EndTier::Legendary)));
        assert!(!TerminalBell::rings(Cue::SessionEnd(EndTier::WarmUp)));
        assert!(!TerminalBell::rings(Cue::Click));
    }

    #[test]
    fn failures_are_swallowed() {
        play_best_effort(&mut Broken, Cue::Bomb);
        play_best_effort(&mut Silent, Cue::Click);
        play_best_effort(&mut TerminalBell::new(false), Cue::Bomb);
    }
}
