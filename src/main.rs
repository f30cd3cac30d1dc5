//! TileCrush: timed arcade reflex game in the terminal. Crush falling tiles, dodge the disguised bomb.

mod app;
mod audio;
mod catalog;
mod crush;
mod difficulty;
mod input;
mod leaderboard;
mod session;
mod settings;
mod sim;
mod spawner;
mod theme;
mod tiles;
mod timer;
mod ui;

use anyhow::{Context, Result};
use app::App;
use catalog::Catalog;
use clap::{Parser, ValueEnum};
use env_logger::{Env, Target};

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub session_secs: u32,
    pub lanes: usize,
    pub seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    let catalog = Catalog::standard().context("built-in tile catalog is invalid")?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded: {e}");
        theme::Theme::default()
    });
    let config = GameConfig {
        session_secs: args.time_limit,
        lanes: usize::from(args.lanes),
        seed: args.seed.unwrap_or_else(rand::random),
    };
    log::info!("starting with {config:?}");
    let mut app = App::new(args, config, theme, catalog)?;
    app.run()?;
    Ok(())
}

/// The alternate screen owns stdout, so logs go to a file. No file, no logging.
fn init_logging() {
    let Ok(dir) = settings::config_dir() else {
        return;
    };
    let file = std::fs::create_dir_all(&dir).and_then(|_| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("tilecrush.log"))
    });
    if let Ok(file) = file {
        env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
            .target(Target::Pipe(Box::new(file)))
            .init();
    }
}

fn default_player() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "player".to_string())
}

/// Timed arcade reflex game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tilecrush",
    version,
    about = "Timed arcade reflex game in the terminal: crush falling tiles, dodge the disguised bomb.",
    long_about = "TileCrush drops tiles down a few lanes. Crush them before they reach the ground.\n\n\
        Quick successive crushes build a combo (up to x5). One tile kind is a bomb that looks \
        like any other: crushing it wipes your score. Thorns cost points.\n\n\
        CONTROLS:\n  Mouse click   Crush tile      1-9 / d f j k  Crush lowest tile in lane\n  \
        Enter/Space   Start           M              Toggle sound (menu)\n  \
        Q / Esc       Quit menu       R              Restart after a session"
)]
pub struct Args {
    /// Session length in seconds.
    #[arg(long, default_value_t = 60, value_name = "SECS", value_parser = clap::value_parser!(u32).range(1..=3600))]
    pub time_limit: u32,

    /// Number of lanes tiles fall in.
    #[arg(long, default_value_t = 4, value_name = "N", value_parser = clap::value_parser!(u8).range(2..=8))]
    pub lanes: u8,

    /// RNG seed for reproducible sessions. Random if not set.
    #[arg(long, value_name = "U64")]
    pub seed: Option<u64>,

    /// Name stored with leaderboard entries.
    #[arg(long, default_value_t = default_player(), value_name = "NAME")]
    pub player: String,

    /// Mute audio for this run (the stored preference is kept).
    #[arg(long)]
    pub no_sound: bool,

    /// Skip main menu and start a session immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the flash effect when a bomb or thorn is crushed.
    #[arg(long)]
    pub no_animation: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let args = Args::try_parse_from(["tilecrush"]).unwrap();
        assert_eq!(args.time_limit, 60);
        assert_eq!(args.lanes, 4);
        assert!(args.seed.is_none());
        assert_eq!(args.palette, Palette::Normal);
    }

    #[test]
    fn rejects_out_of_range_lanes() {
        assert!(Args::try_parse_from(["tilecrush", "--lanes", "1"]).is_err());
        assert!(Args::try_parse_from(["tilecrush", "--lanes", "9"]).is_err());
        let args = Args::try_parse_from(["tilecrush", "--lanes", "8", "--seed", "7"]).unwrap();
        assert_eq!((args.lanes, args.seed), (8, Some(7)));
    }

    #[test]
    fn palette_aliases() {
        let args = Args::try_parse_from(["tilecrush", "--palette", "colourblind"]).unwrap();
        assert_eq!(args.palette, Palette::Colorblind);
    }
}
