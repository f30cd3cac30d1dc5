//! Key bindings. Tiles are crushed with the mouse or with one key per lane.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Home-row lane keys, left to right.
const HOME_ROW: [char; 4] = ['d', 'f', 'j', 'k'];

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Crush the lowest live tile in this lane (0-based).
    Lane(usize),
    Confirm,
    Up,
    Down,
    ToggleSound,
    Restart,
    Quit,
    None,
}

/// Map key event to action. Lanes: `1`..`9`, or `d f j k` for the first four.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Char('m') | KeyCode::Char('M') => Action::ToggleSound,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Restart,
        KeyCode::Char(c @ '1'..='9') => Action::Lane(c as usize - '1' as usize),
        KeyCode::Char(c) => HOME_ROW
            .iter()
            .position(|k| *k == c.to_ascii_lowercase())
            .map_or(Action::None, Action::Lane),
        _ => Action::None,
    }
}
