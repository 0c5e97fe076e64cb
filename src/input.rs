//! Key bindings: normal and vim-style.

use crate::tiles::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    /// Select a tile, pop a bubble, confirm a menu entry.
    Activate,
    Pause,
    Quit,
    Restart,
    None,
}

/// Map key event to action. Supports both normal (arrows, enter) and vim (hjkl) keys.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('l') => Action::Move(Direction::Right),
        KeyCode::Up | KeyCode::Char('k') => Action::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') => Action::Move(Direction::Down),
        KeyCode::Enter | KeyCode::Char(' ') => Action::Activate,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_vim_keys_agree() {
        assert_eq!(key_to_action(key(KeyCode::Left)), key_to_action(key(KeyCode::Char('h'))));
        assert_eq!(key_to_action(key(KeyCode::Down)), Action::Move(Direction::Down));
        assert_eq!(key_to_action(key(KeyCode::Char('k'))), Action::Move(Direction::Up));
    }

    #[test]
    fn enter_and_space_activate() {
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Activate);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Activate);
    }

    #[test]
    fn control_chords_are_ignored() {
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_q), Action::None);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
    }
}
