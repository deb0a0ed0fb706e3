use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use luckydraw_core::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Quit,
    ToggleHelp,
    Lottery(Key),
    NextPrize,
    PrevPrize,
    ToggleUsed,
    ResetWinners,
    ClearLog,
}

pub fn map_key(key: KeyEvent) -> InputAction {
    match key.code {
        KeyCode::Char(' ') => InputAction::Lottery(Key::Space),
        KeyCode::Esc => InputAction::Lottery(Key::Escape),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => InputAction::Quit,
        KeyCode::Char('q') => InputAction::Quit,
        KeyCode::Char('?') => InputAction::ToggleHelp,
        KeyCode::Right | KeyCode::Char('n') => InputAction::NextPrize,
        KeyCode::Left | KeyCode::Char('p') => InputAction::PrevPrize,
        KeyCode::Char('u') => InputAction::ToggleUsed,
        KeyCode::Char('R') => InputAction::ResetWinners,
        KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            InputAction::ClearLog
        }
        _ => InputAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_keys_reach_the_session() {
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)),
            InputAction::Lottery(Key::Space)
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            InputAction::Lottery(Key::Escape)
        );
    }

    #[test]
    fn admin_shortcuts() {
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE)),
            InputAction::NextPrize
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            InputAction::ResetWinners
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            InputAction::Quit
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)),
            InputAction::None
        );
    }
}
