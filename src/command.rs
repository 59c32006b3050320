use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A user action, decoded from a key press
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Command {
    /// Ctrl-C
    Quit,
    Up,
    Down,
    Left,
    Right,
    /// Toggle pause
    Pause,
    /// (Re)start the game
    Start,
    Q,
}

impl Command {
    pub(crate) fn from_key_event(ev: KeyEvent) -> Option<Command> {
        if (ev.modifiers, ev.code) == (KeyModifiers::CONTROL, KeyCode::Char('c')) {
            return Some(Command::Quit);
        }
        if !(KeyModifiers::NONE | KeyModifiers::SHIFT).contains(ev.modifiers) {
            return None;
        }
        match ev.code {
            KeyCode::Char('w' | 'W' | 'k') | KeyCode::Up => Some(Command::Up),
            KeyCode::Char('s' | 'S' | 'j') | KeyCode::Down => Some(Command::Down),
            KeyCode::Char('a' | 'A' | 'h') | KeyCode::Left => Some(Command::Left),
            KeyCode::Char('d' | 'D' | 'l') | KeyCode::Right => Some(Command::Right),
            KeyCode::Char(' ') => Some(Command::Pause),
            KeyCode::Enter | KeyCode::Char('n') => Some(Command::Start),
            KeyCode::Char('q') => Some(Command::Q),
            _ => None,
        }
    }
}
