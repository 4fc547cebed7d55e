use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dice_types::DieFace;

/// Player actions bound to single keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Choose(DieFace),
    Roll,
    NewGame,
    Save,
    Leaderboard,
    Quit,
}

pub const HELP: &str = "1-6 pick face | r/space roll | n new game | s save | l leaderboard | q quit";

impl Command {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('d') => Some(Command::Quit),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Char(c @ '1'..='6') => DieFace::new(c as u8 - b'0').ok().map(Command::Choose),
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Char(' ') => Some(Command::Roll),
            KeyCode::Char('n') | KeyCode::Char('N') => Some(Command::NewGame),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::Save),
            KeyCode::Char('l') | KeyCode::Char('L') => Some(Command::Leaderboard),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        }
    }
}
