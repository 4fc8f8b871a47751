use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Next,
    Previous,
    First,
    Last,
    OpenLink,
    ToggleHelp,
    Close,
}

/// Wait up to `timeout` for a key press and map it to an action.
pub fn next_action(timeout: Duration) -> color_eyre::Result<Option<Action>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(action_for(key)),
        _ => Ok(None),
    }
}

pub fn action_for(key: KeyEvent) -> Option<Action> {
    let action = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
        (KeyCode::Char('q'), _) => Action::Quit,
        (KeyCode::Esc, _) => Action::Close,
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Action::Next,
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Action::Previous,
        (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Action::First,
        (KeyCode::End, _) | (KeyCode::Char('G'), _) => Action::Last,
        (KeyCode::Enter, _) => Action::OpenLink,
        (KeyCode::Char('?'), _) => Action::ToggleHelp,
        _ => return None,
    };
    Some(action)
}
