use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use crate::app::Result;

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
}

pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    pub fn next(&self) -> Result<AppEvent> {
        if event::poll(self.tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release {
                    return Ok(AppEvent::Key(key));
                }
            }
        }
        Ok(AppEvent::Tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    NextTab,
    TogglePane,
    StartSearch,
    CycleSort,
    OpenInBrowser,
    Share,
    Refresh,
    None,
}

impl From<KeyEvent> for Action {
    fn from(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
            KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
            KeyCode::Tab | KeyCode::BackTab => Action::NextTab,
            KeyCode::Enter => Action::TogglePane,
            KeyCode::Char('/') => Action::StartSearch,
            KeyCode::Char('s') => Action::CycleSort,
            KeyCode::Char('o') => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::Share,
            KeyCode::Char('R') => Action::Refresh,
            _ => Action::None,
        }
    }
}

/// Keys while the search box has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Insert(char),
    Backspace,
    Clear,
    /// Search now instead of waiting for typing to pause.
    Submit,
    Done,
    None,
}

impl From<KeyEvent> for EditAction {
    fn from(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                EditAction::Clear
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                EditAction::Insert(c)
            }
            KeyCode::Backspace => EditAction::Backspace,
            KeyCode::Enter => EditAction::Submit,
            KeyCode::Esc => EditAction::Done,
            _ => EditAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_normal_mode_keys() {
        assert_eq!(Action::from(key(KeyCode::Char('/'))), Action::StartSearch);
        assert_eq!(Action::from(key(KeyCode::Char('s'))), Action::CycleSort);
        assert_eq!(Action::from(key(KeyCode::Char('R'))), Action::Refresh);
        assert_eq!(Action::from(key(KeyCode::Char('r'))), Action::None);
        assert_eq!(Action::from(key(KeyCode::Char('y'))), Action::Share);
    }

    #[test]
    fn test_editing_keys_are_text() {
        assert_eq!(EditAction::from(key(KeyCode::Char('q'))), EditAction::Insert('q'));
        assert_eq!(EditAction::from(key(KeyCode::Char('/'))), EditAction::Insert('/'));
        assert_eq!(EditAction::from(key(KeyCode::Esc)), EditAction::Done);
        assert_eq!(
            EditAction::from(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL)),
            EditAction::Clear
        );
    }
}
