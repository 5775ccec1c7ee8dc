use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextPage,
    PrevPage,
    JumpPage(u8),
    Down,
    Up,
    PageDown,
    PageUp,
    Top,
    Bottom,
    GPrefix,
    ToggleHelp,
    StartFilter,
    StartCommand,
    Refresh,
    HeaderLeft,
    HeaderRight,
    SortFocused,
    CycleNamespace,
    CycleCategory,
    ClearFilters,
    RestartSelected,
    OpenLogs,
    CloseOverlay,
    DismissError,
    SubmitInput,
    CancelInput,
    Backspace,
    DeleteWord,
    InputChar(char),
    ConfirmYes,
    ConfirmNo,
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Filter | InputMode::Command => map_input_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PageDown)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(c @ '1'..='9') if key.modifiers.is_empty() => {
            c.to_digit(10).map(|digit| Action::JumpPage(digit as u8))
        }
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Left | KeyCode::BackTab => Some(Action::PrevPage),
        KeyCode::Right | KeyCode::Tab => Some(Action::NextPage),
        KeyCode::Char('g') => Some(Action::GPrefix),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Home => Some(Action::Top),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('/') => Some(Action::StartFilter),
        KeyCode::Char(':') => Some(Action::StartCommand),
        KeyCode::Char('[') => Some(Action::HeaderLeft),
        KeyCode::Char(']') => Some(Action::HeaderRight),
        KeyCode::Char('s') => Some(Action::SortFocused),
        KeyCode::Char('N') => Some(Action::CycleNamespace),
        KeyCode::Char('T') => Some(Action::CycleCategory),
        KeyCode::Char('c') => Some(Action::ClearFilters),
        KeyCode::Char('R') => Some(Action::RestartSelected),
        KeyCode::Char('l') | KeyCode::Enter => Some(Action::OpenLogs),
        KeyCode::Char('x') => Some(Action::DismissError),
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmYes),
        KeyCode::Char('n') => Some(Action::ConfirmNo),
        KeyCode::Esc => Some(Action::CloseOverlay),
        _ => None,
    }
}

fn map_input_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::DeleteWord)
        }
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}
