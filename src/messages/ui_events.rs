//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Panel navigation
    NextPanel,
    PrevPanel,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Newline,
    Backspace,
    CursorLeft,
    CursorRight,
    /// Bracketed paste; goes to the import popup or the field being edited
    Paste(String),

    // Request actions
    SendRequest,
    CancelRequest,
    CycleMethod,
    CopyRequest,

    // Headers
    NextHeader,
    PrevHeader,
    ToggleHeader,
    AddHeader,
    DeleteHeader,

    // Import popup
    ShowImport,
    ImportChar(char),
    ImportNewline,
    ImportBackspace,
    ImportFromClipboard,
    SubmitImport,
    CancelImport,

    // Response tree
    PrevLine,
    NextLine,
    ToggleRow,
    CopyRow,
    CopyBody,
    ExpandAll,
    CollapseAll,
    ToggleResponseHeaders,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Active panel in the UI (needed for context-aware event mapping)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Panel {
    #[default]
    Url,
    Headers,
    Body,
    Response,
}

impl Panel {
    pub fn next(&self) -> Panel {
        match self {
            Panel::Url => Panel::Headers,
            Panel::Headers => Panel::Body,
            Panel::Body => Panel::Response,
            Panel::Response => Panel::Url,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Url => Panel::Response,
            Panel::Headers => Panel::Url,
            Panel::Body => Panel::Headers,
            Panel::Response => Panel::Body,
        }
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_panel: Panel,
    input_mode: InputMode,
    show_help: bool,
    show_import: bool,
) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global Ctrl shortcuts
    if ctrl {
        match key.code {
            KeyCode::Char('x') => return Some(UiEvent::CancelRequest),
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            _ => {}
        }
    }

    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    if show_import {
        return match key.code {
            KeyCode::Esc => Some(UiEvent::CancelImport),
            KeyCode::Char('v') if ctrl => Some(UiEvent::ImportFromClipboard),
            KeyCode::Char('j') if ctrl => Some(UiEvent::ImportNewline),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => Some(UiEvent::ImportNewline),
            KeyCode::Enter => Some(UiEvent::SubmitImport),
            KeyCode::Backspace => Some(UiEvent::ImportBackspace),
            KeyCode::Char(c) => Some(UiEvent::ImportChar(c)),
            _ => None,
        };
    }

    match input_mode {
        InputMode::Normal => handle_normal_keys(key, active_panel),
        InputMode::Editing => handle_editing_keys(key, active_panel),
    }
}

fn handle_normal_keys(key: KeyEvent, active_panel: Panel) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Char('i') => Some(UiEvent::ShowImport),
        KeyCode::Char('c') => Some(UiEvent::CopyRequest),
        KeyCode::Char('m') => Some(UiEvent::CycleMethod),
        KeyCode::Char('s') => Some(UiEvent::SendRequest),
        KeyCode::Tab => Some(UiEvent::NextPanel),
        KeyCode::BackTab => Some(UiEvent::PrevPanel),
        _ => match active_panel {
            Panel::Url | Panel::Body => match key.code {
                KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
                _ => None,
            },
            Panel::Headers => match key.code {
                KeyCode::Char('e') => Some(UiEvent::StartEditing),
                KeyCode::Enter | KeyCode::Char(' ') => Some(UiEvent::ToggleHeader),
                KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::PrevHeader),
                KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::NextHeader),
                KeyCode::Char('a') => Some(UiEvent::AddHeader),
                KeyCode::Char('d') => Some(UiEvent::DeleteHeader),
                _ => None,
            },
            Panel::Response => match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::PrevLine),
                KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::NextLine),
                KeyCode::Enter | KeyCode::Char(' ') => Some(UiEvent::ToggleRow),
                KeyCode::Char('y') => Some(UiEvent::CopyRow),
                KeyCode::Char('Y') => Some(UiEvent::CopyBody),
                KeyCode::Char('E') => Some(UiEvent::ExpandAll),
                KeyCode::Char('C') => Some(UiEvent::CollapseAll),
                KeyCode::Char('h') => Some(UiEvent::ToggleResponseHeaders),
                _ => None,
            },
        },
    }
}

fn handle_editing_keys(key: KeyEvent, active_panel: Panel) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        KeyCode::Enter => match active_panel {
            Panel::Url => Some(UiEvent::SendRequest),
            Panel::Body => Some(UiEvent::Newline),
            _ => Some(UiEvent::StopEditing),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_import_popup_captures_typing() {
        let event = key_to_ui_event(press(KeyCode::Char('q')), Panel::Url, InputMode::Normal, false, true);
        assert_eq!(event, Some(UiEvent::ImportChar('q')));

        let paste = KeyEvent::new(KeyCode::Char('v'), KeyModifiers::CONTROL);
        let event = key_to_ui_event(paste, Panel::Url, InputMode::Normal, false, true);
        assert_eq!(event, Some(UiEvent::ImportFromClipboard));
    }

    #[test]
    fn test_response_keys_depend_on_panel() {
        let y = press(KeyCode::Char('y'));
        assert_eq!(
            key_to_ui_event(y, Panel::Response, InputMode::Normal, false, false),
            Some(UiEvent::CopyRow)
        );
        assert_eq!(key_to_ui_event(y, Panel::Url, InputMode::Normal, false, false), None);

        let enter = press(KeyCode::Enter);
        assert_eq!(
            key_to_ui_event(enter, Panel::Response, InputMode::Normal, false, false),
            Some(UiEvent::ToggleRow)
        );
        assert_eq!(
            key_to_ui_event(enter, Panel::Body, InputMode::Editing, false, false),
            Some(UiEvent::Newline)
        );
    }

    #[test]
    fn test_ctrl_x_cancels_everywhere() {
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(
            key_to_ui_event(key, Panel::Body, InputMode::Editing, false, false),
            Some(UiEvent::CancelRequest)
        );
    }

    #[test]
    fn test_panel_cycle() {
        let mut panel = Panel::Url;
        for _ in 0..4 {
            panel = panel.next();
        }
        assert_eq!(panel, Panel::Url);
        assert_eq!(Panel::Url.prev(), Panel::Response);
    }
}
