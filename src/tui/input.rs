//! Key handling for the chat TUI.
//!
//! Keys are interpreted according to the controller phase:
//! - **Chatting**: text editing, `Enter` sends, `Esc` asks to leave
//! - **ConfirmExit**: `y`/`Enter` confirms, `n`/`Esc` cancels
//!
//! `Ctrl+C` and `Ctrl+Q` quit from any phase.

// Rust guideline compliant 2026-02

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tui_input::InputRequest;

use crate::controller::{ControllerPhase, Intent};

/// What a key press should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing; the key is not bound in this phase.
    None,
    /// Forward an intent to the controller.
    Intent(Intent),
    /// Send whatever is in the input line.
    Submit,
    /// Edit the input line.
    Edit(InputRequest),
}

/// Map a key event to an action for the given phase.
pub fn map_key(key: KeyEvent, phase: ControllerPhase) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c' | 'q')) {
        return KeyAction::Intent(Intent::Quit);
    }

    match phase {
        ControllerPhase::Chatting => map_chat_key(key.code, ctrl),
        ControllerPhase::ConfirmExit => match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => KeyAction::Intent(Intent::ConfirmExit),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => KeyAction::Intent(Intent::CancelExit),
            _ => KeyAction::None,
        },
    }
}

fn map_chat_key(code: KeyCode, ctrl: bool) -> KeyAction {
    match code {
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Esc => KeyAction::Intent(Intent::RequestExit),
        KeyCode::Char('w') if ctrl => KeyAction::Edit(InputRequest::DeletePrevWord),
        KeyCode::Char('u') if ctrl => KeyAction::Edit(InputRequest::DeleteLine),
        KeyCode::Char('a') if ctrl => KeyAction::Edit(InputRequest::GoToStart),
        KeyCode::Char('e') if ctrl => KeyAction::Edit(InputRequest::GoToEnd),
        KeyCode::Char(_) if ctrl => KeyAction::None,
        KeyCode::Char(c) => KeyAction::Edit(InputRequest::InsertChar(c)),
        KeyCode::Backspace => KeyAction::Edit(InputRequest::DeletePrevChar),
        KeyCode::Delete => KeyAction::Edit(InputRequest::DeleteNextChar),
        KeyCode::Left => KeyAction::Edit(InputRequest::GoToPrevChar),
        KeyCode::Right => KeyAction::Edit(InputRequest::GoToNextChar),
        KeyCode::Home => KeyAction::Edit(InputRequest::GoToStart),
        KeyCode::End => KeyAction::Edit(InputRequest::GoToEnd),
        _ => KeyAction::None,
    }
}
