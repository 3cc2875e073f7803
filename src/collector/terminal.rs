//! Terminal key source built on crossterm.
//!
//! Key presses are translated into [`RawKeyEvent`]s using browser-style
//! names ("Enter", "ArrowLeft") for the logical key and positional codes
//! ("KeyA", "Digit7", "Slash") for the physical key. Terminals do not report
//! physical positions, so the code is derived from the US layout.
//!
//! A handful of Ctrl shortcuts are reserved for capture control and are
//! reported as [`ControlCommand`]s instead of keys.

use crate::collector::types::RawKeyEvent;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};
use std::time::Duration;

/// Capture control actions bound to Ctrl shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Ctrl+P
    TogglePause,
    /// Ctrl+R
    Reset,
    /// Ctrl+E
    Export,
    /// Ctrl+A
    Analyze,
    /// Ctrl+C or Ctrl+Q
    Quit,
}

/// Input read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalInput {
    Key(RawKeyEvent),
    Command(ControlCommand),
}

/// Translate a crossterm key event. Releases and repeats are ignored.
pub fn translate(key: &KeyEvent) -> Option<TerminalInput> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(c) = key.code {
            let command = match c.to_ascii_lowercase() {
                'p' => Some(ControlCommand::TogglePause),
                'r' => Some(ControlCommand::Reset),
                'e' => Some(ControlCommand::Export),
                'a' => Some(ControlCommand::Analyze),
                'c' | 'q' => Some(ControlCommand::Quit),
                _ => None,
            };
            if let Some(command) = command {
                return Some(TerminalInput::Command(command));
            }
        }
    }

    let (key_name, code) = key_names(key.code)?;
    Some(TerminalInput::Key(RawKeyEvent::new(key_name, code)))
}

/// Logical key and physical code for a crossterm key code.
fn key_names(code: KeyCode) -> Option<(String, String)> {
    let named = |name: &str| Some((name.to_string(), name.to_string()));
    match code {
        KeyCode::Char(c) => Some((c.to_string(), char_code(c).to_string())),
        KeyCode::Enter => named("Enter"),
        KeyCode::Tab | KeyCode::BackTab => named("Tab"),
        KeyCode::Backspace => named("Backspace"),
        KeyCode::Esc => named("Escape"),
        KeyCode::Left => named("ArrowLeft"),
        KeyCode::Right => named("ArrowRight"),
        KeyCode::Up => named("ArrowUp"),
        KeyCode::Down => named("ArrowDown"),
        KeyCode::Home => named("Home"),
        KeyCode::End => named("End"),
        KeyCode::PageUp => named("PageUp"),
        KeyCode::PageDown => named("PageDown"),
        KeyCode::Delete => named("Delete"),
        KeyCode::Insert => named("Insert"),
        KeyCode::CapsLock => named("CapsLock"),
        KeyCode::F(n) => named(&format!("F{n}")),
        KeyCode::Modifier(m) => Some(modifier_names(m)),
        _ => None,
    }
}

fn modifier_names(m: ModifierKeyCode) -> (String, String) {
    let (key, code) = match m {
        ModifierKeyCode::LeftShift => ("Shift", "ShiftLeft"),
        ModifierKeyCode::RightShift => ("Shift", "ShiftRight"),
        ModifierKeyCode::LeftControl => ("Control", "ControlLeft"),
        ModifierKeyCode::RightControl => ("Control", "ControlRight"),
        ModifierKeyCode::LeftAlt => ("Alt", "AltLeft"),
        ModifierKeyCode::RightAlt => ("Alt", "AltRight"),
        ModifierKeyCode::LeftSuper | ModifierKeyCode::LeftMeta => ("Meta", "MetaLeft"),
        ModifierKeyCode::RightSuper | ModifierKeyCode::RightMeta => ("Meta", "MetaRight"),
        _ => ("Unidentified", "Unidentified"),
    };
    (key.to_string(), code.to_string())
}

/// US-layout physical code for a printable character.
fn char_code(c: char) -> String {
    if c.is_ascii_alphabetic() {
        return format!("Key{}", c.to_ascii_uppercase());
    }
    if c.is_ascii_digit() {
        return format!("Digit{c}");
    }
    let code = match c {
        ' ' => "Space",
        '!' => "Digit1",
        '@' => "Digit2",
        '#' => "Digit3",
        '$' => "Digit4",
        '%' => "Digit5",
        '^' => "Digit6",
        '&' => "Digit7",
        '*' => "Digit8",
        '(' => "Digit9",
        ')' => "Digit0",
        '-' | '_' => "Minus",
        '=' | '+' => "Equal",
        '[' | '{' => "BracketLeft",
        ']' | '}' => "BracketRight",
        '\\' | '|' => "Backslash",
        ';' | ':' => "Semicolon",
        '\'' | '"' => "Quote",
        ',' | '<' => "Comma",
        '.' | '>' => "Period",
        '/' | '?' => "Slash",
        '`' | '~' => "Backquote",
        _ => "Unidentified",
    };
    code.to_string()
}

/// Reads terminal key presses on a background thread.
///
/// The caller is responsible for putting the terminal in raw mode.
pub struct TerminalKeySource {
    rx: Receiver<TerminalInput>,
}

impl TerminalKeySource {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(input) = translate(&key) {
                        if tx.send(input).is_err() {
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("terminal read failed: {e}");
                    break;
                }
            }
        });

        Self { rx }
    }

    /// Wait up to `timeout` for the next input.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<TerminalInput, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

impl Default for TerminalKeySource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn key_of(input: Option<TerminalInput>) -> RawKeyEvent {
        match input {
            Some(TerminalInput::Key(raw)) => raw,
            other => panic!("expected key, got {other:?}"),
        }
    }

    #[test]
    fn test_letter_and_digit_codes() {
        let raw = key_of(translate(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert_eq!(raw.key, "q");
        assert_eq!(raw.code, "KeyQ");

        let raw = key_of(translate(&press(KeyCode::Char('7'), KeyModifiers::NONE)));
        assert_eq!(raw.code, "Digit7");

        let raw = key_of(translate(&press(KeyCode::Char('$'), KeyModifiers::SHIFT)));
        assert_eq!(raw.key, "$");
        assert_eq!(raw.code, "Digit4");
    }

    #[test]
    fn test_named_keys() {
        let raw = key_of(translate(&press(KeyCode::Enter, KeyModifiers::NONE)));
        assert_eq!(raw.key, "Enter");

        let raw = key_of(translate(&press(KeyCode::Left, KeyModifiers::NONE)));
        assert_eq!(raw.key, "ArrowLeft");

        let raw = key_of(translate(&press(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert_eq!(raw.key, " ");
        assert_eq!(raw.code, "Space");
    }

    #[test]
    fn test_control_shortcuts() {
        assert_eq!(
            translate(&press(KeyCode::Char('p'), KeyModifiers::CONTROL)),
            Some(TerminalInput::Command(ControlCommand::TogglePause))
        );
        assert_eq!(
            translate(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(TerminalInput::Command(ControlCommand::Quit))
        );
    }

    #[test]
    fn test_release_is_ignored() {
        let mut key = press(KeyCode::Char('a'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(translate(&key).is_none());
    }
}
