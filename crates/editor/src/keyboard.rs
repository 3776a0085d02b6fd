//! Keyboard command handling for the editor.
//!
//! Key events are parsed into [`EditorCommand`]s first and executed
//! second. Parsing follows a fixed priority: Tab handling, then
//! auto-closing pairs, then configured shortcuts, then native editing keys.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use livecode_buffer::Motion;

use crate::config::EditorConfig;
use crate::core::LiveEditor;

/// Editor command representing a user action
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    // Navigation (abandons pending tab stops)
    Move(Motion),
    Select(Motion),
    SelectAll,

    // Text editing
    InsertChar(char),
    InsertNewline,
    Backspace,
    Delete,

    /// Tab: tab stop, indent, snippet. Shift+Tab outdents.
    Tab { outdent: bool },
    /// Auto-closing pair around the selection
    WrapPair { open: char, close: String },
    /// Named action bound to a shortcut
    Shortcut(String),

    // No operation (for unhandled keys)
    None,
}

impl EditorCommand {
    /// Parse a key event.
    ///
    /// # Arguments
    ///
    /// * `key` - The key event to parse
    /// * `config` - Pairs and shortcut bindings to consult
    pub fn from_key_event(key: KeyEvent, config: &EditorConfig) -> Self {
        if key.kind == KeyEventKind::Release {
            return Self::None;
        }

        // Tab with Alt is left to the host (focus traversal)
        match (key.code, key.modifiers) {
            (KeyCode::Tab, mods) if !mods.intersects(KeyModifiers::ALT | KeyModifiers::CONTROL) => {
                return Self::Tab {
                    outdent: mods.contains(KeyModifiers::SHIFT),
                };
            }
            (KeyCode::BackTab, mods) if !mods.contains(KeyModifiers::ALT) => {
                return Self::Tab { outdent: true };
            }
            (KeyCode::Char(ch), mods)
                if !mods.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                if let Some(close) = config.pairs.get(&ch) {
                    return Self::WrapPair {
                        open: ch,
                        close: close.clone(),
                    };
                }
            }
            _ => {}
        }

        if let Some((_, action)) = config.shortcuts.iter().find(|(chord, _)| chord.matches(&key)) {
            return Self::Shortcut(action.clone());
        }

        match (key.code, key.modifiers) {
            // Navigation
            (KeyCode::Left, KeyModifiers::NONE) => Self::Move(Motion::Left),
            (KeyCode::Right, KeyModifiers::NONE) => Self::Move(Motion::Right),
            (KeyCode::Up, KeyModifiers::NONE) => Self::Move(Motion::Up),
            (KeyCode::Down, KeyModifiers::NONE) => Self::Move(Motion::Down),
            (KeyCode::Home, KeyModifiers::NONE) => Self::Move(Motion::LineStart),
            (KeyCode::End, KeyModifiers::NONE) => Self::Move(Motion::LineEnd),
            (KeyCode::Home, KeyModifiers::CONTROL) => Self::Move(Motion::DocumentStart),
            (KeyCode::End, KeyModifiers::CONTROL) => Self::Move(Motion::DocumentEnd),

            // Navigation with selection (Shift)
            (KeyCode::Left, KeyModifiers::SHIFT) => Self::Select(Motion::Left),
            (KeyCode::Right, KeyModifiers::SHIFT) => Self::Select(Motion::Right),
            (KeyCode::Up, KeyModifiers::SHIFT) => Self::Select(Motion::Up),
            (KeyCode::Down, KeyModifiers::SHIFT) => Self::Select(Motion::Down),
            (KeyCode::Home, KeyModifiers::SHIFT) => Self::Select(Motion::LineStart),
            (KeyCode::End, KeyModifiers::SHIFT) => Self::Select(Motion::LineEnd),
            (KeyCode::Home, mods) if mods == KeyModifiers::CONTROL | KeyModifiers::SHIFT => {
                Self::Select(Motion::DocumentStart)
            }
            (KeyCode::End, mods) if mods == KeyModifiers::CONTROL | KeyModifiers::SHIFT => {
                Self::Select(Motion::DocumentEnd)
            }
            (KeyCode::Char('a'), KeyModifiers::CONTROL) => Self::SelectAll,

            // Text editing
            (KeyCode::Enter, KeyModifiers::NONE) => Self::InsertNewline,
            (KeyCode::Backspace, _) => Self::Backspace,
            (KeyCode::Delete, _) => Self::Delete,
            (KeyCode::Char(ch), mods)
                if !mods.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                Self::InsertChar(ch)
            }

            _ => Self::None,
        }
    }

    /// Execute this command on the given editor
    pub fn execute(self, editor: &mut LiveEditor) -> Result<()> {
        match self {
            Self::Move(motion) => {
                editor.navigate(motion, false);
                Ok(())
            }
            Self::Select(motion) => {
                editor.navigate(motion, true);
                Ok(())
            }
            Self::SelectAll => {
                editor.select_all();
                Ok(())
            }
            Self::InsertChar(ch) => {
                let mut buf = [0; 4];
                editor.type_text(ch.encode_utf8(&mut buf))
            }
            Self::InsertNewline => editor.insert_newline(),
            Self::Backspace => editor.backspace(),
            Self::Delete => editor.delete_forward(),
            Self::Tab { outdent } => editor.handle_tab(outdent),
            Self::WrapPair { open, close } => {
                let mut buf = [0; 4];
                editor.wrap_selection(open.encode_utf8(&mut buf), &close, true)
            }
            Self::Shortcut(action) => editor.run_action(&action).map(|_| ()),
            Self::None => Ok(()),
        }
    }
}

impl LiveEditor {
    /// Dispatch a key event. Returns whether the editor consumed it.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let command = EditorCommand::from_key_event(key, &self.config);
        if command == EditorCommand::None {
            return Ok(false);
        }
        log::debug!("Key {:?} -> {:?}", key.code, command);
        command.execute(self)?;
        Ok(true)
    }
}
