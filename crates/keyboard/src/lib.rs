//! Key chord descriptors.
//!
//! Shortcuts are written as human-readable chords such as `"Cmd + /"` or
//! `"Ctrl + Shift + D"`. This crate parses them into crossterm modifier/key
//! pairs and matches them against incoming [`KeyEvent`]s.

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::fmt;
use std::str::FromStr;

/// Modifiers that take part in chord matching
const CHORD_MODIFIERS: KeyModifiers = KeyModifiers::SHIFT
    .union(KeyModifiers::CONTROL)
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SUPER);

/// What `Cmd` stands for in a chord descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuperKey {
    /// Ctrl (most terminals never report the platform key)
    #[default]
    Ctrl,
    /// The Super/Command key (needs keyboard enhancement support)
    Super,
}

impl SuperKey {
    pub fn modifier(self) -> KeyModifiers {
        match self {
            SuperKey::Ctrl => KeyModifiers::CONTROL,
            SuperKey::Super => KeyModifiers::SUPER,
        }
    }
}

impl FromStr for SuperKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ctrl" | "control" => Ok(SuperKey::Ctrl),
            "super" | "cmd" | "command" | "meta" => Ok(SuperKey::Super),
            other => bail!("Unknown super key: {}", other),
        }
    }
}

/// Parsed key chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: KeyModifiers,
    pub code: KeyCode,
}

impl KeyChord {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { modifiers, code }
    }

    /// Parse a descriptor such as `"Ctrl + Shift + D"`.
    ///
    /// Parts are separated by `+` (surrounding whitespace ignored); the last
    /// part is the key, the others are modifiers. `Cmd` resolves to
    /// `super_key`.
    pub fn parse(descriptor: &str, super_key: SuperKey) -> Result<Self> {
        let mut parts: Vec<&str> = descriptor.split('+').map(str::trim).collect();
        // "Ctrl + +" splits into [.., "", ""]
        if parts.len() >= 2 && parts[parts.len() - 1].is_empty() && parts[parts.len() - 2].is_empty()
        {
            parts.truncate(parts.len() - 2);
            parts.push("+");
        }

        let Some((key, modifier_names)) = parts.split_last() else {
            bail!("Empty key chord");
        };
        if key.is_empty() {
            bail!("Key chord '{}' has no key", descriptor);
        }

        let mut modifiers = KeyModifiers::NONE;
        for name in modifier_names {
            modifiers |= match name.to_lowercase().as_str() {
                "cmd" | "command" => super_key.modifier(),
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "shift" => KeyModifiers::SHIFT,
                "alt" | "option" => KeyModifiers::ALT,
                "super" | "meta" | "win" => KeyModifiers::SUPER,
                _ => bail!("Unknown modifier '{}' in '{}'", name, descriptor),
            };
        }

        let mut code = parse_key(key)
            .ok_or_else(|| anyhow::anyhow!("Unknown key '{}' in '{}'", key, descriptor))?;
        if code == KeyCode::Tab && modifiers.contains(KeyModifiers::SHIFT) {
            code = KeyCode::BackTab;
        }

        Ok(Self { modifiers, code })
    }

    /// Whether the event is this chord. The modifier set must match exactly,
    /// except that Shift is ignored for symbol keys that do not list it
    /// (layouts need Shift to type some symbols).
    pub fn matches(&self, key: &KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }

        let mut pressed = key.modifiers & CHORD_MODIFIERS;
        match (self.code, key.code) {
            (KeyCode::Char(want), KeyCode::Char(got)) => {
                if !want.is_alphabetic() && !self.modifiers.contains(KeyModifiers::SHIFT) {
                    pressed.remove(KeyModifiers::SHIFT);
                }
                let same_key = want.to_lowercase().eq(got.to_lowercase())
                    || is_legacy_control_alias(want, got, pressed);
                same_key && pressed == self.modifiers
            }
            (want, got) => want == got && pressed == self.modifiers,
        }
    }
}

/// Legacy terminals report Ctrl+/ as Ctrl+7 (0x1F)
fn is_legacy_control_alias(want: char, got: char, pressed: KeyModifiers) -> bool {
    pressed.contains(KeyModifiers::CONTROL) && want == '/' && got == '7'
}

fn parse_key(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(ch));
    }

    let code = match name.to_lowercase().as_str() {
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        "up" | "arrowup" => KeyCode::Up,
        "down" | "arrowdown" => KeyCode::Down,
        "left" | "arrowleft" => KeyCode::Left,
        "right" | "arrowright" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "insert" => KeyCode::Insert,
        other => {
            let number = other.strip_prefix('f')?.parse::<u8>().ok()?;
            if !(1..=24).contains(&number) {
                return None;
            }
            KeyCode::F(number)
        }
    };
    Some(code)
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (KeyModifiers::CONTROL, "Ctrl"),
            (KeyModifiers::SUPER, "Super"),
            (KeyModifiers::ALT, "Alt"),
            (KeyModifiers::SHIFT, "Shift"),
        ];
        for (modifier, name) in names {
            if self.modifiers.contains(modifier) {
                write!(f, "{} + ", name)?;
            }
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(ch) => write!(f, "{}", ch.to_uppercase()),
            KeyCode::BackTab => write!(f, "Tab"),
            KeyCode::F(number) => write!(f, "F{}", number),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_parse_cmd_maps_to_super_key() {
        let chord = KeyChord::parse("Cmd + /", SuperKey::Ctrl).unwrap();
        assert_eq!(chord, KeyChord::new(KeyCode::Char('/'), KeyModifiers::CONTROL));

        let chord = KeyChord::parse("Cmd + /", SuperKey::Super).unwrap();
        assert_eq!(chord.modifiers, KeyModifiers::SUPER);
    }

    #[test]
    fn test_parse_plus_key_and_named_keys() {
        let chord = KeyChord::parse("Ctrl + +", SuperKey::Ctrl).unwrap();
        assert_eq!(chord.code, KeyCode::Char('+'));

        let chord = KeyChord::parse("alt+enter", SuperKey::Ctrl).unwrap();
        assert_eq!(chord, KeyChord::new(KeyCode::Enter, KeyModifiers::ALT));

        let chord = KeyChord::parse("Shift + Tab", SuperKey::Ctrl).unwrap();
        assert_eq!(chord.code, KeyCode::BackTab);

        assert_eq!(
            KeyChord::parse("F5", SuperKey::Ctrl).unwrap().code,
            KeyCode::F(5)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(KeyChord::parse("", SuperKey::Ctrl).is_err());
        assert!(KeyChord::parse("Ctrl +", SuperKey::Ctrl).is_err());
        assert!(KeyChord::parse("Hyper + X", SuperKey::Ctrl).is_err());
        assert!(KeyChord::parse("Ctrl + Banana", SuperKey::Ctrl).is_err());
        assert!(KeyChord::parse("F99", SuperKey::Ctrl).is_err());
    }

    #[test]
    fn test_matches_requires_exact_modifiers() {
        let chord = KeyChord::parse("Ctrl + Shift + D", SuperKey::Ctrl).unwrap();
        let both = KeyModifiers::CONTROL | KeyModifiers::SHIFT;
        assert!(chord.matches(&press(KeyCode::Char('D'), both)));
        assert!(chord.matches(&press(KeyCode::Char('d'), both)));
        assert!(!chord.matches(&press(KeyCode::Char('d'), KeyModifiers::CONTROL)));
        assert!(!chord.matches(&press(
            KeyCode::Char('d'),
            both | KeyModifiers::ALT
        )));
    }

    #[test]
    fn test_symbol_ignores_layout_shift() {
        let chord = KeyChord::parse("Ctrl + ?", SuperKey::Ctrl).unwrap();
        assert!(chord.matches(&press(
            KeyCode::Char('?'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT
        )));
    }

    #[test]
    fn test_legacy_ctrl_slash() {
        let chord = KeyChord::parse("Cmd + /", SuperKey::Ctrl).unwrap();
        assert!(chord.matches(&press(KeyCode::Char('/'), KeyModifiers::CONTROL)));
        assert!(chord.matches(&press(KeyCode::Char('7'), KeyModifiers::CONTROL)));
        assert!(!chord.matches(&press(KeyCode::Char('/'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_release_never_matches() {
        let chord = KeyChord::parse("Ctrl + A", SuperKey::Ctrl).unwrap();
        let mut event = press(KeyCode::Char('a'), KeyModifiers::CONTROL);
        event.kind = KeyEventKind::Release;
        assert!(!chord.matches(&event));
    }

    #[test]
    fn test_display() {
        let chord = KeyChord::parse("shift+ctrl+d", SuperKey::Ctrl).unwrap();
        assert_eq!(chord.to_string(), "Ctrl + Shift + D");
    }

    #[test]
    fn test_super_key_from_str() {
        assert_eq!("Super".parse::<SuperKey>().unwrap(), SuperKey::Super);
        assert_eq!("ctrl".parse::<SuperKey>().unwrap(), SuperKey::Ctrl);
        assert!("hyper".parse::<SuperKey>().is_err());
    }
}
