//! Editor configuration resolved from application settings.

use std::collections::{BTreeMap, HashMap};

use livecode_config::{defaults, Config};
use livecode_keyboard::{KeyChord, SuperKey};

use crate::language::LanguageRegistry;

/// Editor configuration: pairs, shortcuts, snippets and language contexts
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Indentation unit for documents without indentation of their own
    pub default_indent: String,
    /// Opening character -> closing text
    pub pairs: HashMap<char, String>,
    /// Chord -> action name, in configuration order
    pub shortcuts: Vec<(KeyChord, String)>,
    /// Snippets shared by every language
    pub snippets: BTreeMap<String, String>,
    pub registry: LanguageRegistry,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::from_settings(&Config::default())
    }
}

impl EditorConfig {
    /// Resolve from settings. Entries that cannot be used (multi-character
    /// pair keys, unparsable chords) are logged and skipped.
    pub fn from_settings(config: &Config) -> Self {
        let editor = &config.editor;
        let super_key = editor.super_key.parse::<SuperKey>().unwrap_or_else(|e| {
            log::warn!("{}; using Ctrl", e);
            SuperKey::Ctrl
        });

        let mut pairs = HashMap::new();
        for (open, close) in &editor.pairs {
            let mut chars = open.chars();
            match (chars.next(), chars.next()) {
                (Some(key), None) => {
                    pairs.insert(key, close.clone());
                }
                _ => log::warn!("Ignoring pair '{}': key must be one character", open),
            }
        }

        let shortcuts = editor
            .shortcuts
            .iter()
            .filter_map(|(descriptor, action)| match KeyChord::parse(descriptor, super_key) {
                Ok(chord) => Some((chord, action.clone())),
                Err(e) => {
                    log::warn!("Ignoring shortcut for '{}': {}", action, e);
                    None
                }
            })
            .collect();

        let registry = LanguageRegistry::from_config(config).unwrap_or_else(|e| {
            log::error!("Language contexts unavailable: {}", e);
            LanguageRegistry::new()
        });

        Self {
            default_indent: if editor.default_indent.is_empty() {
                defaults::DEFAULT_INDENT.to_string()
            } else {
                editor.default_indent.clone()
            },
            pairs,
            shortcuts,
            snippets: config.global_snippets().clone(),
            registry,
        }
    }
}
