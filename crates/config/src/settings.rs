//! Configuration structures for livecode settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::defaults;

/// Application configuration with nested sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Editor settings
    #[serde(default)]
    pub editor: EditorSettings,

    /// Language contexts by name
    #[serde(default = "defaults::languages")]
    pub languages: BTreeMap<String, LanguageSettings>,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Editor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Indentation unit used when a document has no indentation of its own
    #[serde(default = "default_indent")]
    pub default_indent: String,

    /// Modifier that `Cmd` stands for in shortcut chords (ctrl or super)
    #[serde(default = "default_super_key")]
    pub super_key: String,

    /// Event poll interval; projection rebuilds run on ticks
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,

    /// Opening delimiter -> closing delimiter
    #[serde(default = "defaults::pairs")]
    pub pairs: BTreeMap<String, String>,

    /// Key chord -> action name
    #[serde(default = "defaults::shortcuts")]
    pub shortcuts: BTreeMap<String, String>,

    /// Snippets available in every language
    #[serde(default = "defaults::snippets")]
    pub snippets: BTreeMap<String, String>,
}

/// Language context settings. Unset fields are inherited from `parent`
/// (or from the built-in default context).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSettings {
    /// Context to inherit unset fields from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Other language ids resolving to this context
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Single-line comment delimiter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singleline: Option<String>,

    /// Block comment delimiters [open, close]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<(String, String)>,

    /// Trigger -> expansion
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub snippets: BTreeMap<String, String>,
}

impl LanguageSettings {
    /// Context with single-line and block comments
    pub fn commented(singleline: Option<&str>, multiline: Option<(&str, &str)>) -> Self {
        Self {
            singleline: singleline.map(str::to_string),
            multiline: multiline.map(|(open, close)| (open.to_string(), close.to_string())),
            ..Self::default()
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| alias.to_string()).collect();
        self
    }

    pub fn with_snippets(mut self, snippets: &[(&str, &str)]) -> Self {
        self.snippets = snippets
            .iter()
            .map(|(trigger, body)| (trigger.to_string(), body.to_string()))
            .collect();
        self
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log file path (optional, defaults to the data directory)
    #[serde(default)]
    pub file_path: Option<String>,

    /// Minimum log level (debug, info, warn, error)
    #[serde(default = "default_min_level")]
    pub min_level: String,

    /// Number of entries kept in memory
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

// Default value functions for serde
fn default_indent() -> String {
    defaults::DEFAULT_INDENT.to_string()
}

fn default_super_key() -> String {
    defaults::SUPER_KEY.to_string()
}

fn default_tick_rate_ms() -> u64 {
    defaults::TICK_RATE_MS
}

fn default_min_level() -> String {
    defaults::MIN_LOG_LEVEL.to_string()
}

fn default_max_entries() -> usize {
    defaults::LOG_MAX_ENTRIES
}

// Default implementations
impl Default for Config {
    fn default() -> Self {
        Self {
            editor: EditorSettings::default(),
            languages: defaults::languages(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_indent: default_indent(),
            super_key: default_super_key(),
            tick_rate_ms: default_tick_rate_ms(),
            pairs: defaults::pairs(),
            shortcuts: defaults::shortcuts(),
            snippets: defaults::snippets(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file_path: None,
            min_level: default_min_level(),
            max_entries: default_max_entries(),
        }
    }
}
