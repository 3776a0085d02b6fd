//! Configuration management for livecode.
//!
//! This crate provides configuration loading, saving, and validation
//! with support for TOML format and XDG directory conventions.

mod settings;
mod xdg;

pub use settings::{Config, EditorSettings, LanguageSettings, LoggingSettings};
pub use xdg::{get_config_dir, get_data_dir};

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default values as constants
pub mod defaults {
    use std::collections::BTreeMap;

    use crate::LanguageSettings;

    pub const DEFAULT_INDENT: &str = "\t";
    pub const SUPER_KEY: &str = "ctrl";
    pub const TICK_RATE_MS: u64 = 50;
    pub const MIN_LOG_LEVEL: &str = "info";
    pub const LOG_MAX_ENTRIES: usize = 1000;

    /// Name of the context every other context falls back to
    pub const DEFAULT_LANGUAGE: &str = "default";

    fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    pub fn pairs() -> BTreeMap<String, String> {
        table(&[
            ("(", ")"),
            ("[", "]"),
            ("{", "}"),
            ("\"", "\""),
            ("'", "'"),
            ("`", "`"),
        ])
    }

    pub fn shortcuts() -> BTreeMap<String, String> {
        table(&[
            ("Cmd + /", "toggle-comment"),
            ("Ctrl + Shift + D", "duplicate-line"),
        ])
    }

    pub fn snippets() -> BTreeMap<String, String> {
        table(&[("test", "Snippets work!")])
    }

    pub fn languages() -> BTreeMap<String, LanguageSettings> {
        let c_family = || LanguageSettings::commented(Some("//"), Some(("/*", "*/")));
        let hash = || LanguageSettings::commented(Some("#"), None);
        let markup = || LanguageSettings::commented(None, Some(("<!--", "-->")));

        let mut languages = BTreeMap::new();
        languages.insert(
            DEFAULT_LANGUAGE.to_string(),
            LanguageSettings::commented(None, Some(("/*", "*/"))),
        );
        languages.insert(
            "rust".to_string(),
            c_family().with_snippets(&[
                ("fn", "fn $1($2) {\n\t$3\n}"),
                ("test", "#[test]\nfn $1() {\n\t$2\n}"),
            ]),
        );
        languages.insert(
            "javascript".to_string(),
            c_family()
                .with_aliases(&["js", "jsx", "mjs"])
                .with_snippets(&[
                    ("log", "console.log($1);"),
                    ("fn", "function $1($2) {\n\t$3\n}"),
                ]),
        );
        languages.insert(
            "typescript".to_string(),
            LanguageSettings {
                parent: Some("javascript".to_string()),
                ..LanguageSettings::default()
            }
            .with_aliases(&["ts", "tsx"]),
        );
        for name in ["c", "cpp", "java", "go", "php"] {
            languages.insert(name.to_string(), c_family());
        }
        languages.insert(
            "wren".to_string(),
            c_family().with_snippets(&[
                ("class", "class $1 {\n\tconstruct new($2) {\n\t\t$3\n\t}\n}"),
                ("print", "System.print($1)"),
            ]),
        );
        languages.insert(
            "python".to_string(),
            hash().with_aliases(&["py"]).with_snippets(&[(
                "def",
                "def $1($2):\n\t$3",
            )]),
        );
        for name in ["ruby", "bash", "yaml", "toml", "nix"] {
            languages.insert(name.to_string(), hash());
        }
        languages.insert("html".to_string(), markup().with_aliases(&["markup"]));
        languages.insert("markdown".to_string(), markup().with_aliases(&["md"]));
        languages.insert(
            "css".to_string(),
            LanguageSettings::commented(None, Some(("/*", "*/"))),
        );
        languages.insert(
            "haskell".to_string(),
            LanguageSettings::commented(Some("--"), Some(("{-", "-}"))),
        );
        languages.insert(
            "lua".to_string(),
            LanguageSettings::commented(Some("--"), Some(("--[[", "]]"))),
        );
        languages
    }
}

const SUPER_KEYS: &[&str] = &["ctrl", "super"];
const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "warning", "error"];

impl Config {
    /// Load configuration from the XDG config file.
    ///
    /// On first run, creates config file with default values.
    /// Auto-completes missing keys with default values.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from a specific file (same rules as [`Config::load`]).
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            // First run - create config file with default values
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let original_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config = Self::validate_content(&original_content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;

        // Serialize back to get normalized content
        let normalized_content = toml::to_string_pretty(&config)?;

        // If content changed, save the updated config
        if original_content != normalized_content {
            config.save_to(config_path)?;
        }

        Ok(config)
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Get path to config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(get_config_dir()?.join("config.toml"))
    }

    /// Get path to the default log file.
    pub fn default_log_path() -> Result<PathBuf> {
        Ok(get_data_dir()?.join("livecode.log"))
    }

    /// Parse config content, complete built-in languages and validate.
    pub fn validate_content(content: &str) -> Result<Config> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| anyhow::anyhow!("{}", e))?;
        config.complete_languages();
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        let editor = &self.editor;
        if editor.default_indent.is_empty()
            || !editor.default_indent.chars().all(|c| c == ' ' || c == '\t')
        {
            bail!("editor.default_indent must be spaces or tabs");
        }
        if !SUPER_KEYS.contains(&editor.super_key.to_lowercase().as_str()) {
            bail!(
                "editor.super_key must be one of {:?}, got '{}'",
                SUPER_KEYS,
                editor.super_key
            );
        }
        if editor.tick_rate_ms == 0 {
            bail!("editor.tick_rate_ms must be positive");
        }
        for (open, close) in &editor.pairs {
            if open.chars().count() != 1 || close.is_empty() {
                bail!("editor.pairs: '{}' = '{}' is not a single-key pair", open, close);
            }
        }
        if !LOG_LEVELS.contains(&self.logging.min_level.to_lowercase().as_str()) {
            bail!("logging.min_level: unknown level '{}'", self.logging.min_level);
        }

        for (name, language) in &self.languages {
            if language.singleline.as_deref() == Some("") {
                bail!("languages.{}.singleline must not be empty", name);
            }
            if let Some((open, close)) = &language.multiline {
                if open.is_empty() || close.is_empty() {
                    bail!("languages.{}.multiline needs two delimiters", name);
                }
            }
            self.check_parent_chain(name)?;
        }
        Ok(())
    }

    /// Parents must exist and must not loop back.
    fn check_parent_chain(&self, name: &str) -> Result<()> {
        let mut seen = vec![name];
        let mut current = name;
        while let Some(parent) = self
            .languages
            .get(current)
            .and_then(|language| language.parent.as_deref())
        {
            if !self.languages.contains_key(parent) && parent != defaults::DEFAULT_LANGUAGE {
                bail!("languages.{}: unknown parent '{}'", current, parent);
            }
            if seen.contains(&parent) {
                bail!("languages.{}: parent chain loops through '{}'", name, parent);
            }
            seen.push(parent);
            current = parent;
        }
        Ok(())
    }

    /// Add built-in language contexts the file does not mention.
    fn complete_languages(&mut self) {
        for (name, language) in defaults::languages() {
            self.languages.entry(name).or_insert(language);
        }
    }

    /// Global snippets (consulted after the language's own table)
    pub fn global_snippets(&self) -> &BTreeMap<String, String> {
        &self.editor.snippets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.editor.default_indent, "\t");
        assert_eq!(config.editor.pairs.len(), 6);
        assert_eq!(
            config.editor.shortcuts.get("Cmd + /").map(String::as_str),
            Some("toggle-comment")
        );
        assert_eq!(
            config.global_snippets().get("test").map(String::as_str),
            Some("Snippets work!")
        );
        let default = &config.languages[defaults::DEFAULT_LANGUAGE];
        assert_eq!(
            default.multiline,
            Some(("/*".to_string(), "*/".to_string()))
        );
        assert!(default.singleline.is_none());
    }

    #[test]
    fn test_first_load_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.editor.tick_rate_ms, defaults::TICK_RATE_MS);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.languages, config.languages);
    }

    #[test]
    fn test_missing_keys_are_completed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[editor]\ndefault_indent = \"  \"\n\n[languages.sql]\nsingleline = \"--\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.editor.default_indent, "  ");
        assert_eq!(config.editor.super_key, "ctrl");
        assert!(config.languages.get("sql").is_some());
        assert!(config.languages.get("rust").is_some());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[languages.rust]"));
        assert!(written.contains("super_key"));
    }

    #[test]
    fn test_multiline_round_trips_as_array() {
        let content = "[languages.lisp]\nsingleline = \";\"\nmultiline = [\"#|\", \"|#\"]\n";
        let config = Config::validate_content(content).unwrap();
        let lisp = config.languages.get("lisp").unwrap();
        assert_eq!(lisp.multiline, Some(("#|".to_string(), "|#".to_string())));

        let text = toml::to_string_pretty(&config).unwrap();
        let again = Config::validate_content(&text).unwrap();
        assert_eq!(again.languages.get("lisp"), Some(lisp));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::validate_content("[editor]\ndefault_indent = \"x\"\n").is_err());
        assert!(Config::validate_content("[editor]\nsuper_key = \"hyper\"\n").is_err());
        assert!(Config::validate_content("[logging]\nmin_level = \"loud\"\n").is_err());
        assert!(Config::validate_content("[editor.pairs]\n\"((\" = \"))\"\n").is_err());
        assert!(Config::validate_content("not toml [").is_err());
    }

    #[test]
    fn test_parent_chain_is_checked() {
        let unknown = "[languages.a]\nparent = \"nope\"\n";
        assert!(Config::validate_content(unknown).is_err());

        let cycle = "[languages.a]\nparent = \"b\"\n[languages.b]\nparent = \"a\"\n";
        assert!(Config::validate_content(cycle).is_err());

        let to_default = "[languages.a]\nparent = \"default\"\n";
        assert!(Config::validate_content(to_default).is_ok());
    }
}
