//! Language contexts: comment delimiters and snippet tables per language,
//! with explicit parent fallback.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use livecode_config::{defaults, Config, LanguageSettings};
use livecode_highlight::canonical_language;

/// Computes an expansion for triggers missing from the static tables
pub type SnippetResolver = Rc<dyn Fn(&str) -> Option<String>>;

/// Comment delimiters of a language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentStyle {
    pub singleline: Option<String>,
    pub multiline: Option<(String, String)>,
}

impl CommentStyle {
    pub fn new(singleline: Option<&str>, multiline: Option<(&str, &str)>) -> Self {
        Self {
            singleline: singleline.map(str::to_string),
            multiline: multiline.map(|(open, close)| (open.to_string(), close.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.singleline.is_none() && self.multiline.is_none()
    }
}

/// Named configuration record. `None` fields are inherited from the parent.
/// Comment delimiters are inherited as a unit: a context that sets either
/// delimiter owns both.
#[derive(Clone, Default)]
pub struct LanguageContext {
    pub comments: Option<CommentStyle>,
    pub snippets: Option<HashMap<String, String>>,
    pub resolver: Option<SnippetResolver>,
}

impl fmt::Debug for LanguageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageContext")
            .field("comments", &self.comments)
            .field("snippets", &self.snippets)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl LanguageContext {
    pub fn with_comments(mut self, comments: CommentStyle) -> Self {
        self.comments = Some(comments);
        self
    }

    pub fn with_snippets(mut self, snippets: &[(&str, &str)]) -> Self {
        self.snippets = Some(
            snippets
                .iter()
                .map(|(trigger, body)| (trigger.to_string(), body.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_resolver(mut self, resolver: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.resolver = Some(Rc::new(resolver));
        self
    }
}

impl From<&LanguageSettings> for LanguageContext {
    fn from(settings: &LanguageSettings) -> Self {
        let comments = CommentStyle {
            singleline: settings.singleline.clone(),
            multiline: settings.multiline.clone(),
        };
        Self {
            comments: (!comments.is_empty()).then_some(comments),
            snippets: (!settings.snippets.is_empty()).then(|| {
                settings
                    .snippets
                    .iter()
                    .map(|(trigger, body)| (trigger.clone(), body.clone()))
                    .collect()
            }),
            resolver: None,
        }
    }
}

/// Fully resolved context: every field filled from the parent chain
#[derive(Clone)]
pub struct ResolvedContext {
    /// Name of the context the lookup landed on
    pub name: String,
    pub comments: CommentStyle,
    pub snippets: HashMap<String, String>,
    pub resolver: Option<SnippetResolver>,
}

impl fmt::Debug for ResolvedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedContext")
            .field("name", &self.name)
            .field("comments", &self.comments)
            .field("snippets", &self.snippets)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    context: LanguageContext,
    parent: Option<String>,
}

/// Registry of language contexts with alias resolution
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    entries: HashMap<String, Entry>,
    aliases: HashMap<String, String>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageRegistry {
    /// Registry holding only the default context (block comments, no snippets)
    pub fn new() -> Self {
        let default = LanguageContext::default()
            .with_comments(CommentStyle::new(None, Some(("/*", "*/"))))
            .with_snippets(&[]);
        let mut entries = HashMap::new();
        entries.insert(
            defaults::DEFAULT_LANGUAGE.to_string(),
            Entry {
                context: default,
                parent: None,
            },
        );
        Self {
            entries,
            aliases: HashMap::new(),
        }
    }

    /// Build from the `[languages]` section. Contexts are registered parents
    /// first; a context whose parent chain cannot be satisfied is an error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        let mut pending: Vec<(&String, &LanguageSettings)> = config.languages.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for (name, settings) in pending {
                let parent = settings.parent.as_deref();
                if parent.is_some_and(|parent| !registry.contains(parent)) {
                    deferred.push((name, settings));
                    continue;
                }
                registry.register(name, LanguageContext::from(settings), parent)?;
                for alias in &settings.aliases {
                    registry.alias(alias, name);
                }
            }
            if deferred.len() == before {
                let names: Vec<&str> = deferred.iter().map(|(name, _)| name.as_str()).collect();
                bail!("Unresolvable language parents for: {}", names.join(", "));
            }
            pending = deferred;
        }
        Ok(registry)
    }

    /// Install a named context. Without a parent it falls back to the
    /// default context. The parent must already be registered and must not
    /// lead back to `name`.
    pub fn register(
        &mut self,
        name: &str,
        context: LanguageContext,
        parent: Option<&str>,
    ) -> Result<()> {
        let name = canonical_language(name);
        let parent = match parent {
            Some(parent) => {
                let parent = self.canonical(parent);
                if !self.entries.contains_key(&parent) {
                    bail!("Language '{}' has unknown parent '{}'", name, parent);
                }
                if self.chain(&parent).iter().any(|ancestor| *ancestor == name) {
                    bail!("Language '{}' would inherit from itself via '{}'", name, parent);
                }
                Some(parent)
            }
            None if name == defaults::DEFAULT_LANGUAGE => None,
            None => Some(defaults::DEFAULT_LANGUAGE.to_string()),
        };

        log::debug!("Registered language context '{}'", name);
        self.entries.insert(name, Entry { context, parent });
        Ok(())
    }

    /// Make `alias` resolve to `name`
    pub fn alias(&mut self, alias: &str, name: &str) {
        self.aliases
            .insert(canonical_language(alias), canonical_language(name));
    }

    /// Canonical registry name for a language id
    pub fn canonical(&self, id: &str) -> String {
        let id = canonical_language(id);
        self.aliases.get(&id).cloned().unwrap_or(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(&self.canonical(id))
    }

    /// Names from `name` up to the root of its chain
    fn chain(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(name.to_string());
        while let Some(name) = current {
            if chain.contains(&name) {
                break;
            }
            current = self
                .entries
                .get(&name)
                .and_then(|entry| entry.parent.clone());
            chain.push(name);
        }
        chain
    }

    /// Resolve a language id through its parent chain. Unknown ids resolve
    /// to the default context.
    pub fn resolve(&self, id: Option<&str>) -> ResolvedContext {
        let name = id
            .map(|id| self.canonical(id))
            .filter(|name| self.entries.contains_key(name))
            .unwrap_or_else(|| defaults::DEFAULT_LANGUAGE.to_string());

        let mut comments = None;
        let mut snippets = None;
        let mut resolver = None;
        for link in self.chain(&name) {
            let Some(entry) = self.entries.get(&link) else {
                continue;
            };
            let context = &entry.context;
            comments = comments.or_else(|| context.comments.clone());
            snippets = snippets.or_else(|| context.snippets.clone());
            resolver = resolver.or_else(|| context.resolver.clone());
        }

        ResolvedContext {
            name,
            comments: comments.unwrap_or_else(|| CommentStyle::new(None, Some(("/*", "*/")))),
            snippets: snippets.unwrap_or_default(),
            resolver,
        }
    }
}
