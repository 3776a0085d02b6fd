//! Syntax highlighting for livecode.
//!
//! Turns source text into a [`TokenTree`] projection. Grammars are
//! tree-sitter based; languages without a bundled grammar fall back to
//! regex rule sets, and anything else gets a plain single-leaf tree.

mod pattern;
mod syntax;
mod tree;

pub use pattern::{PatternHighlighter, PatternRule};
pub use syntax::TreeSitterHighlighter;
pub use tree::{Leaf, Node, NodePath, Token, TokenTree};

use ratatui::style::{Color, Modifier, Style};
use std::path::Path;
use std::sync::OnceLock;

/// Text in, classified tree out. Must be pure: the same input always
/// yields the same tree, and the concatenated leaves equal the input.
pub trait Highlighter {
    fn highlight(&self, source: &str, language: Option<&str>) -> TokenTree;
}

impl<H: Highlighter + ?Sized> Highlighter for &H {
    fn highlight(&self, source: &str, language: Option<&str>) -> TokenTree {
        (**self).highlight(source, language)
    }
}

/// Global static highlighter (lazily initialized)
static GLOBAL_HIGHLIGHTER: OnceLock<TreeSitterHighlighter> = OnceLock::new();

/// Get global highlighter
pub fn global_highlighter() -> &'static TreeSitterHighlighter {
    GLOBAL_HIGHLIGHTER.get_or_init(TreeSitterHighlighter::new)
}

/// Standard highlight categories used by tree-sitter.
pub const HIGHLIGHT_NAMES: &[&str] = &[
    "attribute",
    "comment",
    "constant",
    "constant.builtin",
    "constructor",
    "function",
    "function.builtin",
    "function.method",
    "keyword",
    "label",
    "number",
    "operator",
    "property",
    "punctuation",
    "punctuation.bracket",
    "punctuation.delimiter",
    "punctuation.special",
    "string",
    "string.special",
    "tag",
    "type",
    "type.builtin",
    "variable",
    "variable.builtin",
    "variable.parameter",
    "escape",
    "embedded",
];

/// Kind of the token wrapping a region written in an injected language
/// (a `<script>` body, a fenced code block). Its `language` names the
/// injected language.
pub const INJECTION_KIND: &str = "injection";

/// Style for a token kind (One Dark inspired).
/// Unknown refinements use the style of their base class.
pub fn style_for_kind(kind: &str) -> Style {
    if kind == INJECTION_KIND {
        return Style::default();
    }
    let base = kind.split('.').next().unwrap_or(kind);
    let (fg, modifier) = match (kind, base) {
        (_, "comment") => (Color::Rgb(105, 112, 125), Some(Modifier::ITALIC)),
        (_, "keyword") => (Color::Rgb(199, 146, 234), Some(Modifier::BOLD)),
        (_, "function") => (Color::Rgb(130, 170, 255), None),
        (_, "string") | ("property", _) => (Color::Rgb(152, 195, 121), None),
        ("number", _) | ("attribute", _) => (Color::Rgb(209, 154, 102), None),
        (_, "constant") | ("label", _) => (Color::Rgb(229, 192, 123), None),
        ("constructor", _) => (Color::Rgb(229, 192, 123), Some(Modifier::BOLD)),
        (_, "type") | ("escape", _) => (Color::Rgb(86, 182, 194), None),
        ("variable.builtin", _) => (Color::Rgb(224, 108, 117), Some(Modifier::ITALIC)),
        (_, "variable") | ("tag", _) => (Color::Rgb(224, 108, 117), None),
        ("operator", _) | ("punctuation.special", _) | ("embedded", _) => {
            (Color::Rgb(198, 120, 221), None)
        }
        _ => (Color::Rgb(171, 178, 191), None),
    };

    let style = Style::default().fg(fg);
    match modifier {
        Some(modifier) => style.add_modifier(modifier),
        None => style,
    }
}

/// Detect language from file extension.
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;

    match ext.to_lowercase().as_str() {
        "rs" => Some("rust"),
        "py" | "pyw" => Some("python"),
        "go" => Some("go"),
        "js" | "mjs" | "cjs" | "jsx" => Some("javascript"),
        "ts" | "mts" | "cts" => Some("typescript"),
        "tsx" => Some("tsx"),
        "c" | "h" => Some("c"),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => Some("cpp"),
        "java" => Some("java"),
        "rb" => Some("ruby"),
        "php" => Some("php"),
        "hs" => Some("haskell"),
        "nix" => Some("nix"),
        "html" | "htm" => Some("html"),
        "css" => Some("css"),
        "json" => Some("json"),
        "toml" => Some("toml"),
        "yaml" | "yml" => Some("yaml"),
        "sh" | "bash" | "zsh" => Some("bash"),
        "md" | "markdown" => Some("markdown"),
        "wren" => Some("wren"),
        "lua" => Some("lua"),
        _ => None,
    }
}

/// Resolve a language id or alias (`js`, `py`, `markup`, ...) to its
/// canonical name. Unknown ids are returned lowercased.
pub fn canonical_language(id: &str) -> String {
    let id = id.trim().to_lowercase();
    let canonical = match id.as_str() {
        "js" | "jsx" | "mjs" | "node" => "javascript",
        "ts" => "typescript",
        "py" | "python3" => "python",
        "rs" => "rust",
        "sh" | "shell" | "zsh" => "bash",
        "yml" => "yaml",
        "md" => "markdown",
        "htm" | "markup" | "xhtml" => "html",
        "c++" | "cc" | "cxx" => "cpp",
        "hs" => "haskell",
        "rb" => "ruby",
        "golang" => "go",
        _ => return id,
    };
    canonical.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_language() {
        assert_eq!(canonical_language("JS"), "javascript");
        assert_eq!(canonical_language("markup"), "html");
        assert_eq!(canonical_language("rust"), "rust");
        assert_eq!(canonical_language("Wren"), "wren");
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("main.rs")), Some("rust"));
        assert_eq!(detect_language(Path::new("game.wren")), Some("wren"));
        assert_eq!(detect_language(Path::new("README")), None);
    }

    #[test]
    fn test_style_for_refinement_uses_base_class() {
        assert_eq!(style_for_kind("string.special"), style_for_kind("string"));
        assert_eq!(style_for_kind(INJECTION_KIND), Style::default());
        assert_eq!(
            style_for_kind("comment").add_modifier,
            Modifier::ITALIC
        );
    }

    #[test]
    fn test_reference_is_highlighter() {
        fn takes(highlighter: impl Highlighter) -> TokenTree {
            highlighter.highlight("1", None)
        }
        let rules = PatternHighlighter::c_like();
        assert_eq!(takes(&rules).text(), "1");
    }
}
