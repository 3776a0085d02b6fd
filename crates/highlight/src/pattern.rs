//! Regex-driven highlighting for languages without a bundled grammar.

use regex::Regex;

use crate::tree::{Token, TreeBuilder};
use crate::{Highlighter, TokenTree};

/// One classification rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub kind: String,
    pub pattern: String,
    /// Marks the matched span as written in another language
    pub language: Option<String>,
}

impl PatternRule {
    pub fn new(kind: &str, pattern: &str) -> Self {
        Self {
            kind: kind.to_string(),
            pattern: pattern.to_string(),
            language: None,
        }
    }

    pub fn embedded(kind: &str, pattern: &str, language: &str) -> Self {
        Self {
            language: Some(language.to_string()),
            ..Self::new(kind, pattern)
        }
    }
}

/// Flat highlighter: ordered rules combined into one alternation, so at any
/// position the earliest listed rule wins.
#[derive(Debug, Clone)]
pub struct PatternHighlighter {
    rules: Vec<PatternRule>,
    regex: Option<Regex>,
}

const LINE_COMMENT: &str = r"//[^\n]*";
const BLOCK_COMMENT: &str = r"/\*(?s:.*?)(?:\*/|\z)";
const DOUBLE_QUOTED: &str = r#""(?:\\.|[^"\\\n])*"?"#;
const SINGLE_QUOTED: &str = r"'(?:\\.|[^'\\\n])*'?";
const NUMBER: &str = r"\b(?:0x[0-9a-fA-F_]+|\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?)\b";

impl PatternHighlighter {
    /// Build from rules. Rules whose pattern does not compile are skipped.
    pub fn new(rules: Vec<PatternRule>) -> Self {
        let rules: Vec<PatternRule> = rules
            .into_iter()
            .filter(|rule| match Regex::new(&rule.pattern) {
                Ok(_) => true,
                Err(e) => {
                    log::warn!("Skipping highlight rule '{}': {}", rule.kind, e);
                    false
                }
            })
            .collect();

        let alternation = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| format!("(?P<r{}>{})", index, rule.pattern))
            .collect::<Vec<_>>()
            .join("|");

        let regex = if rules.is_empty() {
            None
        } else {
            Regex::new(&alternation)
                .map_err(|e| log::warn!("Failed to combine highlight rules: {}", e))
                .ok()
        };

        Self { rules, regex }
    }

    /// Comments, strings and numbers of the C family
    pub fn c_like() -> Self {
        Self::new(vec![
            PatternRule::new("comment", BLOCK_COMMENT),
            PatternRule::new("comment", LINE_COMMENT),
            PatternRule::new("string", DOUBLE_QUOTED),
            PatternRule::new("string", SINGLE_QUOTED),
            PatternRule::new("number", NUMBER),
        ])
    }

    /// Wren
    pub fn wren() -> Self {
        Self::new(vec![
            PatternRule::new("comment", BLOCK_COMMENT),
            PatternRule::new("comment", LINE_COMMENT),
            PatternRule::new("string", DOUBLE_QUOTED),
            PatternRule::new("number", NUMBER),
            PatternRule::new(
                "keyword",
                r"\b(?:as|break|class|construct|continue|else|for|foreign|if|import|in|is|return|static|super|var|while)\b",
            ),
            PatternRule::new("constant.builtin", r"\b(?:true|false|null)\b"),
            PatternRule::new("variable.builtin", r"\bthis\b"),
            PatternRule::new("variable", r"\b_\w+\b"),
            PatternRule::new("type", r"\b[A-Z]\w*\b"),
            PatternRule::new("operator", r"\.\.\.?|[-+*/%<>=!&|^~?]=?"),
        ])
    }

    /// Lua
    pub fn lua() -> Self {
        Self::new(vec![
            PatternRule::new("comment", r"--\[=*\[(?s:.*?)(?:\]=*\]|\z)"),
            PatternRule::new("comment", r"--[^\n]*"),
            PatternRule::new("string", r"\[\[(?s:.*?)(?:\]\]|\z)"),
            PatternRule::new("string", DOUBLE_QUOTED),
            PatternRule::new("string", SINGLE_QUOTED),
            PatternRule::new("number", NUMBER),
            PatternRule::new(
                "keyword",
                r"\b(?:and|break|do|else|elseif|end|for|function|goto|if|in|local|not|or|repeat|return|then|until|while)\b",
            ),
            PatternRule::new("constant.builtin", r"\b(?:true|false|nil)\b"),
        ])
    }

    fn tokenize(&self, source: &str, language: Option<&str>) -> TokenTree {
        let Some(regex) = &self.regex else {
            return TokenTree::plain(source, language);
        };

        let mut builder = TreeBuilder::new();
        let mut last = 0;
        for captures in regex.captures_iter(source) {
            let Some((index, matched)) = (0..self.rules.len())
                .find_map(|index| captures.name(&format!("r{}", index)).map(|m| (index, m)))
            else {
                continue;
            };
            if matched.as_str().is_empty() {
                continue;
            }

            builder.text(&source[last..matched.start()]);
            let rule = &self.rules[index];
            let mut token = Token::new(rule.kind.as_str());
            if let Some(embedded) = &rule.language {
                token = token.with_language(embedded.as_str());
            }
            builder.open(token);
            builder.text(matched.as_str());
            builder.close();
            last = matched.end();
        }
        builder.text(&source[last..]);
        builder.finish(language)
    }
}

impl Highlighter for PatternHighlighter {
    fn highlight(&self, source: &str, language: Option<&str>) -> TokenTree {
        self.tokenize(source, language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;

    fn kinds(tree: &TokenTree) -> Vec<(String, String)> {
        tree.children
            .iter()
            .filter_map(Node::as_token)
            .map(|token| (token.kind.clone(), token.text()))
            .collect()
    }

    #[test]
    fn test_c_like_classifies_comments_and_strings() {
        let source = "x = \"a // b\"; // note\n/* multi\nline */ 42";
        let tree = PatternHighlighter::c_like().highlight(source, Some("javascript"));
        assert_eq!(tree.text(), source);
        assert_eq!(
            kinds(&tree),
            vec![
                ("string".to_string(), "\"a // b\"".to_string()),
                ("comment".to_string(), "// note".to_string()),
                ("comment".to_string(), "/* multi\nline */".to_string()),
                ("number".to_string(), "42".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        let tree = PatternHighlighter::c_like().highlight("a /* open", None);
        assert_eq!(
            kinds(&tree),
            vec![("comment".to_string(), "/* open".to_string())]
        );
    }

    #[test]
    fn test_invalid_rule_is_skipped() {
        let highlighter = PatternHighlighter::new(vec![
            PatternRule::new("broken", "("),
            PatternRule::new("number", NUMBER),
        ]);
        assert_eq!(highlighter.rules.len(), 1);
        let tree = highlighter.highlight("a 1", None);
        assert_eq!(kinds(&tree), vec![("number".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_no_rules_gives_plain_tree() {
        let tree = PatternHighlighter::new(Vec::new()).highlight("abc", None);
        assert_eq!(tree, TokenTree::plain("abc", None));
    }

    #[test]
    fn test_embedded_rule_sets_language() {
        let highlighter =
            PatternHighlighter::new(vec![PatternRule::embedded("embedded", r"`[^`]*`", "sql")]);
        let tree = highlighter.highlight("q = `select 1`", None);
        let token = tree.children.iter().find_map(Node::as_token).unwrap();
        assert_eq!(token.language.as_deref(), Some("sql"));
    }

    #[test]
    fn test_wren_keywords() {
        let tree = PatternHighlighter::wren().highlight("class Foo { construct new() {} }", Some("wren"));
        let found = kinds(&tree);
        assert!(found.contains(&("keyword".to_string(), "class".to_string())));
        assert!(found.contains(&("type".to_string(), "Foo".to_string())));
        assert!(found.contains(&("keyword".to_string(), "construct".to_string())));
    }

    #[test]
    fn test_lua_long_comment() {
        let tree = PatternHighlighter::lua().highlight("--[[ a\nb ]] x -- c", Some("lua"));
        assert_eq!(
            kinds(&tree),
            vec![
                ("comment".to_string(), "--[[ a\nb ]]".to_string()),
                ("comment".to_string(), "-- c".to_string()),
            ]
        );
    }
}
