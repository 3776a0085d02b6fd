use std::collections::HashMap;

use tree_sitter_highlight::{Highlight, HighlightConfiguration, HighlightEvent};

use crate::tree::{Token, TreeBuilder};
use crate::{
    canonical_language, Highlighter, PatternHighlighter, TokenTree, HIGHLIGHT_NAMES,
    INJECTION_KIND,
};

/// Name no capture can match; pads the highlight names of later grammars
const UNMATCHED: &str = "~";

/// Recognized highlight names for the grammar in table slot `slot`.
///
/// Every grammar gets [`HIGHLIGHT_NAMES`] shifted by one block per slot, so
/// a highlight index tells both its class and the grammar (outer or
/// injected) that produced it.
fn slot_names(slot: usize) -> Vec<String> {
    let mut names = vec![UNMATCHED.to_string(); slot * HIGHLIGHT_NAMES.len()];
    names.extend(HIGHLIGHT_NAMES.iter().map(|name| name.to_string()));
    names
}

/// Source text between two highlight events, with the highlights open
/// over it (outermost first, as indices into the span list)
struct Segment<'a> {
    text: &'a str,
    open: Vec<usize>,
}

/// Grammar slot of the embedded region each segment belongs to.
///
/// A segment under an injected highlight belongs to that grammar. A run of
/// segments between two segments of the same injected grammar belongs to it
/// too, unless the run opens highlights of the outer grammar on its own
/// (text between two separate injections).
fn embedded_regions(
    segments: &[Segment],
    spans: &[(usize, &str)],
    outer: Option<usize>,
) -> Vec<Option<usize>> {
    let mut regions: Vec<Option<usize>> = segments
        .iter()
        .map(|segment| {
            segment
                .open
                .iter()
                .rev()
                .map(|&id| spans[id].0)
                .find(|&slot| Some(slot) != outer)
        })
        .collect();

    let mut last: Option<usize> = None;
    for index in 0..segments.len() {
        let Some(slot) = regions[index] else {
            continue;
        };
        if let Some(prev) = last {
            let gap = prev + 1..index;
            let enclosed = segments[gap.clone()].iter().all(|segment| {
                segment
                    .open
                    .iter()
                    .all(|id| segments[prev].open.contains(id))
            });
            if regions[prev] == Some(slot) && enclosed {
                for fill in gap {
                    regions[fill] = Some(slot);
                }
            }
        }
        last = Some(index);
    }
    regions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Span(usize),
    /// Region id and grammar slot
    Region(usize, usize),
}

/// Grammar table: name, language, highlights query, injections query
fn grammars() -> Vec<(&'static str, tree_sitter::Language, &'static str, &'static str)> {
    vec![
        // Programming languages
        (
            "rust",
            tree_sitter_rust::LANGUAGE.into(),
            tree_sitter_rust::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "python",
            tree_sitter_python::LANGUAGE.into(),
            tree_sitter_python::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "go",
            tree_sitter_go::LANGUAGE.into(),
            tree_sitter_go::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "javascript",
            tree_sitter_javascript::LANGUAGE.into(),
            tree_sitter_javascript::HIGHLIGHT_QUERY,
            tree_sitter_javascript::INJECTIONS_QUERY,
        ),
        (
            "typescript",
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tree_sitter_typescript::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "tsx",
            tree_sitter_typescript::LANGUAGE_TSX.into(),
            tree_sitter_typescript::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "c",
            tree_sitter_c::LANGUAGE.into(),
            tree_sitter_c::HIGHLIGHT_QUERY,
            "",
        ),
        (
            "cpp",
            tree_sitter_cpp::LANGUAGE.into(),
            tree_sitter_cpp::HIGHLIGHT_QUERY,
            "",
        ),
        (
            "java",
            tree_sitter_java::LANGUAGE.into(),
            tree_sitter_java::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "ruby",
            tree_sitter_ruby::LANGUAGE.into(),
            tree_sitter_ruby::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "php",
            tree_sitter_php::LANGUAGE_PHP.into(),
            tree_sitter_php::HIGHLIGHTS_QUERY,
            tree_sitter_php::INJECTIONS_QUERY,
        ),
        (
            "haskell",
            tree_sitter_haskell::LANGUAGE.into(),
            tree_sitter_haskell::HIGHLIGHTS_QUERY,
            tree_sitter_haskell::INJECTIONS_QUERY,
        ),
        (
            "nix",
            tree_sitter_nix::LANGUAGE.into(),
            tree_sitter_nix::HIGHLIGHTS_QUERY,
            tree_sitter_nix::INJECTIONS_QUERY,
        ),
        // Web technologies
        (
            "html",
            tree_sitter_html::LANGUAGE.into(),
            tree_sitter_html::HIGHLIGHTS_QUERY,
            tree_sitter_html::INJECTIONS_QUERY,
        ),
        (
            "css",
            tree_sitter_css::LANGUAGE.into(),
            tree_sitter_css::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "json",
            tree_sitter_json::LANGUAGE.into(),
            tree_sitter_json::HIGHLIGHTS_QUERY,
            "",
        ),
        // Configuration formats
        (
            "toml",
            tree_sitter_toml_ng::LANGUAGE.into(),
            tree_sitter_toml_ng::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "yaml",
            tree_sitter_yaml::LANGUAGE.into(),
            tree_sitter_yaml::HIGHLIGHTS_QUERY,
            "",
        ),
        (
            "bash",
            tree_sitter_bash::LANGUAGE.into(),
            tree_sitter_bash::HIGHLIGHT_QUERY,
            "",
        ),
        // Markdown (block grammar; code fences are injected)
        (
            "markdown",
            tree_sitter_md::LANGUAGE.into(),
            tree_sitter_md::HIGHLIGHT_QUERY_BLOCK,
            tree_sitter_md::INJECTION_QUERY_BLOCK,
        ),
    ]
}

/// Syntax highlighter based on tree-sitter, with regex fallbacks for
/// languages that have no bundled grammar
pub struct TreeSitterHighlighter {
    /// Configurations for each supported grammar
    configs: HashMap<&'static str, HighlightConfiguration>,
    /// Grammar names by table slot
    slots: Vec<&'static str>,
    /// Regex rule sets for the remaining languages
    patterns: HashMap<&'static str, PatternHighlighter>,
}

impl TreeSitterHighlighter {
    /// Create new highlighter with support for all languages
    pub fn new() -> Self {
        let grammars = grammars();
        let slots = grammars.iter().map(|(name, ..)| *name).collect();

        let mut configs = HashMap::new();
        for (slot, (name, language, highlights, injections)) in grammars.into_iter().enumerate() {
            Self::load_language_config(
                &mut configs,
                name,
                language,
                highlights,
                injections,
                &slot_names(slot),
            );
        }

        let patterns = HashMap::from([
            ("wren", PatternHighlighter::wren()),
            ("lua", PatternHighlighter::lua()),
        ]);

        Self {
            configs,
            slots,
            patterns,
        }
    }

    fn load_language_config(
        configs: &mut HashMap<&'static str, HighlightConfiguration>,
        name: &'static str,
        language: tree_sitter::Language,
        highlights_query: &str,
        injections_query: &str,
        highlight_names: &[String],
    ) {
        match HighlightConfiguration::new(language, name, highlights_query, injections_query, "")
        {
            Ok(mut config) => {
                config.configure(highlight_names);
                configs.insert(name, config);
            }
            Err(e) => log::warn!("Failed to load {} grammar: {}", name, e),
        }
    }

    /// Grammar slot and class of a highlight
    fn decode(&self, highlight: Highlight) -> (usize, &'static str) {
        let block = HIGHLIGHT_NAMES.len();
        (highlight.0 / block, HIGHLIGHT_NAMES[highlight.0 % block])
    }

    fn highlight_with_grammar(
        &self,
        config: &HighlightConfiguration,
        source: &str,
        language: &str,
    ) -> Option<TokenTree> {
        let mut highlighter = tree_sitter_highlight::Highlighter::new();
        let events = highlighter
            .highlight(config, source.as_bytes(), None, |injected| {
                self.configs.get(canonical_language(injected).as_str())
            })
            .map_err(|e| log::debug!("Highlighting {} failed: {}", language, e))
            .ok()?;

        let mut spans = Vec::new();
        let mut open = Vec::new();
        let mut segments = Vec::new();
        for event in events {
            match event {
                Ok(HighlightEvent::Source { start, end }) => segments.push(Segment {
                    text: source.get(start..end)?,
                    open: open.clone(),
                }),
                Ok(HighlightEvent::HighlightStart(highlight)) => {
                    open.push(spans.len());
                    spans.push(self.decode(highlight));
                }
                Ok(HighlightEvent::HighlightEnd) => {
                    open.pop();
                }
                Err(e) => {
                    log::debug!("Highlighting {} aborted: {}", language, e);
                    return None;
                }
            }
        }

        let outer = self.slots.iter().position(|slot| *slot == language);
        let regions = embedded_regions(&segments, &spans, outer);
        Some(self.build_tree(&segments, &spans, &regions, language))
    }

    /// Nest the segments under their highlights, wrapping embedded regions
    /// in a token that carries the injected language
    fn build_tree(
        &self,
        segments: &[Segment],
        spans: &[(usize, &'static str)],
        regions: &[Option<usize>],
        language: &str,
    ) -> TokenTree {
        let mut builder = TreeBuilder::new();
        let mut current: Vec<Frame> = Vec::new();
        let mut region_id = 0;

        for (index, segment) in segments.iter().enumerate() {
            if index > 0 && regions[index] != regions[index - 1] {
                region_id += 1;
            }
            let mut frames: Vec<Frame> = segment.open.iter().map(|&id| Frame::Span(id)).collect();
            if let Some(slot) = regions[index] {
                let at = segment
                    .open
                    .iter()
                    .position(|&id| spans[id].0 == slot)
                    .unwrap_or(frames.len());
                frames.insert(at, Frame::Region(region_id, slot));
            }

            let common = current
                .iter()
                .zip(&frames)
                .take_while(|(open, wanted)| open == wanted)
                .count();
            for _ in common..current.len() {
                builder.close();
            }
            for frame in &frames[common..] {
                builder.open(match *frame {
                    Frame::Span(id) => Token::new(spans[id].1),
                    Frame::Region(_, slot) => {
                        Token::new(INJECTION_KIND).with_language(self.slots[slot])
                    }
                });
            }
            builder.text(segment.text);
            current = frames;
        }
        builder.finish(Some(language))
    }
}

impl Highlighter for TreeSitterHighlighter {
    fn highlight(&self, source: &str, language: Option<&str>) -> TokenTree {
        let Some(language) = language.map(canonical_language) else {
            return TokenTree::plain(source, None);
        };

        if let Some(config) = self.configs.get(language.as_str()) {
            if let Some(tree) = self.highlight_with_grammar(config, source, &language) {
                return tree;
            }
        } else if let Some(patterns) = self.patterns.get(language.as_str()) {
            return patterns.highlight(source, Some(&language));
        }

        TokenTree::plain(source, Some(&language))
    }
}

impl Default for TreeSitterHighlighter {
    fn default() -> Self {
        Self::new()
    }
}
