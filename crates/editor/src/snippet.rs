//! Snippet lookup and tab stop extraction.

use regex::Regex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::OnceLock;

use crate::indent::{conform_indent, match_indentation};
use crate::language::ResolvedContext;

/// Snippet body ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Body with stop markers removed
    pub text: String,
    /// Caret movements. The first is relative to the end of the inserted
    /// text, each later one to the previous stop.
    pub stops: VecDeque<isize>,
}

static STOP_MARKER: OnceLock<Option<Regex>> = OnceLock::new();

fn stop_marker() -> Option<&'static Regex> {
    STOP_MARKER
        .get_or_init(|| Regex::new(r"\\\$(\d+)|\$(\d+)").ok())
        .as_ref()
}

/// Body for `trigger`: the context's table, then the global table, then the
/// context's resolver
pub fn lookup(
    trigger: &str,
    context: &ResolvedContext,
    globals: &BTreeMap<String, String>,
) -> Option<String> {
    if trigger.is_empty() {
        return None;
    }
    context
        .snippets
        .get(trigger)
        .or_else(|| globals.get(trigger))
        .cloned()
        .or_else(|| context.resolver.as_ref().and_then(|resolve| resolve(trigger)))
}

/// Remove `$N` markers and record the caret path through them.
///
/// Markers are visited in textual order; their numbers are not used for
/// ordering. `\$N` is an escaped marker and yields a literal `$N`.
pub fn scan_stops(body: &str) -> Expansion {
    let Some(marker) = stop_marker() else {
        return Expansion {
            text: body.to_string(),
            stops: VecDeque::new(),
        };
    };

    let mut text = String::with_capacity(body.len());
    let mut positions = Vec::new();
    let mut last = 0;
    for captures in marker.captures_iter(body) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        text.push_str(&body[last..whole.start()]);
        if let Some(escaped) = captures.get(1) {
            text.push('$');
            text.push_str(escaped.as_str());
        } else {
            positions.push(text.chars().count());
        }
        last = whole.end();
    }
    text.push_str(&body[last..]);

    let total = text.chars().count() as isize;
    let mut previous = total;
    let stops = positions
        .into_iter()
        .map(|position| {
            let position = position as isize;
            let delta = position - previous;
            previous = position;
            delta
        })
        .collect();

    Expansion { text, stops }
}

/// Expand `trigger` for insertion on a line indented with `line_indent`.
///
/// The body's tab indentation is rewritten in `unit` and continuation lines
/// are indented to match the caret line before stops are computed, so the
/// recorded movements stay exact.
pub fn expand(
    trigger: &str,
    context: &ResolvedContext,
    globals: &BTreeMap<String, String>,
    line_indent: &str,
    unit: &str,
) -> Option<Expansion> {
    let body = lookup(trigger, context, globals)?;
    let body = match_indentation(&conform_indent(&body, unit), line_indent);
    log::debug!("Expanding snippet '{}' from '{}'", trigger, context.name);
    Some(scan_stops(&body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{LanguageContext, LanguageRegistry};

    fn context() -> ResolvedContext {
        let mut registry = LanguageRegistry::new();
        registry
            .register(
                "demo",
                LanguageContext::default()
                    .with_snippets(&[("hi", "Hello $1 World$2"), ("blk", "{\n\t$1\n}")])
                    .with_resolver(|trigger| {
                        trigger
                            .strip_prefix('h')
                            .filter(|level| level.parse::<u8>().is_ok())
                            .map(|level| format!("<h{0}>$1</h{0}>", level))
                    }),
                None,
            )
            .unwrap();
        registry.resolve(Some("demo"))
    }

    fn globals() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("hi".to_string(), "shadowed".to_string()),
            ("test".to_string(), "Snippets work!".to_string()),
        ])
    }

    #[test]
    fn test_lookup_order() {
        let context = context();
        let globals = globals();
        assert_eq!(
            lookup("hi", &context, &globals).as_deref(),
            Some("Hello $1 World$2")
        );
        assert_eq!(
            lookup("test", &context, &globals).as_deref(),
            Some("Snippets work!")
        );
        assert_eq!(
            lookup("h3", &context, &globals).as_deref(),
            Some("<h3>$1</h3>")
        );
        assert_eq!(lookup("nope", &context, &globals), None);
        assert_eq!(lookup("", &context, &globals), None);
    }

    #[test]
    fn test_scan_stops() {
        let expansion = scan_stops("Hello $1 World$2");
        assert_eq!(expansion.text, "Hello  World");
        assert_eq!(expansion.stops, VecDeque::from([-6, 6]));
    }

    #[test]
    fn test_stops_follow_text_order() {
        let expansion = scan_stops("$2a$1");
        assert_eq!(expansion.text, "a");
        assert_eq!(expansion.stops, VecDeque::from([-1, 1]));
    }

    #[test]
    fn test_escaped_marker_is_literal() {
        let expansion = scan_stops(r"cost: \$1 ($1)");
        assert_eq!(expansion.text, "cost: $1 ()");
        assert_eq!(expansion.stops, VecDeque::from([-1]));
    }

    #[test]
    fn test_no_stops() {
        let expansion = scan_stops("Snippets work!");
        assert_eq!(expansion.text, "Snippets work!");
        assert!(expansion.stops.is_empty());
    }

    #[test]
    fn test_expand_reindents_before_scanning() {
        let context = context();
        let expansion = expand("blk", &context, &globals(), "  ", "  ").unwrap();
        assert_eq!(expansion.text, "{\n    \n  }");
        // End of text back to the marker, just after the inner indent
        assert_eq!(expansion.stops, VecDeque::from([-4]));
    }
}
