//! Indentation detection and block indent/outdent.

use regex::Regex;
use std::sync::OnceLock;

static INDENTED_LINE: OnceLock<Option<Regex>> = OnceLock::new();

fn indented_line() -> Option<&'static Regex> {
    INDENTED_LINE
        .get_or_init(|| Regex::new(r"(?m)^[\t ]+").ok())
        .as_ref()
}

/// Indentation unit of a document: the leading whitespace of its first
/// indented line, or `default` when no line is indented
pub fn indent_of(text: &str, default: &str) -> String {
    indented_line()
        .and_then(|regex| regex.find(text))
        .map_or_else(|| default.to_string(), |found| found.as_str().to_string())
}

/// Leading run of tabs and spaces
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|ch: char| ch != ' ' && ch != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Indentation to carry onto a fresh line.
///
/// `caret` sits just after a line break; the result is the leading
/// whitespace of the line that break ended.
pub fn current_indent(text: &str, caret: usize) -> String {
    if caret == 0 {
        return String::new();
    }
    let before: String = text.chars().take(caret - 1).collect();
    let last_line = before.rsplit('\n').next().unwrap_or("");
    leading_whitespace(last_line).to_string()
}

/// Which way [`adjust`] shifts lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Indent,
    Outdent,
}

#[derive(Debug, Clone, Copy)]
pub struct AdjustOptions<'a> {
    /// Keep existing indentation and shift it. When false, the indentation
    /// shared by all non-blank lines is removed first.
    pub relative: bool,
    pub direction: Direction,
    pub unit: &'a str,
}

/// Indent or outdent every line of `text` by one unit
pub fn adjust(text: &str, options: AdjustOptions<'_>) -> String {
    let normalized;
    let text = if options.relative {
        text
    } else {
        normalized = strip_common_indent(text);
        normalized.as_str()
    };

    text.split('\n')
        .map(|line| match options.direction {
            Direction::Indent => format!("{}{}", options.unit, line),
            Direction::Outdent => line
                .strip_prefix(options.unit)
                .filter(|_| !options.unit.is_empty())
                .unwrap_or(line)
                .to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_common_indent(text: &str) -> String {
    let common = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(leading_whitespace)
        .reduce(|common, indent| {
            let shared = common
                .char_indices()
                .zip(indent.chars())
                .take_while(|((_, a), b)| a == b)
                .last()
                .map_or(0, |((index, ch), _)| index + ch.len_utf8());
            &common[..shared]
        })
        .unwrap_or("");

    text.split('\n')
        .map(|line| match line.strip_prefix(common) {
            Some(rest) => rest,
            None => line.trim_start_matches([' ', '\t']),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Continue every line after the first at `indent`
pub fn match_indentation(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    text.replace('\n', &format!("\n{}", indent))
}

/// Rewrite leading tabs of every line as `unit`
pub fn conform_indent(text: &str, unit: &str) -> String {
    if unit == "\t" {
        return text.to_string();
    }
    text.split('\n')
        .map(|line| {
            let rest = line.trim_start_matches('\t');
            let depth = line.len() - rest.len();
            format!("{}{}", unit.repeat(depth), rest)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
