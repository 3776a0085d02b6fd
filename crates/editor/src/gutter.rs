//! Line number gutter kept in step with the projection.

use livecode_highlight::TokenTree;

/// Number of display lines in `text`. A run of trailing line breaks counts
/// as a single break.
pub fn line_count(text: &str) -> usize {
    let trimmed = text.trim_end_matches('\n');
    let lines = trimmed.matches('\n').count() + 1;
    if trimmed.len() == text.len() {
        lines
    } else {
        lines + 1
    }
}

/// Line numbers for the gutter, refreshed after every projection rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumbers {
    count: usize,
}

impl Default for LineNumbers {
    fn default() -> Self {
        Self { count: 1 }
    }
}

impl LineNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, tree: &TokenTree) {
        self.count = line_count(&tree.text());
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Columns needed for the widest number
    pub fn width(&self) -> usize {
        self.count.to_string().len()
    }

    /// Right-aligned label for 0-based line `index`, blank past the end
    pub fn label(&self, index: usize) -> String {
        if index < self.count {
            format!("{:>width$}", index + 1, width = self.width())
        } else {
            " ".repeat(self.width())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 1);
        assert_eq!(line_count("a"), 1);
        assert_eq!(line_count("a\nb"), 2);
        assert_eq!(line_count("a\n"), 2);
        assert_eq!(line_count("a\n\n\n"), 2);
        assert_eq!(line_count("\n\n"), 2);
    }

    #[test]
    fn test_refresh_and_labels() {
        let mut numbers = LineNumbers::new();
        numbers.refresh(&TokenTree::plain(&"x\n".repeat(11), None));
        assert_eq!(numbers.count(), 12);
        assert_eq!(numbers.width(), 2);
        assert_eq!(numbers.label(0), " 1");
        assert_eq!(numbers.label(11), "12");
        assert_eq!(numbers.label(12), "  ");
    }
}
