use std::cmp::{max, min};

/// Caret or selected range, in character offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Start point of selection (anchor) - doesn't move
    pub anchor: usize,
    /// Active point (moves with caret)
    pub active: usize,
}

impl Selection {
    /// Create a new selection
    pub fn new(anchor: usize, active: usize) -> Self {
        Self { anchor, active }
    }

    /// Collapsed selection (a caret)
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Start of selection (minimum position)
    pub fn start(&self) -> usize {
        min(self.anchor, self.active)
    }

    /// End of selection (maximum position)
    pub fn end(&self) -> usize {
        max(self.anchor, self.active)
    }

    /// Selection is empty (start == end)
    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    /// Number of selected characters
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Same selection with both ends clamped to `len`
    pub fn clamped(self, len: usize) -> Self {
        Self::new(self.anchor.min(len), self.active.min(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_range() {
        let sel = Selection::new(7, 3);
        assert_eq!(sel.start(), 3);
        assert_eq!(sel.end(), 7);
        assert_eq!(sel.len(), 4);
        assert!(!sel.is_empty());
    }

    #[test]
    fn test_caret_is_empty() {
        let sel = Selection::caret(5);
        assert!(sel.is_empty());
        assert_eq!(sel.start(), sel.end());
    }

    #[test]
    fn test_clamped() {
        let sel = Selection::new(2, 10).clamped(4);
        assert_eq!((sel.start(), sel.end()), (2, 4));
    }
}
