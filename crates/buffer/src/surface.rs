//! Native edit surface.
//!
//! Owns the buffer, the caret/selection and the focus flag, and implements
//! what a plain text area does on its own for each keystroke. Higher-level
//! editing (indentation, snippets, wrapping) is layered on top by the
//! editor crate.

use anyhow::Result;
use unicode_segmentation::UnicodeSegmentation;

use crate::{char_len, Selection, TextBuffer};

/// Caret movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    DocumentStart,
    DocumentEnd,
}

/// Buffer plus caret/selection, with native keystroke effects
#[derive(Debug, Clone, Default)]
pub struct EditSurface {
    buffer: TextBuffer,
    selection: Selection,
    focused: bool,
}

impl EditSurface {
    /// Create an empty surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface over text, caret at the start
    pub fn from_text(text: &str) -> Self {
        Self {
            buffer: TextBuffer::from_text(text),
            selection: Selection::caret(0),
            focused: false,
        }
    }

    /// Underlying buffer
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Buffer length in characters
    pub fn len(&self) -> usize {
        self.buffer.len_chars()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whole buffer content
    pub fn value(&self) -> String {
        self.buffer.text()
    }

    /// Replace the whole content; the caret moves to the end
    pub fn set_value(&mut self, text: &str) {
        self.buffer = TextBuffer::from_text(text);
        self.selection = Selection::caret(self.buffer.len_chars());
    }

    /// Current selection
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Start of the current selection
    pub fn selection_start(&self) -> usize {
        self.selection.start()
    }

    /// End of the current selection
    pub fn selection_end(&self) -> usize {
        self.selection.end()
    }

    /// Whether a non-empty range is selected
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Selected text (empty for a caret)
    pub fn selected_text(&self) -> String {
        self.buffer
            .slice(self.selection.start(), self.selection.end())
    }

    /// Select a forward range; bounds are clamped and ordered
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.len();
        let (start, end) = (start.min(len), end.min(len));
        self.selection = Selection::new(start.min(end), start.max(end));
    }

    /// Collapse the selection to a caret
    pub fn set_caret(&mut self, offset: usize) {
        self.selection = Selection::caret(offset.min(self.len()));
    }

    /// Whether the surface has input focus
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Give or take input focus
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Replace the selection with text, leaving the caret after it
    pub fn replace_selection(&mut self, text: &str) -> Result<()> {
        let start = self.selection.start();
        self.buffer.replace(start, self.selection.end(), text)?;
        self.selection = Selection::caret(start + char_len(text));
        Ok(())
    }

    /// Replace a range without moving the selection (it is only clamped)
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        let len = self.len();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        self.buffer.replace(start, end, text)?;
        self.selection = self.selection.clamped(self.len());
        Ok(())
    }

    /// Native backspace: deletes the selection or the grapheme before the caret
    pub fn backspace(&mut self) -> Result<bool> {
        if self.has_selection() {
            self.replace_selection("")?;
            return Ok(true);
        }
        let caret = self.selection.active;
        let width = self.prev_grapheme_len(caret);
        if width == 0 {
            return Ok(false);
        }
        self.buffer.remove(caret - width, caret)?;
        self.selection = Selection::caret(caret - width);
        Ok(true)
    }

    /// Native forward delete: deletes the selection or the grapheme after the caret
    pub fn delete_forward(&mut self) -> Result<bool> {
        if self.has_selection() {
            self.replace_selection("")?;
            return Ok(true);
        }
        let caret = self.selection.active;
        let width = self.next_grapheme_len(caret);
        if width == 0 {
            return Ok(false);
        }
        self.buffer.remove(caret, caret + width)?;
        Ok(true)
    }

    /// Select the whole buffer
    pub fn select_all(&mut self) {
        self.selection = Selection::new(0, self.len());
    }

    /// Native caret movement, optionally extending the selection
    pub fn move_caret(&mut self, motion: Motion, extend: bool) {
        let sel = self.selection;
        let active = sel.active;
        let target = match motion {
            Motion::Left if !extend && !sel.is_empty() => sel.start(),
            Motion::Right if !extend && !sel.is_empty() => sel.end(),
            Motion::Left => active - self.prev_grapheme_len(active),
            Motion::Right => active + self.next_grapheme_len(active),
            Motion::Up => self.line_above(active),
            Motion::Down => self.line_below(active),
            Motion::LineStart => self.buffer.line_start(active),
            Motion::LineEnd => self.buffer.line_end(active),
            Motion::DocumentStart => 0,
            Motion::DocumentEnd => self.len(),
        };

        self.selection = if extend {
            Selection::new(sel.anchor, target)
        } else {
            Selection::caret(target)
        };
    }

    /// Characters in the grapheme ending at `offset` (a line break counts as one)
    fn prev_grapheme_len(&self, offset: usize) -> usize {
        if offset == 0 {
            return 0;
        }
        let line_start = self.buffer.line_start(offset);
        if line_start == offset {
            return 1;
        }
        self.buffer
            .slice(line_start, offset)
            .graphemes(true)
            .next_back()
            .map(char_len)
            .unwrap_or(1)
    }

    /// Characters in the grapheme starting at `offset` (a line break counts as one)
    fn next_grapheme_len(&self, offset: usize) -> usize {
        if offset >= self.len() {
            return 0;
        }
        let line_end = self.buffer.line_end(offset);
        if line_end == offset {
            return 1;
        }
        self.buffer
            .slice(offset, line_end)
            .graphemes(true)
            .next()
            .map(char_len)
            .unwrap_or(1)
    }

    /// Same column on the previous line (clamped to its length)
    fn line_above(&self, offset: usize) -> usize {
        let line_start = self.buffer.line_start(offset);
        if line_start == 0 {
            return 0;
        }
        let column = offset - line_start;
        let prev_end = line_start - 1;
        let prev_start = self.buffer.line_start(prev_end);
        (prev_start + column).min(prev_end)
    }

    /// Same column on the next line (clamped to its length)
    fn line_below(&self, offset: usize) -> usize {
        let line_end = self.buffer.line_end(offset);
        if line_end >= self.len() {
            return self.len();
        }
        let column = offset - self.buffer.line_start(offset);
        let next_start = line_end + 1;
        let next_end = self.buffer.line_end(next_start);
        (next_start + column).min(next_end)
    }
}
