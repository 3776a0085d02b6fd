//! Read-only queries around the current selection.

use livecode_buffer::EditSurface;

/// View over the selection of an edit surface
#[derive(Debug, Clone, Copy)]
pub struct SelectionState<'a> {
    surface: &'a EditSurface,
}

impl<'a> SelectionState<'a> {
    pub fn new(surface: &'a EditSurface) -> Self {
        Self { surface }
    }

    pub fn start(&self) -> usize {
        self.surface.selection_start()
    }

    pub fn end(&self) -> usize {
        self.surface.selection_end()
    }

    pub fn has_selection(&self) -> bool {
        self.start() != self.end()
    }

    /// Selected text (empty for a caret)
    pub fn text(&self) -> String {
        self.surface.selected_text()
    }

    /// Text between the last `until` before the caret (exclusive) and the
    /// selection start. Without a delimiter, everything before the caret.
    pub fn before_caret(&self, until: Option<char>) -> String {
        let start = self.start();
        let from = until
            .and_then(|until| {
                self.surface
                    .buffer()
                    .last_index_of(until, start.saturating_sub(1))
                    .filter(|_| start > 0)
            })
            .map_or(0, |index| index + 1);
        self.surface.buffer().slice(from, start)
    }

    /// Offset of the first `until` at or after the selection end
    pub fn after_caret_index(&self, until: char) -> Option<usize> {
        self.surface.buffer().index_of(until, self.end())
    }

    /// Text from the selection end up to the next `until` (exclusive).
    /// Without a delimiter, everything after the caret.
    pub fn after_caret(&self, until: Option<char>) -> String {
        let buffer = self.surface.buffer();
        let to = until
            .and_then(|until| self.after_caret_index(until))
            .unwrap_or(buffer.len_chars());
        buffer.slice(self.end(), to)
    }

    /// Start of the line holding the selection start and end of the line
    /// holding the selection end
    pub fn line_bounds(&self) -> (usize, usize) {
        let buffer = self.surface.buffer();
        (buffer.line_start(self.start()), buffer.line_end(self.end()))
    }
}
