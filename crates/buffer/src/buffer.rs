use anyhow::{bail, Result};
use ropey::Rope;

/// Text buffer based on Rope, addressed by character offsets
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    /// Rope structure for storing text
    rope: Rope,
}

impl TextBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create buffer from text
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total length in characters
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Whole buffer content
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Character at offset
    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.len_chars()).then(|| self.rope.char(offset))
    }

    /// Text between two offsets (clamped to the buffer, order-insensitive)
    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.len_chars();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        self.rope.slice(start..end).to_string()
    }

    /// Insert text at offset
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        if offset > self.len_chars() {
            bail!(
                "Insert offset {} out of range (length {})",
                offset,
                self.len_chars()
            );
        }
        self.rope.insert(offset, text);
        Ok(())
    }

    /// Remove the text between two offsets
    pub fn remove(&mut self, start: usize, end: usize) -> Result<()> {
        if start > end || end > self.len_chars() {
            bail!(
                "Invalid range {}..{} (length {})",
                start,
                end,
                self.len_chars()
            );
        }
        self.rope.remove(start..end);
        Ok(())
    }

    /// Replace the text between two offsets
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        self.remove(start, end)?;
        self.insert(start, text)
    }

    /// Offset of the first character of the line containing `offset`
    pub fn line_start(&self, offset: usize) -> usize {
        let mut pos = offset.min(self.len_chars());
        let mut chars = self.rope.chars_at(pos);
        while let Some(ch) = chars.prev() {
            if ch == '\n' {
                break;
            }
            pos -= 1;
        }
        pos
    }

    /// Offset of the line break ending the line containing `offset`
    /// (or the buffer length on the last line)
    pub fn line_end(&self, offset: usize) -> usize {
        let mut pos = offset.min(self.len_chars());
        for ch in self.rope.chars_at(pos) {
            if ch == '\n' {
                break;
            }
            pos += 1;
        }
        pos
    }

    /// Last occurrence of `needle` starting at or before `from`
    pub fn last_index_of(&self, needle: char, from: usize) -> Option<usize> {
        let len = self.len_chars();
        if len == 0 {
            return None;
        }
        let mut pos = from.min(len - 1) + 1;
        let mut chars = self.rope.chars_at(pos);
        while let Some(ch) = chars.prev() {
            pos -= 1;
            if ch == needle {
                return Some(pos);
            }
        }
        None
    }

    /// First occurrence of `needle` starting at or after `from`
    pub fn index_of(&self, needle: char, from: usize) -> Option<usize> {
        let from = from.min(self.len_chars());
        self.rope
            .chars_at(from)
            .position(|ch| ch == needle)
            .map(|idx| from + idx)
    }

    /// Number of lines (a trailing line break opens an empty last line)
    pub fn line_count(&self) -> usize {
        self.rope.chars().filter(|&ch| ch == '\n').count() + 1
    }
}
