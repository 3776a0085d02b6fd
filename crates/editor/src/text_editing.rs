//! Editing commands built on the editor primitives: comment toggling, line
//! duplication, Tab handling, snippet expansion and auto-indenting newlines.

use anyhow::Result;

use livecode_buffer::char_len;

use crate::core::LiveEditor;
use crate::indent::{self, AdjustOptions, Direction};
use crate::language::CommentStyle;
use crate::locator;
use crate::snippet;

impl LiveEditor {
    /// Comment or uncomment at the caret.
    ///
    /// Inside a comment token the comment delimiters are removed. Otherwise
    /// a selection is wrapped in block delimiters (or each selected line gets
    /// the line delimiter when the language has no block comments) and a
    /// caret comments out its line. Returns false when the language has no
    /// usable delimiters.
    pub fn toggle_comment(&mut self) -> Result<bool> {
        let comments = self.context().comments;
        let caret = self.surface.selection_start();

        if self.surface.has_selection() {
            if let Some(line) = &comments.singleline {
                if self.uncomment_lines(line)? {
                    return Ok(true);
                }
            }
        }

        let found = locator::enclosing_token(self.projection(), caret, "comment")
            .map(|(path, token)| (locator::offset_of_node(self.projection(), &path), token.text()))
            .filter(|(start, text)| {
                // A stale projection may not describe the buffer any more
                self.surface.buffer().slice(*start, start + char_len(text)) == *text
            });
        if let Some((start, text)) = found {
            return self.uncomment(&comments, start, &text);
        }

        if self.surface.has_selection() {
            if let Some((open, close)) = &comments.multiline {
                self.wrap_selection(open, close, false)?;
                return Ok(true);
            }
            if let Some(line) = &comments.singleline {
                self.comment_lines(line)?;
                return Ok(true);
            }
            return Ok(false);
        }

        let (start, end) = self.selection_state().line_bounds();
        match (&comments.singleline, &comments.multiline) {
            (Some(line), _) => self.wrap(line, "", Some((start, end)))?,
            (None, Some((open, close))) => self.wrap(open, close, Some((start, end)))?,
            (None, None) => return Ok(false),
        }
        Ok(true)
    }

    fn uncomment(&mut self, comments: &CommentStyle, start: usize, text: &str) -> Result<bool> {
        let end = start + char_len(text);
        let caret = self.surface.selection_end();

        if let Some(line) = comments
            .singleline
            .as_deref()
            .filter(|line| text.starts_with(line))
        {
            let width = char_len(line);
            let inner = self.surface.buffer().slice(start + width, end);
            self.set_range(&inner, start, end)?;
            self.set_caret(caret.saturating_sub(width).max(start));
            return Ok(true);
        }

        if let Some((open, close)) = comments.multiline.as_ref().filter(|(open, close)| {
            text.starts_with(open.as_str())
                && text.ends_with(close.as_str())
                && char_len(text) >= char_len(open) + char_len(close)
        }) {
            let (open_width, close_width) = (char_len(open), char_len(close));
            let inner = self
                .surface
                .buffer()
                .slice(start + open_width, end - close_width);
            self.set_range(&inner, start, end)?;
            let inner_end = start + char_len(&inner);
            self.set_caret(caret.saturating_sub(open_width).clamp(start, inner_end));
            return Ok(true);
        }

        log::debug!("Comment at {} does not use this language's delimiters", start);
        Ok(false)
    }

    /// Prefix every line touched by the selection with `delimiter`
    fn comment_lines(&mut self, delimiter: &str) -> Result<()> {
        let (start, end) = self.selection_state().line_bounds();
        let block = self.surface.buffer().slice(start, end);
        let commented = block
            .split('\n')
            .map(|line| format!("{}{}", delimiter, line))
            .collect::<Vec<_>>()
            .join("\n");
        self.set_range(&commented, start, end)?;
        self.set_selection(start, start + char_len(&commented));
        Ok(())
    }

    /// Strip `delimiter` from each line touched by the selection when every
    /// one of them starts with it after its indentation
    fn uncomment_lines(&mut self, delimiter: &str) -> Result<bool> {
        let (start, end) = self.selection_state().line_bounds();
        let block = self.surface.buffer().slice(start, end);
        let mut lines = Vec::new();
        for line in block.split('\n') {
            let indentation = indent::leading_whitespace(line);
            match line[indentation.len()..].strip_prefix(delimiter) {
                Some(rest) => lines.push(format!("{}{}", indentation, rest)),
                None => return Ok(false),
            }
        }
        let uncommented = lines.join("\n");
        self.set_range(&uncommented, start, end)?;
        self.set_selection(start, start + char_len(&uncommented));
        Ok(true)
    }

    /// Copy the lines touched by the selection above themselves. The
    /// selection stays on the same text, which is now the lower copy.
    pub fn duplicate_line(&mut self) -> Result<()> {
        let (start, end) = self.selection_state().line_bounds();
        let block = self.surface.buffer().slice(start, end);
        self.insert(&format!("{}\n", block), Some(start))
    }

    /// Tab key.
    ///
    /// Jumps to the next pending tab stop if there is one. Otherwise indents
    /// (or outdents) the selected lines, expands the snippet whose trigger
    /// ends at the caret, or inserts one indentation unit.
    ///
    /// Shift+Tab on a bare caret leaves that order: it outdents the caret
    /// line instead of expanding a snippet or inserting an indent.
    pub fn handle_tab(&mut self, outdent: bool) -> Result<()> {
        if let Some(delta) = self.tabstops.pop_front() {
            self.move_caret(delta);
            return Ok(());
        }
        if self.surface.has_selection() || outdent {
            return self.indent_selection(outdent);
        }

        let line = self.selection_state().before_caret(Some('\n'));
        let trigger = line.rsplit(char::is_whitespace).next().unwrap_or("");
        if !trigger.is_empty() && self.expand_snippet(trigger)? {
            return Ok(());
        }

        let unit = self.indent();
        self.insert(&unit, None)
    }

    /// Indent or outdent every line touched by the selection by one unit,
    /// keeping the selection on the same text
    pub fn indent_selection(&mut self, outdent: bool) -> Result<()> {
        let (sel_start, sel_end) = (self.surface.selection_start(), self.surface.selection_end());
        let buffer = self.surface.buffer();
        let start = buffer.line_start(sel_start);
        // A selection ending at the start of a line does not touch that line
        let end = if sel_end > sel_start && sel_end > start && buffer.char_at(sel_end - 1) == Some('\n') {
            sel_end - 1
        } else {
            buffer.line_end(sel_end)
        };

        let region = buffer.slice(start, end);
        let unit = self.indent();
        let adjusted = indent::adjust(
            &region,
            AdjustOptions {
                relative: true,
                direction: if outdent {
                    Direction::Outdent
                } else {
                    Direction::Indent
                },
                unit: &unit,
            },
        );
        if adjusted == region {
            return Ok(());
        }

        let old_lines: Vec<&str> = region.split('\n').collect();
        let new_lines: Vec<&str> = adjusted.split('\n').collect();
        let remap = |bound: usize| remap_bound(bound, start, &old_lines, &new_lines);
        let (new_start, new_end) = (remap(sel_start), remap(sel_end));

        self.set_range(&adjusted, start, end)?;
        self.set_selection(new_start, new_end);
        Ok(())
    }

    /// Expand `trigger`, which must be the text right before the caret.
    ///
    /// The trigger is replaced by the snippet body and the caret moves to
    /// the first tab stop; the remaining stops wait for Tab. Returns false
    /// when no snippet matches.
    pub fn expand_snippet(&mut self, trigger: &str) -> Result<bool> {
        let context = self.context();
        let line = self.selection_state().before_caret(Some('\n'));
        let line_indent = indent::leading_whitespace(&line).to_string();
        let unit = self.indent();

        let Some(expansion) = snippet::expand(
            trigger,
            &context,
            &self.config.snippets,
            &line_indent,
            &unit,
        ) else {
            return Ok(false);
        };

        self.delete(char_len(trigger), false)?;
        self.insert(&expansion.text, None)?;
        self.tabstops = expansion.stops;
        if let Some(first) = self.tabstops.pop_front() {
            self.move_caret(first);
        }
        Ok(true)
    }

    /// Enter: line break carrying over the indentation of the line it ends
    pub fn insert_newline(&mut self) -> Result<()> {
        self.type_text("\n")?;
        let indent = self.current_indent();
        self.insert(&indent, None)
    }
}

/// Where a selection bound lands after its lines were re-indented
fn remap_bound(bound: usize, region_start: usize, old_lines: &[&str], new_lines: &[&str]) -> usize {
    let (mut old_pos, mut new_pos) = (region_start, region_start);
    for (old, new) in old_lines.iter().zip(new_lines) {
        let (old_len, new_len) = (char_len(old), char_len(new));
        if bound <= old_pos + old_len {
            let column = bound - old_pos;
            let column = if column == 0 {
                0
            } else {
                (column as isize + new_len as isize - old_len as isize).clamp(0, new_len as isize)
                    as usize
            };
            return new_pos + column;
        }
        old_pos += old_len + 1;
        new_pos += new_len + 1;
    }
    bound + new_pos - old_pos
}
