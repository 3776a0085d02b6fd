//! Live editor: the edit surface, its highlighted projection and the
//! primitive edits every higher level operation is built from.

use anyhow::{bail, Result};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use livecode_buffer::{char_len, EditSurface, Motion, Selection};
use livecode_highlight::{Highlighter, TokenTree};

use crate::config::EditorConfig;
use crate::indent;
use crate::language::ResolvedContext;
use crate::locator;
use crate::selection::SelectionState;

/// Named editor action, invoked by shortcuts
pub type Action = Rc<dyn Fn(&mut LiveEditor) -> Result<()>>;

type RebuildListener = Box<dyn FnMut(&TokenTree)>;

/// Builder for [`LiveEditor`]
#[derive(Default)]
pub struct EditorBuilder {
    config: Option<EditorConfig>,
    highlighter: Option<Box<dyn Highlighter>>,
    text: String,
    language: Option<String>,
}

impl EditorBuilder {
    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.highlighter = Some(Box::new(highlighter));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Create the editor and build its first projection.
    ///
    /// Fails when no highlighter was supplied.
    pub fn build(self) -> Result<LiveEditor> {
        let Some(highlighter) = self.highlighter else {
            bail!("No highlighter available; the editor cannot start");
        };
        let config = self.config.unwrap_or_default();
        let language = self
            .language
            .map(|language| config.registry.canonical(&language));

        let mut editor = LiveEditor {
            config,
            highlighter,
            surface: EditSurface::from_text(&self.text),
            projection: TokenTree::default(),
            language,
            tabstops: VecDeque::new(),
            observing: false,
            rebuild_pending: true,
            actions: HashMap::new(),
            listeners: Vec::new(),
        };
        editor.register_builtin_actions();
        editor.tick();
        log::info!(
            "Editor ready ({} chars, language: {})",
            editor.surface.len(),
            editor.language.as_deref().unwrap_or("none")
        );
        Ok(editor)
    }
}

/// Editable text with a live highlighted projection
pub struct LiveEditor {
    pub(crate) config: EditorConfig,
    highlighter: Box<dyn Highlighter>,
    pub(crate) surface: EditSurface,
    projection: TokenTree,
    language: Option<String>,
    /// Pending snippet stops, consumed front to back by Tab
    pub(crate) tabstops: VecDeque<isize>,
    /// Whether external rewrites of the projection are being watched
    observing: bool,
    rebuild_pending: bool,
    actions: HashMap<String, Action>,
    listeners: Vec<RebuildListener>,
}

impl LiveEditor {
    pub fn builder() -> EditorBuilder {
        EditorBuilder::default()
    }

    // === State ===

    pub fn value(&self) -> String {
        self.surface.value()
    }

    /// Language the whole text is highlighted as
    pub fn lang(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_language(&mut self, language: Option<&str>) {
        self.language = language.map(|language| self.config.registry.canonical(language));
        self.update();
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &EditSurface {
        &self.surface
    }

    pub fn selection(&self) -> Selection {
        self.surface.selection()
    }

    pub fn selection_state(&self) -> SelectionState<'_> {
        SelectionState::new(&self.surface)
    }

    /// Highlighted projection; stale while a rebuild is pending
    pub fn projection(&self) -> &TokenTree {
        &self.projection
    }

    pub fn tabstops(&self) -> &VecDeque<isize> {
        &self.tabstops
    }

    pub fn clear_tabstops(&mut self) {
        self.tabstops.clear();
    }

    pub fn is_focused(&self) -> bool {
        self.surface.is_focused()
    }

    pub fn focus(&mut self) {
        self.surface.set_focused(true);
    }

    pub fn blur(&mut self) {
        self.surface.set_focused(false);
    }

    /// Replace the whole text; the caret moves to the end
    pub fn set_value(&mut self, text: &str) {
        self.surface.set_value(text);
        self.tabstops.clear();
        self.update();
    }

    /// Indentation unit of the document
    pub fn indent(&self) -> String {
        indent::indent_of(&self.value(), &self.config.default_indent)
    }

    /// Indentation of the line ended by the line break before the caret
    pub fn current_indent(&self) -> String {
        indent::current_indent(&self.value(), self.surface.selection_start())
    }

    /// Language at the caret: the innermost embedded region, else the
    /// document language
    pub fn current_language(&self) -> Option<String> {
        locator::language_at(&self.projection, self.surface.selection_start())
            .or_else(|| self.language.clone())
            .map(|language| self.config.registry.canonical(&language))
    }

    /// Language context at the caret
    pub fn context(&self) -> ResolvedContext {
        self.config
            .registry
            .resolve(self.current_language().as_deref())
    }

    // === Primitive edits ===

    /// Insert text at the caret (replacing the selection) or at `at`.
    ///
    /// With `at`, each selection bound at or after the insertion point
    /// shifts by the inserted length and bounds before it stay put.
    /// Empty text is a no-op. Inserting focuses the surface.
    pub fn insert(&mut self, text: &str, at: Option<usize>) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.focus();

        let Some(at) = at else {
            return self.replace(text);
        };
        let at = at.min(self.surface.len());
        let (start, end) = (self.surface.selection_start(), self.surface.selection_end());
        let len = char_len(text);
        self.surface.replace_range(at, at, text)?;
        let shift = |bound: usize| if bound >= at { bound + len } else { bound };
        self.surface.set_selection(shift(start), shift(end));
        self.update();
        Ok(())
    }

    /// Replace the selection. A non-empty selection ends up spanning the new
    /// text; a caret ends up after it.
    pub fn replace(&mut self, text: &str) -> Result<()> {
        let had_selection = self.surface.has_selection();
        self.surface.replace_selection(text)?;
        if had_selection {
            let end = self.surface.selection_end();
            self.surface.set_selection(end - char_len(text), end);
        }
        self.update();
        Ok(())
    }

    /// Replace `start..end` and restore the selection that was active
    /// before (clamped to the new length)
    pub fn set_range(&mut self, text: &str, start: usize, end: usize) -> Result<()> {
        let (sel_start, sel_end) = (self.surface.selection_start(), self.surface.selection_end());
        self.surface.replace_range(start, end, text)?;
        self.surface.set_selection(sel_start, sel_end);
        self.update();
        Ok(())
    }

    /// Surround `range` (default: the selection) with `before` and `after`.
    ///
    /// Selection bounds past the region start move by `before`; bounds past
    /// the region end move by `after` as well.
    pub fn wrap(&mut self, before: &str, after: &str, range: Option<(usize, usize)>) -> Result<()> {
        let (sel_start, sel_end) = (self.surface.selection_start(), self.surface.selection_end());
        let len = self.surface.len();
        let (start, end) = range
            .map(|(a, b)| (a.min(b).min(len), a.max(b).min(len)))
            .unwrap_or((sel_start, sel_end));

        let between = self.surface.buffer().slice(start, end);
        self.set_range(&format!("{}{}{}", before, between, after), start, end)?;

        let (before_len, after_len) = (char_len(before), char_len(after));
        let shift = |bound: usize| {
            let mut bound = bound;
            if bound > start {
                bound += before_len;
            }
            if bound > end {
                bound += after_len;
            }
            bound
        };
        self.surface.set_selection(shift(sel_start), shift(sel_end));
        Ok(())
    }

    /// Replace the selection with `before + selection + after`.
    ///
    /// A selection is kept on the inserted text, or on the original text
    /// when `outside` is set. A caret ends up between the delimiters.
    pub fn wrap_selection(&mut self, before: &str, after: &str, outside: bool) -> Result<()> {
        let had_selection = self.surface.has_selection();
        let selected = self.surface.selected_text();
        self.replace(&format!("{}{}{}", before, selected, after))?;

        if had_selection {
            if outside {
                let (start, end) = (self.surface.selection_start(), self.surface.selection_end());
                self.surface
                    .set_selection(start + char_len(before), end - char_len(after));
            }
        } else {
            self.move_caret(-(char_len(after) as isize));
        }
        Ok(())
    }

    /// Delete `count` characters before (or after) the caret. A selection
    /// is deleted instead.
    pub fn delete(&mut self, count: usize, forward: bool) -> Result<()> {
        if self.surface.has_selection() {
            self.surface.replace_selection("")?;
            self.update();
            return Ok(());
        }
        if count == 0 {
            return Ok(());
        }

        let caret = self.surface.selection_start();
        if forward {
            let end = (caret + count).min(self.surface.len());
            self.surface.replace_range(caret, end, "")?;
            self.surface.set_caret(caret);
        } else {
            let start = caret.saturating_sub(count);
            self.surface.replace_range(start, caret, "")?;
            self.surface.set_caret(start);
        }
        self.update();
        Ok(())
    }

    /// Move a collapsed caret by `delta` characters from the selection end
    pub fn move_caret(&mut self, delta: isize) {
        if delta == 0 {
            return;
        }
        let target = self.surface.selection_end() as isize + delta;
        self.set_caret(target.max(0) as usize);
    }

    /// Collapse the selection at `offset` (clamped to the text)
    pub fn set_caret(&mut self, offset: usize) {
        self.surface.set_caret(offset);
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.surface.set_selection(start, end);
    }

    // === Native input ===

    /// Typed text: replaces the selection, caret after it
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        self.focus();
        self.surface.replace_selection(text)?;
        self.update();
        Ok(())
    }

    /// Pasted text; line breaks are normalized to `\n`
    pub fn paste(&mut self, text: &str) -> Result<()> {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.type_text(&text)
    }

    pub fn backspace(&mut self) -> Result<()> {
        if self.surface.backspace()? {
            self.update();
        }
        Ok(())
    }

    pub fn delete_forward(&mut self) -> Result<()> {
        if self.surface.delete_forward()? {
            self.update();
        }
        Ok(())
    }

    /// Caret navigation. Navigating abandons pending tab stops.
    pub fn navigate(&mut self, motion: Motion, extend: bool) {
        self.tabstops.clear();
        self.surface.move_caret(motion, extend);
    }

    pub fn select_all(&mut self) {
        self.tabstops.clear();
        self.surface.select_all();
    }

    /// Pointer click at `offset`
    pub fn click(&mut self, offset: usize) {
        self.tabstops.clear();
        self.focus();
        self.surface.set_caret(offset);
    }

    // === Projection lifecycle ===

    /// Schedule a projection rebuild. External rewrites are ignored until
    /// the rebuild has run.
    pub fn update(&mut self) {
        self.observing = false;
        self.rebuild_pending = true;
    }

    pub fn is_rebuild_pending(&self) -> bool {
        self.rebuild_pending
    }

    /// Run a pending rebuild. Returns whether the projection changed.
    pub fn tick(&mut self) -> bool {
        if !self.rebuild_pending {
            return false;
        }
        let value = self.surface.value();
        self.projection = self.highlighter.highlight(&value, self.language.as_deref());
        self.rebuild_pending = false;
        self.observing = true;

        let projection = &self.projection;
        for listener in &mut self.listeners {
            listener(projection);
        }
        true
    }

    /// The projection was rewritten by someone other than the editor.
    ///
    /// While the surface is unfocused the surface text is resynchronized
    /// from the rewritten projection. While it is focused the rewrite is
    /// discarded. Either way the projection is rebuilt from the text on the
    /// next tick. Rewrites arriving before a pending rebuild are ignored.
    /// Returns whether the surface text was resynchronized.
    pub fn external_rewrite(&mut self, rewritten: TokenTree) -> bool {
        if !self.observing {
            return false;
        }
        let text = rewritten.text();
        self.projection = rewritten;
        self.update();

        if self.surface.is_focused() || text == self.surface.value() {
            return false;
        }
        log::debug!("Resynchronizing edit surface from rewritten projection");
        let selection = self.surface.selection();
        self.surface.set_value(&text);
        self.surface.set_selection(selection.start(), selection.end());
        true
    }

    /// Call `listener` with every rebuilt projection
    pub fn on_rebuild(&mut self, listener: impl FnMut(&TokenTree) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // === Actions ===

    /// Register (or replace) a named action
    pub fn register_action(
        &mut self,
        name: &str,
        action: impl Fn(&mut LiveEditor) -> Result<()> + 'static,
    ) {
        self.actions.insert(name.to_string(), Rc::new(action));
    }

    /// Run a named action. Returns false for unknown names.
    pub fn run_action(&mut self, name: &str) -> Result<bool> {
        let Some(action) = self.actions.get(name).cloned() else {
            log::warn!("No editor action named '{}'", name);
            return Ok(false);
        };
        action(self)?;
        Ok(true)
    }

    fn register_builtin_actions(&mut self) {
        self.register_action("toggle-comment", |editor| {
            editor.toggle_comment().map(|_| ())
        });
        self.register_action("duplicate-line", LiveEditor::duplicate_line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecode_highlight::PatternHighlighter;
    use std::cell::RefCell;

    fn editor(text: &str) -> LiveEditor {
        LiveEditor::builder()
            .highlighter(PatternHighlighter::c_like())
            .text(text)
            .language("c")
            .build()
            .unwrap()
    }

    fn bounds(editor: &LiveEditor) -> (usize, usize) {
        let selection = editor.selection();
        (selection.start(), selection.end())
    }

    #[test]
    fn test_build_requires_highlighter() {
        let result = LiveEditor::builder().text("x").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_highlights_immediately() {
        let editor = editor("int x; // note");
        assert!(!editor.is_rebuild_pending());
        assert_eq!(editor.projection().text(), "int x; // note");
        assert_eq!(bounds(&editor), (0, 0));
        assert_eq!(editor.lang(), Some("c"));
    }

    #[test]
    fn test_insert_at_caret() {
        let mut editor = editor("ac");
        editor.set_caret(1);
        editor.insert("b", None).unwrap();
        assert_eq!(editor.value(), "abc");
        assert_eq!(bounds(&editor), (2, 2));
        assert!(editor.is_focused());
    }

    #[test]
    fn test_insert_replaces_selection_and_selects_it() {
        let mut editor = editor("a big dog");
        editor.set_selection(2, 5);
        editor.insert("tiny", None).unwrap();
        assert_eq!(editor.value(), "a tiny dog");
        assert_eq!(bounds(&editor), (2, 6));
    }

    #[test]
    fn test_insert_at_index_shifts_bounds() {
        let mut editor = editor("0123456789");
        editor.set_selection(3, 6);
        editor.insert("xx", Some(6)).unwrap();
        assert_eq!(editor.value(), "012345xx6789");
        assert_eq!(bounds(&editor), (3, 8));

        editor.insert("yy", Some(1)).unwrap();
        assert_eq!(bounds(&editor), (5, 10));

        editor.insert("zz", Some(11)).unwrap();
        assert_eq!(bounds(&editor), (5, 10));
    }

    #[test]
    fn test_insert_empty_is_noop() {
        let mut editor = editor("abc");
        editor.set_selection(0, 3);
        editor.insert("", None).unwrap();
        assert_eq!(editor.value(), "abc");
        assert!(!editor.is_rebuild_pending());
        assert!(!editor.is_focused());
    }

    #[test]
    fn test_set_range_restores_selection() {
        let mut editor = editor("hello world");
        editor.set_selection(6, 11);
        editor.set_range("HELLO", 0, 5).unwrap();
        assert_eq!(editor.value(), "HELLO world");
        assert_eq!(bounds(&editor), (6, 11));

        editor.set_range("", 0, 11).unwrap();
        assert_eq!(bounds(&editor), (0, 0));
    }

    #[test]
    fn test_wrap_range_shifts_bounds() {
        let mut editor = editor("a word here");
        editor.set_selection(3, 9);
        editor.wrap("<", ">", Some((2, 6))).unwrap();
        assert_eq!(editor.value(), "a <word> here");
        // Start inside the region, end after it
        assert_eq!(bounds(&editor), (4, 11));
    }

    #[test]
    fn test_wrap_selection_outside_keeps_inner_text_selected() {
        let mut editor = editor("x + y");
        editor.set_selection(4, 5);
        editor.wrap_selection("(", ")", true).unwrap();
        assert_eq!(editor.value(), "x + (y)");
        assert_eq!(bounds(&editor), (5, 6));
    }

    #[test]
    fn test_wrap_selection_inside_selects_everything() {
        let mut editor = editor("y");
        editor.set_selection(0, 1);
        editor.wrap_selection("/*", "*/", false).unwrap();
        assert_eq!(editor.value(), "/*y*/");
        assert_eq!(bounds(&editor), (0, 5));
    }

    #[test]
    fn test_wrap_selection_at_caret_lands_between() {
        let mut editor = editor("f");
        editor.set_caret(1);
        editor.wrap_selection("(", ")", true).unwrap();
        assert_eq!(editor.value(), "f()");
        assert_eq!(bounds(&editor), (2, 2));
    }

    #[test]
    fn test_delete() {
        let mut editor = editor("abcdef");
        editor.set_caret(4);
        editor.delete(2, false).unwrap();
        assert_eq!(editor.value(), "abef");
        assert_eq!(bounds(&editor), (2, 2));

        editor.delete(10, true).unwrap();
        assert_eq!(editor.value(), "ab");

        editor.delete(10, false).unwrap();
        assert_eq!(editor.value(), "");
    }

    #[test]
    fn test_move_caret_clamps() {
        let mut editor = editor("abc");
        editor.set_caret(1);
        editor.move_caret(-5);
        assert_eq!(bounds(&editor), (0, 0));
        editor.move_caret(10);
        assert_eq!(bounds(&editor), (3, 3));
        editor.set_selection(0, 2);
        editor.move_caret(0);
        assert_eq!(bounds(&editor), (0, 2));
    }

    #[test]
    fn test_rebuild_on_tick_and_listeners() {
        let mut editor = editor("a");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        editor.on_rebuild(move |tree| sink.borrow_mut().push(tree.text()));

        editor.set_caret(1);
        editor.insert("b", None).unwrap();
        editor.insert("c", None).unwrap();
        assert!(editor.is_rebuild_pending());
        assert_eq!(editor.projection().text(), "a");

        assert!(editor.tick());
        assert!(!editor.tick());
        assert_eq!(editor.projection().text(), "abc");
        assert_eq!(*seen.borrow(), ["abc"]);
    }

    #[test]
    fn test_external_rewrite_resyncs_unfocused_surface() {
        let mut editor = editor("abc");
        let resynced = editor.external_rewrite(TokenTree::plain("xyz", Some("c")));
        assert!(resynced);
        assert_eq!(editor.value(), "xyz");
        editor.tick();
        assert_eq!(editor.projection().text(), "xyz");
    }

    #[test]
    fn test_external_rewrite_discarded_while_focused() {
        let mut editor = editor("abc");
        editor.focus();
        assert!(!editor.external_rewrite(TokenTree::plain("xyz", None)));
        assert_eq!(editor.value(), "abc");
        editor.tick();
        assert_eq!(editor.projection().text(), "abc");
    }

    #[test]
    fn test_external_rewrite_ignored_during_pending_rebuild() {
        let mut editor = editor("abc");
        editor.set_value("abcd");
        assert!(!editor.external_rewrite(TokenTree::plain("xyz", None)));
        assert_eq!(editor.value(), "abcd");
    }

    #[test]
    fn test_navigation_clears_tabstops() {
        let mut editor = editor("abc");
        editor.tabstops.extend([-1, 1]);
        editor.navigate(Motion::Left, false);
        assert!(editor.tabstops().is_empty());

        editor.tabstops.extend([-1]);
        editor.click(2);
        assert!(editor.tabstops().is_empty());
        assert!(editor.is_focused());
    }

    #[test]
    fn test_paste_normalizes_line_breaks() {
        let mut editor = editor("");
        editor.paste("a\r\nb\rc").unwrap();
        assert_eq!(editor.value(), "a\nb\nc");
        assert_eq!(bounds(&editor), (5, 5));
    }

    #[test]
    fn test_unknown_action() {
        let mut editor = editor("");
        assert!(!editor.run_action("explode").unwrap());
        editor.register_action("shout", |editor| editor.insert("!", None));
        assert!(editor.run_action("shout").unwrap());
        assert_eq!(editor.value(), "!");
    }

    #[test]
    fn test_indent_queries() {
        let mut editor = editor("if (x) {\n    y;\n");
        assert_eq!(editor.indent(), "    ");
        editor.set_caret(editor.value().chars().count());
        assert_eq!(editor.current_indent(), "    ");
        assert_eq!(editor.context().name, "c");
    }
}
