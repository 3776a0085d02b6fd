//! Host application: one document, one live editor, a gutter and a
//! status line.

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{backend::Backend, Terminal};
use std::cell::{Ref, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use livecode_config::Config;
use livecode_editor::{EditorConfig, LineNumbers, LiveEditor};
use livecode_highlight::{detect_language, global_highlighter};

use crate::event::{Event, EventHandler};
use crate::ui;

/// Text loaded into the editor
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub path: Option<PathBuf>,
    pub text: String,
    pub language: Option<String>,
}

impl Document {
    /// Read a file; line endings are normalized to `\n`
    pub fn open(path: PathBuf) -> Result<Self> {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let text = raw.replace("\r\n", "\n").replace('\r', "\n");
        let language = detect_language(&path).map(str::to_string);
        log::info!(
            "Opened {} ({} lines, language: {})",
            path.display(),
            text.lines().count(),
            language.as_deref().unwrap_or("none")
        );
        Ok(Self {
            path: Some(path),
            text,
            language,
        })
    }

    /// Empty unnamed document
    pub fn scratch() -> Self {
        Self::default()
    }

    /// File name for the status line
    pub fn title(&self) -> String {
        self.path
            .as_ref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "[scratch]".to_string())
    }
}

pub struct App {
    editor: LiveEditor,
    gutter: Rc<RefCell<LineNumbers>>,
    events: EventHandler,
    tick_rate: Duration,
    /// When the projection was last brought up to date
    last_rebuild: Instant,
    title: String,
    should_quit: bool,
    needs_redraw: bool,
    /// First visible line
    scroll: usize,
    /// Rows available for text
    viewport_height: usize,
}

impl App {
    pub fn new(config: &Config, document: Document) -> Result<Self> {
        let mut builder = LiveEditor::builder()
            .config(EditorConfig::from_settings(config))
            .highlighter(global_highlighter())
            .text(document.text.as_str());
        if let Some(language) = &document.language {
            builder = builder.language(language.as_str());
        }
        let mut editor = builder.build()?;
        editor.focus();

        let gutter = Rc::new(RefCell::new(LineNumbers::new()));
        gutter.borrow_mut().refresh(editor.projection());
        let listener = Rc::clone(&gutter);
        editor.on_rebuild(move |tree| listener.borrow_mut().refresh(tree));

        let tick_rate = Duration::from_millis(config.editor.tick_rate_ms);
        Ok(Self {
            editor,
            gutter,
            events: EventHandler::new(tick_rate),
            tick_rate,
            last_rebuild: Instant::now(),
            title: document.title(),
            should_quit: false,
            needs_redraw: true,
            scroll: 0,
            viewport_height: 1,
        })
    }

    pub fn editor(&self) -> &LiveEditor {
        &self.editor
    }

    pub fn gutter(&self) -> Ref<'_, LineNumbers> {
        self.gutter.borrow()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Row and display column of the caret
    pub fn caret_cell(&self) -> (usize, usize) {
        let value = self.editor.value();
        let caret = self.editor.selection().active;
        let before: String = value.chars().take(caret).collect();
        let row = before.matches('\n').count();
        let line = before.rsplit('\n').next().unwrap_or_default();
        (row, ui::column_of(line, line.chars().count()))
    }

    /// Run the main loop until Ctrl+Q
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let size = terminal.size()?;
        self.resize(size.height);

        while !self.should_quit {
            match self.events.next()? {
                Event::Key(key) => {
                    self.handle_key_event(key)?;
                    self.needs_redraw = true;
                }
                Event::Mouse(mouse) => self.handle_mouse_event(mouse),
                Event::Paste(text) => {
                    self.editor.paste(&text)?;
                    self.needs_redraw = true;
                }
                Event::Resize(_, height) => {
                    self.resize(height);
                    self.needs_redraw = true;
                }
                Event::FocusLost => {
                    self.editor.blur();
                    self.needs_redraw = true;
                }
                Event::FocusGained => {
                    self.editor.focus();
                    self.needs_redraw = true;
                }
                Event::Tick => self.rebuild(Instant::now()),
            }

            // Continuous input never yields a Tick
            self.rebuild_if_due(Instant::now());

            if self.needs_redraw {
                self.follow_caret();
                terminal.draw(|frame| ui::render(frame, self))?;
                self.needs_redraw = false;
            }
        }

        Ok(())
    }

    fn rebuild(&mut self, now: Instant) {
        if self.editor.tick() {
            self.needs_redraw = true;
        }
        self.last_rebuild = now;
    }

    /// Rebuild a pending projection once a full tick interval has passed
    /// since the last rebuild
    fn rebuild_if_due(&mut self, now: Instant) {
        if self.editor.is_rebuild_pending()
            && now.saturating_duration_since(self.last_rebuild) >= self.tick_rate
        {
            self.rebuild(now);
        }
    }

    fn resize(&mut self, height: u16) {
        // Last row is the status line
        self.viewport_height = (height as usize).saturating_sub(1).max(1);
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::CONTROL {
            self.should_quit = true;
            return Ok(());
        }
        self.editor.handle_key(key)?;
        Ok(())
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let gutter_width = self.gutter().width() + 1;
                let row = mouse.row as usize;
                if row >= self.viewport_height {
                    return;
                }
                let column = (mouse.column as usize).saturating_sub(gutter_width);
                let offset = ui::offset_at(&self.editor.value(), self.scroll + row, column);
                self.editor.click(offset);
                self.needs_redraw = true;
            }
            MouseEventKind::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(3);
                self.needs_redraw = true;
            }
            MouseEventKind::ScrollDown => {
                let last = self.gutter().count().saturating_sub(1);
                self.scroll = (self.scroll + 3).min(last);
                self.needs_redraw = true;
            }
            _ => {}
        }
    }

    /// Keep the caret line inside the viewport
    fn follow_caret(&mut self) {
        let (row, _) = self.caret_cell();
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + self.viewport_height {
            self.scroll = row + 1 - self.viewport_height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_open_normalizes_line_endings_and_detects_language() {
        let mut file = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
        file.write_all(b"fn main() {\r\n}\r\n").unwrap();

        let document = Document::open(file.path().to_path_buf()).unwrap();
        assert_eq!(document.text, "fn main() {\n}\n");
        assert_eq!(document.language.as_deref(), Some("rust"));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Document::open(dir.path().join("missing.rs")).is_err());
    }

    #[test]
    fn test_scratch_title() {
        assert_eq!(Document::scratch().title(), "[scratch]");
    }

    #[test]
    fn test_keys_reach_editor_and_ctrl_q_quits() {
        let mut app = App::new(&Config::default(), Document::scratch()).unwrap();
        app.handle_key_event(key(KeyCode::Char('a'), KeyModifiers::NONE))
            .unwrap();
        app.handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        assert_eq!(app.editor().value(), "a\n");
        assert_eq!(app.caret_cell(), (1, 0));
        assert!(!app.should_quit);

        app.handle_key_event(key(KeyCode::Char('q'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_gutter_follows_ticks() {
        let document = Document {
            text: "one".to_string(),
            ..Document::default()
        };
        let mut app = App::new(&Config::default(), document).unwrap();
        assert_eq!(app.gutter().count(), 1);

        app.editor.paste("\ntwo\nthree").unwrap();
        assert!(app.editor.tick());
        assert_eq!(app.gutter().count(), 3);
    }

    #[test]
    fn test_pending_rebuild_runs_after_one_tick_interval() {
        let mut app = App::new(&Config::default(), Document::scratch()).unwrap();
        let start = app.last_rebuild;
        app.handle_key_event(key(KeyCode::Char('a'), KeyModifiers::NONE))
            .unwrap();
        app.needs_redraw = false;

        app.rebuild_if_due(start);
        assert!(app.editor().is_rebuild_pending());
        assert_eq!(app.gutter().count(), 1);

        app.handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        let due = start + app.tick_rate;
        app.rebuild_if_due(due);
        assert!(!app.editor().is_rebuild_pending());
        assert_eq!(app.editor().projection().text(), "a\n");
        assert_eq!(app.gutter().count(), 2);
        assert!(app.needs_redraw);
        assert_eq!(app.last_rebuild, due);
    }

    #[test]
    fn test_click_maps_cell_to_offset() {
        let document = Document {
            text: "ab\ncd".to_string(),
            ..Document::default()
        };
        let mut app = App::new(&Config::default(), document).unwrap();
        app.resize(10);
        // Gutter is one digit plus padding
        app.handle_mouse_event(click(3, 1));
        assert_eq!(app.editor().selection().active, 4);
    }

    #[test]
    fn test_scroll_follows_caret() {
        let document = Document {
            text: "1\n2\n3\n4\n5\n6".to_string(),
            ..Document::default()
        };
        let mut app = App::new(&Config::default(), document).unwrap();
        app.resize(3);
        app.editor.set_caret(10);
        app.follow_caret();
        assert_eq!(app.scroll(), 4);
        app.editor.set_caret(0);
        app.follow_caret();
        assert_eq!(app.scroll(), 0);
    }
}
