//! Rendering of the editor: gutter, highlighted projection, selection,
//! caret and status line.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthChar;

use livecode_highlight::{style_for_kind, TokenTree};

use crate::app::App;

/// Columns a tab advances to
pub const TAB_WIDTH: usize = 4;

const GUTTER_STYLE: Style = Style::new().fg(Color::DarkGray);
const STATUS_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Gray);

/// Display width of `ch` starting at display column `column`
fn char_width(ch: char, column: usize) -> usize {
    if ch == '\t' {
        TAB_WIDTH - column % TAB_WIDTH
    } else {
        ch.width().unwrap_or(0)
    }
}

/// Display column of character `index` on `line`
pub fn column_of(line: &str, index: usize) -> usize {
    line.chars()
        .take(index)
        .fold(0, |column, ch| column + char_width(ch, column))
}

/// Character offset for a display cell; positions past a line end land on
/// its end and rows past the text on the text end
pub fn offset_at(text: &str, row: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, line) in text.split('\n').enumerate() {
        let len = line.chars().count();
        if index == row {
            let mut width = 0;
            for (char_index, ch) in line.chars().enumerate() {
                let next = width + char_width(ch, width);
                if column < next {
                    // Clicks on the right half of a wide cell go after it
                    return offset + char_index + usize::from(column * 2 >= width + next);
                }
                width = next;
            }
            return offset + len;
        }
        offset += len + 1;
    }
    text.chars().count()
}

/// Styled lines of the projection with the selection highlighted
pub fn projection_lines(tree: &TokenTree, selection: (usize, usize)) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();
    let mut offset = 0;
    let mut column = 0;

    for leaf in tree.leaves() {
        let base = tree
            .ancestors(&leaf.path)
            .first()
            .map(|token| style_for_kind(&token.kind))
            .unwrap_or_default();

        for ch in leaf.text.chars() {
            let selected = offset >= selection.0 && offset < selection.1;
            let style = if selected {
                base.add_modifier(Modifier::REVERSED)
            } else {
                base
            };

            if style != run_style && !run.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut run), run_style));
            }
            run_style = style;

            if ch == '\n' {
                if selected {
                    run.push(' ');
                }
                if !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
                column = 0;
            } else if ch == '\t' {
                let width = char_width(ch, column);
                run.push_str(&" ".repeat(width));
                column += width;
            } else {
                run.push(ch);
                column += char_width(ch, column);
            }
            offset += 1;
        }
    }

    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    lines.push(Line::from(spans));
    lines
}

/// The `height` projection lines starting at line `scroll`
pub fn visible_lines(
    tree: &TokenTree,
    selection: (usize, usize),
    scroll: usize,
    height: usize,
) -> Vec<Line<'static>> {
    projection_lines(tree, selection)
        .into_iter()
        .skip(scroll)
        .take(height)
        .collect()
}

/// Render the whole screen
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Text
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_editor(frame, app, chunks[0]);
    render_status(frame, app, chunks[1]);
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let editor = app.editor();
    let gutter = app.gutter();
    let gutter_width = gutter.width() as u16 + 1;
    let [gutter_area, text_area] = Layout::horizontal([
        Constraint::Length(gutter_width),
        Constraint::Min(0),
    ])
    .areas(area);

    let scroll = app.scroll();
    let labels: Vec<Line> = (scroll..scroll + area.height as usize)
        .map(|index| Line::from(Span::styled(gutter.label(index), GUTTER_STYLE)))
        .collect();
    frame.render_widget(Paragraph::new(labels), gutter_area);

    let selection = editor.selection();
    let lines = visible_lines(
        editor.projection(),
        (selection.start(), selection.end()),
        scroll,
        text_area.height as usize,
    );
    frame.render_widget(Paragraph::new(lines), text_area);

    if editor.is_focused() {
        let (row, column) = app.caret_cell();
        if row >= scroll && row < scroll + text_area.height as usize {
            frame.set_cursor_position((
                text_area.x + (column as u16).min(text_area.width.saturating_sub(1)),
                text_area.y + (row - scroll) as u16,
            ));
        }
    }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let editor = app.editor();
    let (row, column) = app.caret_cell();
    let mut status = format!(
        " {} | {} | Ln {}, Col {}",
        app.title(),
        editor.current_language().unwrap_or_else(|| "plain".to_string()),
        row + 1,
        column + 1
    );
    let stops = editor.tabstops().len();
    if stops > 0 {
        status.push_str(&format!(" | {} stop(s) pending", stops));
    }
    if let Some(problem) = livecode_logger::last_problem() {
        status.push_str(&format!(" | {}: {}", problem.level.to_str(), problem.message));
    }
    status.push_str(" | Ctrl+Q quit");
    frame.render_widget(Paragraph::new(status).style(STATUS_STYLE), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecode_highlight::{Node, Token};

    #[test]
    fn test_column_of_expands_tabs() {
        assert_eq!(column_of("\tab", 1), 4);
        assert_eq!(column_of("a\tb", 2), 4);
        assert_eq!(column_of("日本", 1), 2);
    }

    #[test]
    fn test_offset_at() {
        let text = "ab\n\tcd\nlast";
        assert_eq!(offset_at(text, 0, 1), 1);
        assert_eq!(offset_at(text, 0, 9), 2);
        // Left half of the tab cell
        assert_eq!(offset_at(text, 1, 1), 3);
        assert_eq!(offset_at(text, 1, 4), 4);
        assert_eq!(offset_at(text, 9, 0), text.chars().count());
    }

    #[test]
    fn test_projection_lines_split_and_style() {
        let tree = TokenTree {
            language: None,
            children: vec![
                Node::Text("x = ".to_string()),
                Node::Token(Token::new("comment").with_text("// a\n")),
                Node::Text("y".to_string()),
            ],
        };
        let lines = projection_lines(&tree, (0, 0));
        assert_eq!(lines.len(), 2);
        let first: String = lines[0].spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(first, "x = // a");
        assert_eq!(lines[0].spans[1].style, style_for_kind("comment"));
        assert_eq!(lines[1].spans[0].content, "y");
    }

    #[test]
    fn test_visible_lines_start_at_scroll() {
        let text: String = (0..70_000).map(|n| format!("{}\n", n)).collect();
        let tree = TokenTree::plain(&text, None);
        let lines = visible_lines(&tree, (0, 0), 66_000, 3);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].spans[0].content, "66000");
        assert_eq!(lines[2].spans[0].content, "66002");

        // Past the end there is only the trailing empty line
        let tail = visible_lines(&tree, (0, 0), 70_000, 5);
        assert_eq!(tail.len(), 1);
        assert!(tail[0].spans.is_empty());
    }

    #[test]
    fn test_selection_is_reversed() {
        let tree = TokenTree::plain("abc", None);
        let lines = projection_lines(&tree, (1, 2));
        let spans = &lines[0].spans;
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "b");
        assert!(spans[1].style.add_modifier.contains(Modifier::REVERSED));
    }
}
