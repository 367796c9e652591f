//! Chat screen rendering
//!
//! Renders the transcript with light Markdown styling (headings, bold spans,
//! tables, bullets), the input box, and a status line.

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ChatMessage, Role};

/// Renders the whole chat screen
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(3),    // Transcript
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
        ])
        .split(frame.area());

    render_title(frame, chunks[0]);
    render_transcript(frame, app, chunks[1]);
    render_input(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " 🔗 L1 Chat ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Ethereum · Bitcoin · BSC · Tron · Base",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for message in &app.messages {
        lines.extend(message_lines(message));
        lines.push(Line::from(""));
    }
    if app.pending {
        lines.push(Line::from(Span::styled(
            "L1 Chat is fetching live data...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    // Scroll is counted from the bottom so new messages stay in view
    let total = wrapped_height(&lines, inner.width);
    let max_offset = total.saturating_sub(inner.height);
    let offset = max_offset.saturating_sub(app.scroll.min(max_offset));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

/// Rows the lines take once wrapped to `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let width = width as usize;
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

fn message_lines(message: &ChatMessage) -> Vec<Line<'static>> {
    let (name, color) = match message.role {
        Role::User => ("You", Color::Green),
        Role::Assistant => ("L1 Chat", Color::Cyan),
    };
    let header = Line::from(vec![
        Span::styled(
            name,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", message.at.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let mut lines = vec![header];
    match message.role {
        Role::User => lines.push(Line::from(message.content.clone())),
        Role::Assistant => lines.extend(markdown_lines(&message.content)),
    }
    lines
}

/// Converts the subset of Markdown produced by the formatter into styled lines
pub fn markdown_lines(markdown: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut table_row = 0usize;

    for raw in markdown.lines() {
        let text = raw.trim_end();

        if text.starts_with('|') {
            if is_table_separator(text) {
                continue;
            }
            let style = if table_row == 0 {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(table_line(text, style));
            table_row += 1;
            continue;
        }
        table_row = 0;

        if let Some(heading) = text.strip_prefix("## ").or_else(|| text.strip_prefix("# ")) {
            lines.push(Line::from(Span::styled(
                strip_emphasis(heading),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
        } else if text == "---" {
            lines.push(Line::from(Span::styled(
                "─".repeat(40),
                Style::default().fg(Color::DarkGray),
            )));
        } else if let Some(item) = text.strip_prefix("- ") {
            let mut spans = vec![Span::raw("  • ")];
            spans.extend(inline_spans(item, Style::default()));
            lines.push(Line::from(spans));
        } else if text.len() > 1 && text.starts_with('_') && text.ends_with('_') {
            lines.push(Line::from(Span::styled(
                text.trim_matches('_').to_string(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        } else {
            lines.push(Line::from(inline_spans(text, Style::default())));
        }
    }
    lines
}

fn is_table_separator(row: &str) -> bool {
    row.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn table_line(row: &str, style: Style) -> Line<'static> {
    let cells: Vec<String> = row
        .trim_matches('|')
        .split('|')
        .map(|cell| strip_emphasis(cell.trim()))
        .collect();
    Line::from(Span::styled(cells.join(" │ "), style))
}

/// Splits `**bold**` spans, toggling bold on each marker
fn inline_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    text.split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            let style = if i % 2 == 1 {
                base.add_modifier(Modifier::BOLD)
            } else {
                base
            };
            Span::styled(part.to_string(), style)
        })
        .collect()
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.pending { " Waiting for answer " } else { " Ask " };
    let border = if app.pending { Color::DarkGray } else { Color::Cyan };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);

    // Keep the cursor visible on long input by scrolling horizontally
    let width = inner.width.max(1) as usize;
    let skip = (app.cursor + 1).saturating_sub(width);
    let visible: String = app.input.chars().skip(skip).take(width).collect();

    frame.render_widget(Paragraph::new(visible).block(block), area);

    if !app.show_help {
        let x = inner.x + (app.cursor - skip) as u16;
        frame.set_cursor_position(Position::new(x, inner.y));
    }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.pending {
        Span::styled(" ⏳ Fetching live data...", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            " Enter send · ↑/↓ PgUp/PgDn scroll · Ctrl-L clear · F1 help · Esc quit",
            Style::default().fg(Color::DarkGray),
        )
    };
    frame.render_widget(Paragraph::new(Line::from(status)), area);
}
