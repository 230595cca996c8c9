//! Main draw functions
//!
//! Layout:
//! - Header (title, or the import prompt)
//! - Definition list, with the selected definition's fields beside it
//! - Status bar (latest notice, or key help)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppMode};

/// Draw the whole UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let theme = app.theme().clone();
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header / prompt
            Constraint::Min(1),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_header(f, app, chunks[0]);

    let body = if app.config().list.show_details {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(chunks[1])
    };

    draw_list(f, app, body[0]);
    if let Some(&details_area) = body.get(1) {
        draw_details(f, app, details_area);
    }
    draw_status_bar(f, app, chunks[2]);
}

/// Title bar, replaced by the path prompt while importing
fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(" defbox ");

    match app.mode() {
        AppMode::Prompt { input } => {
            let prompt = format!("Import .{} file: ", app.import_extension());
            let cursor_x = area.x + 1 + (prompt.width() + input.width()) as u16;
            let text = Line::from(vec![
                Span::styled(prompt, Style::default().fg(theme.accent)),
                Span::styled(input.as_str(), Style::default().fg(theme.foreground)),
            ]);
            f.render_widget(Paragraph::new(text).block(block), area);
            f.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
        }
        AppMode::Browse => {
            let pending = app.pending_imports();
            let text = if pending > 0 {
                format!("{} definitions, {} import(s) running (s: stop)", app.listbox().len(), pending)
            } else if app.listbox().is_empty() {
                "No definitions yet, press o to import a file".to_string()
            } else {
                format!("{} definitions", app.listbox().len())
            };
            f.render_widget(
                Paragraph::new(text)
                    .style(Style::default().fg(theme.dimmed))
                    .block(block),
                area,
            );
        }
    }
}

/// Definition rows, drawn by the terminal host
fn draw_list(f: &mut Frame, app: &mut App, area: Rect) {
    let theme = app.theme().clone();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.dimmed))
        .title(" definitions ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    app.listbox_mut()
        .host_mut()
        .render(inner, f.buffer_mut(), &theme);
}

/// Fields of the selected definition
fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.dimmed))
        .title(" details ");

    let lines: Vec<Line> = match app.listbox().selected() {
        Some(definition) => {
            let mut lines = vec![Line::from(Span::styled(
                definition.name.clone(),
                Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
            ))];
            lines.extend(definition.fields.iter().map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!("{}: ", key), Style::default().fg(theme.accent)),
                    Span::styled(value.to_string(), Style::default().fg(theme.foreground)),
                ])
            }));
            lines
        }
        None => vec![Line::from(Span::styled(
            "Nothing selected",
            Style::default().fg(theme.dimmed),
        ))],
    };

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

/// Latest notice, or key help when there is none
fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();

    let (text, style) = match app.notices().last() {
        Some(notice) if notice.is_error => (format!(" {}", notice.text), Style::default().fg(theme.error)),
        Some(notice) => (format!(" {}", notice.text), Style::default().fg(theme.dimmed)),
        None if app.is_prompting() => (
            " Enter: import | Esc: cancel".to_string(),
            Style::default().fg(theme.dimmed),
        ),
        None => (
            " o: import | j/k: navigate | d: remove | c: clear | s: stop imports | x: export | q: quit".to_string(),
            Style::default().fg(theme.dimmed),
        ),
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}
