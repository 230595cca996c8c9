//! Terminal visual host
//!
//! Renders one line per list entry and maps mouse clicks back to the row
//! handles the list controller knows about.

use ratatui::{buffer::Buffer, layout::Rect, style::{Color, Style}};
use unicode_width::UnicodeWidthStr;

use super::theme::{
    parse_hex_color, Highlight, Theme, DEFAULT_SELECTED_BACKGROUND, DEFAULT_SELECTED_FOREGROUND,
};
use crate::listbox::VisualHost;

/// Handle of a rendered row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(u64);

#[derive(Debug)]
struct Row {
    id: RowId,
    label: String,
    clickable: bool,
    /// (background, foreground) while highlighted
    colors: Option<(Color, Color)>,
}

/// Line-per-row host drawn into a ratatui buffer
#[derive(Debug, Default)]
pub struct TerminalHost {
    rows: Vec<Row>,
    next_id: u64,
    /// First visible row
    offset: usize,
    /// Where rows were last drawn, for hit testing
    last_area: Option<Rect>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels in display order
    #[cfg(test)]
    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }

    /// Row under the given terminal cell, if it accepts clicks
    pub fn hit_test(&self, column: u16, row: u16) -> Option<RowId> {
        let area = self.last_area?;
        if column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }

        let index = self.offset + (row - area.y) as usize;
        self.rows
            .get(index)
            .filter(|r| r.clickable)
            .map(|r| r.id)
    }

    /// Draw the visible rows into `area`, scrolling to keep the highlighted
    /// row on screen
    pub fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        self.last_area = Some(area);
        if area.width == 0 || area.height == 0 {
            return;
        }

        let height = area.height as usize;
        if let Some(highlighted) = self.rows.iter().position(|r| r.colors.is_some()) {
            if highlighted < self.offset {
                self.offset = highlighted;
            } else if highlighted >= self.offset + height {
                self.offset = highlighted + 1 - height;
            }
        }
        self.offset = self.offset.min(self.rows.len().saturating_sub(height));

        let default_style = Style::default().bg(theme.background).fg(theme.foreground);
        let text_width = area.width.saturating_sub(2) as usize;

        for (line, row) in self.rows.iter().skip(self.offset).take(height).enumerate() {
            let y = area.y + line as u16;
            let style = match row.colors {
                Some((bg, fg)) => Style::default().bg(bg).fg(fg),
                None => default_style,
            };
            buf.set_style(Rect::new(area.x, y, area.width, 1), style);
            buf.set_string(area.x + 1, y, truncate(&row.label, text_width), style);
        }
    }

    fn row_mut(&mut self, handle: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == handle)
    }
}

impl VisualHost for TerminalHost {
    type Handle = RowId;

    fn append(&mut self, label: &str) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.push(Row {
            id,
            label: label.to_string(),
            clickable: false,
            colors: None,
        });
        id
    }

    fn detach(&mut self, handle: RowId) {
        self.rows.retain(|r| r.id != handle);
    }

    fn detach_all(&mut self) {
        self.rows.clear();
        self.offset = 0;
    }

    fn listen_clicks(&mut self, handle: RowId) {
        if let Some(row) = self.row_mut(handle) {
            row.clickable = true;
        }
    }

    fn set_highlight(&mut self, handle: RowId, highlight: Option<&Highlight>) {
        let colors = highlight.map(|h| {
            (
                color_or(&h.background, DEFAULT_SELECTED_BACKGROUND),
                color_or(&h.foreground, DEFAULT_SELECTED_FOREGROUND),
            )
        });
        if let Some(row) = self.row_mut(handle) {
            row.colors = colors;
        }
    }
}

fn color_or(value: &str, fallback: &str) -> Color {
    parse_hex_color(value).unwrap_or_else(|e| {
        tracing::warn!("Invalid highlight color {:?} ({}), using {}", value, e, fallback);
        parse_hex_color(fallback).unwrap_or(Color::Reset)
    })
}

/// Truncate string to fit within max_width, adding ellipsis if needed
fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 1 {
        return "…".repeat(max_width);
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if current_width + char_width + 1 > max_width {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(bg: &str, fg: &str) -> Highlight {
        Highlight {
            background: bg.to_string(),
            foreground: fg.to_string(),
        }
    }

    fn host_with(labels: &[&str]) -> (TerminalHost, Vec<RowId>) {
        let mut host = TerminalHost::new();
        let ids = labels
            .iter()
            .map(|label| {
                let id = host.append(label);
                host.listen_clicks(id);
                id
            })
            .collect();
        (host, ids)
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello w…");
        assert_eq!(truncate("hello", 1), "…");
        assert_eq!(truncate("hello", 0), "");
    }

    #[test]
    fn test_detach() {
        let (mut host, ids) = host_with(&["Sword", "Shield", "Bow"]);
        host.detach(ids[1]);
        assert_eq!(host.labels(), vec!["Sword", "Bow"]);
        host.detach_all();
        assert!(host.labels().is_empty());
    }

    #[test]
    fn test_render_and_hit_test() {
        let (mut host, ids) = host_with(&["Sword", "Shield"]);
        let area = Rect::new(2, 1, 10, 4);
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 6));

        assert_eq!(host.hit_test(3, 1), None); // nothing rendered yet
        host.render(area, &mut buf, &Theme::plain());

        assert_eq!(buf.cell((3, 1)).unwrap().symbol(), "S");
        assert_eq!(host.hit_test(3, 1), Some(ids[0]));
        assert_eq!(host.hit_test(11, 2), Some(ids[1]));
        assert_eq!(host.hit_test(3, 3), None); // below the last row
        assert_eq!(host.hit_test(1, 1), None); // left of the area
    }

    #[test]
    fn test_hit_test_requires_listening() {
        let mut host = TerminalHost::new();
        host.append("Sword");
        host.render(Rect::new(0, 0, 10, 2), &mut Buffer::empty(Rect::new(0, 0, 10, 2)), &Theme::plain());
        assert_eq!(host.hit_test(0, 0), None);
    }

    #[test]
    fn test_highlight_colors() {
        let (mut host, ids) = host_with(&["Sword", "Shield"]);
        host.set_highlight(ids[1], Some(&highlight("#3390ff", "#ffffff")));

        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 2));
        host.render(Rect::new(0, 0, 10, 2), &mut buf, &Theme::plain());
        let cell = buf.cell((0, 1)).unwrap();
        assert_eq!(cell.bg, Color::Rgb(0x33, 0x90, 0xff));
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
        assert_eq!(buf.cell((0, 0)).unwrap().bg, Color::Reset);

        host.set_highlight(ids[1], None);
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 2));
        host.render(Rect::new(0, 0, 10, 2), &mut buf, &Theme::plain());
        assert_eq!(buf.cell((0, 1)).unwrap().bg, Color::Reset);
    }

    #[test]
    fn test_invalid_highlight_falls_back() {
        let (mut host, ids) = host_with(&["Sword"]);
        host.set_highlight(ids[0], Some(&highlight("blue-ish", "#000")));

        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 1));
        host.render(Rect::new(0, 0, 10, 1), &mut buf, &Theme::plain());
        let cell = buf.cell((0, 0)).unwrap();
        assert_eq!(cell.bg, Color::Rgb(0x33, 0x90, 0xff));
        assert_eq!(cell.fg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_scrolls_to_highlight() {
        let labels: Vec<String> = (0..10).map(|i| format!("item{}", i)).collect();
        let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let (mut host, ids) = host_with(&refs);
        host.set_highlight(ids[7], Some(&highlight("#000000", "#ffffff")));

        let area = Rect::new(0, 0, 10, 3);
        host.render(area, &mut Buffer::empty(area), &Theme::plain());

        // Rows 5..8 visible, highlighted one at the bottom
        assert_eq!(host.hit_test(0, 2), Some(ids[7]));
        assert_eq!(host.hit_test(0, 0), Some(ids[5]));
    }
}
