//! Shared drawing helpers: bordered panels, input lines, key hints.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthStr;

use super::text::{sanitize_for_display, truncate_start_with_ellipsis};

/// Centers a `width` x `height` box inside `area`, clamped to fit.
pub fn centered_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Clears `area`, draws a titled border and returns the inner area.
pub fn render_panel(frame: &mut Frame, area: Rect, title: &str, border_color: Color) -> Rect {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {title} "))
        .title_alignment(Alignment::Center)
        .title_style(
            Style::default()
                .fg(border_color)
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    Rect::new(
        inner.x + 1,
        inner.y,
        inner.width.saturating_sub(2),
        inner.height,
    )
}

/// A labelled input line: "Label  text█".
pub struct InputLine<'a> {
    pub label: &'a str,
    pub value: &'a str,
    pub placeholder: &'a str,
    pub focused: bool,
}

/// Width reserved for input labels so fields line up.
const LABEL_WIDTH: usize = 13;

/// Renders one input line. The cursor block is only drawn when focused.
///
/// Control characters in the value are replaced before drawing.
pub fn render_input_line(frame: &mut Frame, area: Rect, input: &InputLine<'_>) {
    let accent = if input.focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let label = format!("{:<LABEL_WIDTH$}", input.label);
    let max_text_width = (area.width as usize).saturating_sub(label.width() + 1);

    let mut spans = vec![Span::styled(label, Style::default().fg(accent))];
    if input.value.is_empty() {
        if input.focused {
            spans.push(Span::styled("█", Style::default().fg(accent)));
        }
        spans.push(Span::styled(
            truncate_start_with_ellipsis(input.placeholder, max_text_width),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        let value = sanitize_for_display(input.value);
        spans.push(Span::styled(
            truncate_start_with_ellipsis(&value, max_text_width),
            Style::default().fg(Color::White),
        ));
        if input.focused {
            spans.push(Span::styled("█", Style::default().fg(accent)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Keyboard hint shown in footers.
pub struct InputHint<'a> {
    pub key: &'a str,
    pub action: &'a str,
}

impl<'a> InputHint<'a> {
    pub fn new(key: &'a str, action: &'a str) -> Self {
        Self { key, action }
    }
}

/// Renders hints centered on the last row of `area`.
pub fn render_hints(frame: &mut Frame, area: Rect, hints: &[InputHint], highlight_color: Color) {
    if area.height == 0 {
        return;
    }
    let hints_area = Rect::new(area.x, area.y + area.height - 1, area.width, 1);

    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(highlight_color)));
        spans.push(Span::styled(
            format!(" {}", hint.action),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        hints_area,
    );
}

/// Renders a horizontal separator at `y_offset` inside `area`.
pub fn render_separator(frame: &mut Frame, area: Rect, y_offset: u16) {
    if y_offset >= area.height {
        return;
    }
    let separator = "─".repeat(area.width as usize);
    let separator_area = Rect::new(area.x, area.y + y_offset, area.width, 1);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            separator,
            Style::default().fg(Color::DarkGray),
        ))),
        separator_area,
    );
}
