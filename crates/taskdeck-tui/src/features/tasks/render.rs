//! Task manager view: the draft form above the task list.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::state::{TaskFocus, TaskManagerState};
use crate::common::panel::{InputHint, InputLine, render_hints, render_input_line, render_panel};
use crate::common::{sanitize_for_display, truncate_with_ellipsis};

/// Max width of the task screen; wider terminals get side margins.
const MAX_WIDTH: u16 = 90;

/// Form rows: borders, title, description, button, message, hints.
const FORM_HEIGHT: u16 = 7;

pub const EMPTY_LIST: &str = "No tasks yet.";

pub fn render_task_manager(frame: &mut Frame, state: &TaskManagerState, area: Rect) {
    let width = area.width.min(MAX_WIDTH);
    let area = Rect::new(area.x + (area.width - width) / 2, area.y, width, area.height);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(FORM_HEIGHT), Constraint::Min(3)])
        .split(area);

    render_form(frame, state, chunks[0]);
    render_list(frame, state, chunks[1]);
}

fn render_form(frame: &mut Frame, state: &TaskManagerState, area: Rect) {
    let inner = render_panel(frame, area, "Task Manager", Color::Blue);
    if inner.height == 0 {
        return;
    }

    let title = state.title.display();
    render_input_line(
        frame,
        Rect::new(inner.x, inner.y, inner.width, 1),
        &InputLine {
            label: "Title",
            value: &title,
            placeholder: "Task Title",
            focused: state.focus == TaskFocus::Title,
        },
    );

    let description = state.description.display();
    render_input_line(
        frame,
        Rect::new(inner.x, inner.y + 1, inner.width, 1),
        &InputLine {
            label: "Description",
            value: &description,
            placeholder: "Task Description",
            focused: state.focus == TaskFocus::Description,
        },
    );

    let button_style = if state.in_flight {
        Style::default().fg(Color::Gray).bg(Color::DarkGray)
    } else {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    };
    let mut spans = vec![Span::styled(
        format!("[ {} ]", state.submit_label()),
        button_style,
    )];
    if let Some(message) = &state.message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Green),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)),
        Rect::new(inner.x, inner.y + 2, inner.width, 1),
    );

    let hints = [
        InputHint::new("Tab", "focus"),
        InputHint::new("Enter", "save/edit"),
        InputHint::new("d", "delete"),
        InputHint::new("^R", "refresh"),
        InputHint::new("^L", "logout"),
        InputHint::new("^C", "quit"),
    ];
    render_hints(frame, inner, &hints, Color::Blue);
}

fn render_list(frame: &mut Frame, state: &TaskManagerState, area: Rect) {
    let border_color = if state.focus == TaskFocus::List {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Tasks ({}) ", state.tasks.len()));

    if state.tasks.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                EMPTY_LIST,
                Style::default().fg(Color::Gray),
            )))
            .alignment(Alignment::Center)
            .block(block),
            area,
        );
        return;
    }

    let text_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = state
        .tasks
        .iter()
        .map(|task| {
            let title = sanitize_for_display(&task.title);
            let mut lines = vec![Line::from(Span::styled(
                truncate_with_ellipsis(&title, text_width),
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            if !task.description.is_empty() {
                let description = sanitize_for_display(&task.description);
                lines.push(Line::from(Span::styled(
                    truncate_with_ellipsis(&description, text_width),
                    Style::default().fg(Color::Gray),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let highlight = if state.focus == TaskFocus::List {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(block)
        .highlight_style(highlight)
        .highlight_symbol("▌ ");

    let mut list_state = ListState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}
