//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui Frame, and never
//! mutate state or return effects.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use taskdeck_core::ChannelStatus;

use crate::auth_form::render_auth_form;
use crate::common::truncate_start_with_ellipsis;
use crate::state::{AppState, Screen};
use crate::tasks::render_task_manager;

/// Height of the status line above the screen.
const STATUS_HEIGHT: u16 = 1;

pub const CHECKING_SESSION: &str = "Checking session...";

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(STATUS_HEIGHT), Constraint::Min(1)])
        .split(frame.area());

    render_status_line(app, frame, chunks[0]);

    if !app.session_checked {
        frame.render_widget(
            Paragraph::new(Span::styled(
                CHECKING_SESSION,
                Style::default().fg(Color::Gray),
            ))
            .centered(),
            chunks[1],
        );
        return;
    }

    match &app.screen {
        Screen::Auth(form) => render_auth_form(frame, form, chunks[1]),
        Screen::Tasks(tasks) => render_task_manager(frame, tasks, chunks[1]),
    }
}

fn render_status_line(app: &AppState, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        " taskdeck ",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(session) = &app.session {
        let email = truncate_start_with_ellipsis(session.email(), (area.width / 2) as usize);
        spans.push(Span::raw(" "));
        spans.push(Span::styled(email, Style::default().fg(Color::White)));
    }

    if let Some(status) = app.tasks().and_then(|t| t.channel_status.as_ref()) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("realtime: {status}"),
            Style::default().fg(status_color(status)),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn status_color(status: &ChannelStatus) -> Color {
    match status {
        ChannelStatus::Subscribed => Color::Green,
        ChannelStatus::Closed => Color::DarkGray,
        ChannelStatus::TimedOut | ChannelStatus::ChannelError(_) => Color::Red,
    }
}
