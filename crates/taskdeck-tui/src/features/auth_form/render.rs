//! Auth form view.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use super::state::{AuthField, AuthFormState};
use crate::common::panel::{
    InputHint, InputLine, centered_area, render_hints, render_input_line, render_panel,
    render_separator,
};

const PANEL_WIDTH: u16 = 56;
const PANEL_HEIGHT: u16 = 12;

/// Renders the sign-up/sign-in panel centered in `area`.
pub fn render_auth_form(frame: &mut Frame, state: &AuthFormState, area: Rect) {
    let panel = centered_area(area, PANEL_WIDTH, PANEL_HEIGHT);
    let inner = render_panel(frame, panel, state.mode.title(), Color::Blue);
    if inner.height < 2 {
        return;
    }

    let email = state.email.display();
    render_input_line(
        frame,
        Rect::new(inner.x, inner.y + 1, inner.width, 1),
        &InputLine {
            label: "Email",
            value: &email,
            placeholder: "Email",
            focused: state.focus == AuthField::Email,
        },
    );

    let password = state.password.display();
    render_input_line(
        frame,
        Rect::new(inner.x, inner.y + 2, inner.width, 1),
        &InputLine {
            label: "Password",
            value: &password,
            placeholder: "Password",
            focused: state.focus == AuthField::Password,
        },
    );

    let button = Line::from(Span::styled(
        format!("[ {} ]", state.mode.title()),
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(
        Paragraph::new(button),
        Rect::new(inner.x, inner.y + 4, inner.width, 1),
    );

    render_separator(frame, inner, 5);

    if let Some(message) = &state.message {
        let message_area = Rect::new(inner.x, inner.y + 6, inner.width, 2);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(Color::Green),
            )))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
            message_area,
        );
    }

    let hints = [
        InputHint::new("Enter", state.mode.title()),
        InputHint::new("Tab", "next field"),
        InputHint::new("Ctrl+T", state.mode.switch_label()),
        InputHint::new("Esc", "quit"),
    ];
    render_hints(frame, inner, &hints, Color::Blue);
}
