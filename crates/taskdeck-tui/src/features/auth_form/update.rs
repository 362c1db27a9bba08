//! Auth form reducer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::{AuthFormState, AuthMode};
use crate::effects::UiEffect;
use crate::events::AuthUiEvent;

pub const MISSING_CREDENTIALS: &str = "Please enter email and password";
pub const CONFIRM_EMAIL: &str = "Check your email to confirm sign up!";
pub const SIGNED_IN: &str = "Signed in successfully";

/// Handles a key while the auth form is shown.
pub fn handle_key(state: &mut AuthFormState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => vec![UiEffect::Quit],
        KeyCode::Enter => submit(state),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            state.toggle_focus();
            vec![]
        }
        KeyCode::Char('t') if ctrl => {
            toggle_mode(state);
            vec![]
        }
        _ => {
            state.focused_field_mut().handle_key(key);
            vec![]
        }
    }
}

/// Validates the fields and issues exactly one sign-up or sign-in call.
pub fn submit(state: &mut AuthFormState) -> Vec<UiEffect> {
    state.message = None;
    if state.email.is_empty() || state.password.is_empty() {
        state.message = Some(MISSING_CREDENTIALS.to_string());
        return vec![];
    }

    let email = state.email.value().to_string();
    let password = state.password.value().to_string();
    match state.mode {
        AuthMode::SignUp => vec![UiEffect::SignUp { email, password }],
        AuthMode::SignIn => vec![UiEffect::SignIn { email, password }],
    }
}

/// Flips sign-up/sign-in and clears the message. Typed fields are kept.
pub fn toggle_mode(state: &mut AuthFormState) {
    state.mode = state.mode.toggled();
    state.message = None;
}

/// Shows the outcome of a sign-up or sign-in call.
///
/// A successful sign-in also produces an auth notification; the view switch
/// comes from that, not from here.
pub fn handle_event(state: &mut AuthFormState, event: AuthUiEvent) {
    let message = match event {
        AuthUiEvent::SignUpFinished(Ok(())) => CONFIRM_EMAIL.to_string(),
        AuthUiEvent::SignInFinished(Ok(())) => SIGNED_IN.to_string(),
        AuthUiEvent::SignUpFinished(Err(e)) | AuthUiEvent::SignInFinished(Err(e)) => e,
    };
    state.message = Some(message);
}
