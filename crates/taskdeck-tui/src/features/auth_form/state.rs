//! Auth form state.

use crate::common::TextField;

/// Which remote call the form submits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    SignUp,
    SignIn,
}

impl AuthMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::SignUp => AuthMode::SignIn,
            AuthMode::SignIn => AuthMode::SignUp,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AuthMode::SignUp => "Sign Up",
            AuthMode::SignIn => "Sign In",
        }
    }

    /// Label of the toggle action.
    pub fn switch_label(self) -> &'static str {
        match self {
            AuthMode::SignUp => "Switch to Sign In",
            AuthMode::SignIn => "Switch to Sign Up",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFormState {
    pub email: TextField,
    pub password: TextField,
    pub mode: AuthMode,
    pub message: Option<String>,
    pub focus: AuthField,
}

impl Default for AuthFormState {
    fn default() -> Self {
        Self {
            email: TextField::default(),
            password: TextField::masked(),
            mode: AuthMode::default(),
            message: None,
            focus: AuthField::default(),
        }
    }
}

impl AuthFormState {
    pub fn focused_field_mut(&mut self) -> &mut TextField {
        match self.focus {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            AuthField::Email => AuthField::Password,
            AuthField::Password => AuthField::Email,
        };
    }
}
