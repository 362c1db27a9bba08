//! Auth form: email/password entry for sign-up and sign-in.

mod render;
mod state;
mod update;

pub use render::render_auth_form;
pub use state::{AuthField, AuthFormState, AuthMode};
pub use update::{
    CONFIRM_EMAIL, MISSING_CREDENTIALS, SIGNED_IN, handle_event, handle_key, submit, toggle_mode,
};
