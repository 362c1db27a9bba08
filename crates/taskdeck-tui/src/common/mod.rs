//! Shared TUI building blocks.

pub mod field;
pub mod panel;
pub mod text;

pub use field::TextField;
pub use text::{sanitize_for_display, truncate_start_with_ellipsis, truncate_with_ellipsis};
