//! Single-line text input used by both forms.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Editable single-line text value. Edits happen at the end of the line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    /// Render as bullets (passwords).
    pub masked: bool,
}

impl TextField {
    pub fn masked() -> Self {
        Self {
            value: String::new(),
            masked: true,
        }
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            masked: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Inserts pasted text, dropping line breaks.
    pub fn paste(&mut self, text: &str) {
        self.value
            .extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
    }

    /// Text to draw: bullets when masked.
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// Applies an editing key. Returns false if the key is not an edit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Backspace if ctrl || key.modifiers.contains(KeyModifiers::ALT) => {
                self.delete_word();
                true
            }
            KeyCode::Backspace => {
                self.value.pop();
                true
            }
            KeyCode::Char('u') if ctrl => {
                self.value.clear();
                true
            }
            KeyCode::Char('w') if ctrl => {
                self.delete_word();
                true
            }
            KeyCode::Char(c) if !ctrl => {
                self.value.push(c);
                true
            }
            _ => false,
        }
    }

    fn delete_word(&mut self) {
        let trimmed = self.value.trim_end();
        let cut = trimmed
            .rfind(char::is_whitespace)
            .map_or(0, |idx| idx + 1);
        self.value.truncate(cut);
    }
}
