//! Single-line editable text used by every form field and the list filter.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Colour fields hold exactly this many hex digits.
pub const HEX_LEN: usize = 6;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TextInput {
    value: String,
    /// Cursor position in chars, `0..=len`.
    cursor: usize,
    max_len: usize,
    hex_only: bool,
    placeholder: &'static str,
}

impl TextInput {
    pub fn new(value: &str, max_len: usize) -> Self {
        let value: String = value.chars().take(max_len).collect();
        let cursor = value.chars().count();
        Self {
            value,
            cursor,
            max_len,
            hex_only: false,
            placeholder: "",
        }
    }

    /// A colour field: hex digits only, upper-cased, at most six.
    pub fn hex(value: &str) -> Self {
        let cleaned: String = value
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        Self {
            hex_only: true,
            ..Self::new(&cleaned, HEX_LEN)
        }
    }

    pub fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn set_value(&mut self, value: &str) {
        let replacement = if self.hex_only {
            Self::hex(value)
        } else {
            Self::new(value, self.max_len)
        };
        *self = replacement.with_placeholder(self.placeholder);
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Applies an editing key. Returns false when the key is not an editing key.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(ch)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                self.insert(ch);
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            _ => return false,
        }
        true
    }

    fn insert(&mut self, ch: char) {
        let ch = if self.hex_only {
            if !ch.is_ascii_hexdigit() {
                return;
            }
            ch.to_ascii_uppercase()
        } else {
            ch
        };
        if self.len() >= self.max_len {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.value.len())
    }
}
