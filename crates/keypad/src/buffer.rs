//! The widget's accumulated text and caret.
//!
//! All indices are UTF-8 byte offsets kept on char boundaries.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputBuffer {
    value: String,
    caret: usize,
    /// Incremented on every text change.
    revision: u64,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the text and puts the caret at the end.
    pub fn set(&mut self, value: &str) {
        if self.value != value {
            self.value.clear();
            self.value.push_str(value);
            self.revision = self.revision.wrapping_add(1);
        }
        self.caret = self.value.len();
    }

    pub fn insert(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let caret = clamp_to_char_boundary(&self.value, self.caret);
        self.value.insert_str(caret, s);
        self.caret = caret + s.len();
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn backspace(&mut self) {
        let caret = clamp_to_char_boundary(&self.value, self.caret);
        if caret == 0 {
            return;
        }
        let prev = prev_char_boundary(&self.value, caret);
        self.value.drain(prev..caret);
        self.caret = prev;
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn delete_forward(&mut self) {
        let caret = clamp_to_char_boundary(&self.value, self.caret);
        if caret >= self.value.len() {
            return;
        }
        let next = next_char_boundary(&self.value, caret);
        self.value.drain(caret..next);
        self.caret = caret;
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn move_left(&mut self) {
        self.caret = prev_char_boundary(&self.value, self.caret);
    }

    pub fn move_right(&mut self) {
        self.caret = next_char_boundary(&self.value, self.caret);
    }
}

fn clamp_to_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn prev_char_boundary(s: &str, i: usize) -> usize {
    let i = clamp_to_char_boundary(s, i);
    s[..i].char_indices().last().map(|(idx, _)| idx).unwrap_or(0)
}

fn next_char_boundary(s: &str, i: usize) -> usize {
    let i = clamp_to_char_boundary(s, i);
    s[i..]
        .chars()
        .next()
        .map(|ch| i + ch.len_utf8())
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backspace_removes_whole_multibyte_char() {
        let mut buf = InputBuffer::new();
        buf.set("a€");
        buf.backspace();
        assert_eq!(buf.as_str(), "a");
        assert_eq!(buf.caret(), 1);
    }

    #[test]
    fn insert_at_caret_after_moving_left() {
        let mut buf = InputBuffer::new();
        buf.set("ac");
        buf.move_left();
        buf.insert("b");
        assert_eq!(buf.as_str(), "abc");
        assert_eq!(buf.caret(), 2);
    }

    #[test]
    fn delete_forward_at_end_is_noop() {
        let mut buf = InputBuffer::new();
        buf.set("x");
        let rev = buf.revision();
        buf.delete_forward();
        assert_eq!(buf.as_str(), "x");
        assert_eq!(buf.revision(), rev);
    }

    #[test]
    fn setting_same_value_keeps_revision() {
        let mut buf = InputBuffer::new();
        buf.set("same");
        let rev = buf.revision();
        buf.set("same");
        assert_eq!(buf.revision(), rev);
    }
}
