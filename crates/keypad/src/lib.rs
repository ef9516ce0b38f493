//! # keypad
//!
//! The embedded key-rendering widget. It knows nothing about documents or
//! focus: it renders the active layout mode into rows of keys, keeps an
//! accumulated text buffer, and reports every press as raw events.
//!
//! ```
//! use keypad::{KeyPad, KeyPadEvent, LayoutTable, Options};
//!
//! let layout = LayoutTable::new().with_mode("default", ["a b {bksp}"]);
//! let mut pad = KeyPad::new(Options::new(layout));
//! pad.set_input("b");
//! let events = pad.press("a");
//! assert_eq!(
//!     events,
//!     vec![
//!         KeyPadEvent::KeyPress("a".into()),
//!         KeyPadEvent::Change("ba".into()),
//!     ]
//! );
//! ```

mod buffer;
mod layout;
mod render;

pub use buffer::InputBuffer;
pub use layout::{ButtonTheme, DisplayMap, LayoutTable, is_function_token};
pub use render::{
    BUTTON_CLASS, FUNCTION_BUTTON_CLASS, RenderedKey, RenderedKeyboard, STANDARD_BUTTON_CLASS,
};

pub const DEFAULT_LAYOUT_NAME: &str = "default";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub layout: LayoutTable,
    pub layout_name: String,
    pub display: DisplayMap,
    pub theme: Vec<ButtonTheme>,
    /// `{enter}` types a newline instead of doing nothing.
    pub new_line_on_enter: bool,
    /// `{tab}` types a tab character instead of doing nothing.
    pub tab_char_on_tab: bool,
}

impl Options {
    pub fn new(layout: LayoutTable) -> Self {
        Self {
            layout,
            layout_name: DEFAULT_LAYOUT_NAME.to_string(),
            display: DisplayMap::new(),
            theme: Vec::new(),
            new_line_on_enter: false,
            tab_char_on_tab: true,
        }
    }
}

/// Partial update for [`KeyPad::set_options`]; `None` fields are left alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionsPatch {
    pub layout: Option<LayoutTable>,
    pub layout_name: Option<String>,
    pub display: Option<DisplayMap>,
    pub theme: Option<Vec<ButtonTheme>>,
    pub new_line_on_enter: Option<bool>,
    pub tab_char_on_tab: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyPadEvent {
    /// Raw token of the pressed key. Always reported first.
    KeyPress(String),
    /// Accumulated text after a press that changed it.
    Change(String),
}

pub struct KeyPad {
    options: Options,
    buffer: InputBuffer,
    rendered: RenderedKeyboard,
}

impl KeyPad {
    pub fn new(options: Options) -> Self {
        let mut pad = Self {
            options,
            buffer: InputBuffer::new(),
            rendered: RenderedKeyboard::default(),
        };
        pad.render();
        pad
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn rendered(&self) -> &RenderedKeyboard {
        &self.rendered
    }

    /// Re-renders the active layout mode with the current display map and theme.
    pub fn render(&mut self) -> &RenderedKeyboard {
        self.rendered = render::render_layout(
            &self.options.layout,
            &self.options.layout_name,
            &self.options.display,
            &self.options.theme,
        );
        &self.rendered
    }

    pub fn set_options(&mut self, patch: OptionsPatch) {
        let mut rerender = false;
        if let Some(layout) = patch.layout {
            self.options.layout = layout;
            rerender = true;
        }
        if let Some(name) = patch.layout_name {
            rerender |= self.options.layout_name != name;
            self.options.layout_name = name;
        }
        if let Some(display) = patch.display {
            self.options.display = display;
            rerender = true;
        }
        if let Some(theme) = patch.theme {
            rerender |= self.options.theme != theme;
            self.options.theme = theme;
        }
        if let Some(v) = patch.new_line_on_enter {
            self.options.new_line_on_enter = v;
        }
        if let Some(v) = patch.tab_char_on_tab {
            self.options.tab_char_on_tab = v;
        }
        if rerender {
            self.render();
        }
    }

    /// Replaces the accumulated text. Never reports a change.
    pub fn set_input(&mut self, text: &str) {
        self.buffer.set(text);
    }

    pub fn input(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn caret(&self) -> usize {
        self.buffer.caret()
    }

    /// Handles a key press and returns the raw events it produced.
    pub fn press(&mut self, token: &str) -> Vec<KeyPadEvent> {
        let mut events = vec![KeyPadEvent::KeyPress(token.to_string())];
        let before = self.buffer.revision();
        self.apply(token);
        if self.buffer.revision() != before {
            events.push(KeyPadEvent::Change(self.buffer.as_str().to_string()));
        }
        log::trace!(target: "keypad", "press {token:?} -> {:?}", self.buffer.as_str());
        events
    }

    fn apply(&mut self, token: &str) {
        match token {
            "{bksp}" => self.buffer.backspace(),
            "{delete}" => self.buffer.delete_forward(),
            "{space}" => self.buffer.insert(" "),
            "{tab}" if self.options.tab_char_on_tab => self.buffer.insert("\t"),
            "{enter}" if self.options.new_line_on_enter => self.buffer.insert("\n"),
            "{arrowleft}" => self.buffer.move_left(),
            "{arrowright}" => self.buffer.move_right(),
            t if is_function_token(t) => {}
            t => self.buffer.insert(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> KeyPad {
        let layout = LayoutTable::new()
            .with_mode("default", ["a b {bksp}", "{shift} {space} {enter}"])
            .with_mode("shift", ["A B {bksp}", "{shift} {space} {enter}"]);
        KeyPad::new(Options::new(layout))
    }

    #[test]
    fn function_keys_without_text_effect_report_no_change() {
        let mut pad = pad();
        assert_eq!(
            pad.press("{shift}"),
            vec![KeyPadEvent::KeyPress("{shift}".into())]
        );
        assert_eq!(
            pad.press("{enter}"),
            vec![KeyPadEvent::KeyPress("{enter}".into())]
        );
    }

    #[test]
    fn enter_types_newline_when_enabled() {
        let mut pad = pad();
        pad.set_options(OptionsPatch {
            new_line_on_enter: Some(true),
            ..OptionsPatch::default()
        });
        pad.press("a");
        let events = pad.press("{enter}");
        assert_eq!(events.last(), Some(&KeyPadEvent::Change("a\n".into())));
    }

    #[test]
    fn backspace_on_empty_reports_no_change() {
        let mut pad = pad();
        assert_eq!(pad.press("{bksp}").len(), 1);
    }

    #[test]
    fn set_input_then_type_appends_at_end() {
        let mut pad = pad();
        pad.set_input("hello");
        pad.press("{space}");
        let events = pad.press("b");
        assert_eq!(events[1], KeyPadEvent::Change("hello b".into()));
    }

    #[test]
    fn switching_layout_rerenders() {
        let mut pad = pad();
        assert_eq!(pad.rendered().labels(0), vec!["a", "b", "bksp"]);
        pad.set_options(OptionsPatch {
            layout_name: Some("shift".into()),
            ..OptionsPatch::default()
        });
        assert_eq!(pad.rendered().layout_name, "shift");
        assert_eq!(pad.rendered().labels(0), vec!["A", "B", "bksp"]);
    }
}
