//! Thin wrapper around the key-rendering widget.
//!
//! Translates widget events into keyboard semantics: text changes go to the
//! bound input, `{shift}` / `{lock}` swap the text layout, `{hide}` dismisses.

use crate::layouts::{LayoutKind, LayoutTables};
use crate::policy::LayoutFamily;
use keypad::{KeyPad, KeyPadEvent, Options, OptionsPatch, RenderedKeyboard};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FacadeEvent {
    /// New text for the bound input.
    Change(String),
    /// The text layout flipped between default and shift.
    ShiftToggled,
    /// The user asked to dismiss the keyboard.
    Hide,
}

pub struct KeyboardFacade {
    pad: KeyPad,
    tables: LayoutTables,
    family: LayoutFamily,
    shift: bool,
}

impl KeyboardFacade {
    pub fn new(tables: LayoutTables) -> Self {
        let mut options = Options::new(tables.table.clone());
        options.layout_name = LayoutKind::Default.mode_name().to_string();
        options.display = tables.display.clone();
        options.theme = tables.theme(LayoutKind::Default);
        Self {
            pad: KeyPad::new(options),
            tables,
            family: LayoutFamily::Default,
            shift: false,
        }
    }

    /// Layout mode currently rendered.
    pub fn layout(&self) -> LayoutKind {
        match (self.family, self.shift) {
            (LayoutFamily::Numeric, _) => LayoutKind::Numeric,
            (LayoutFamily::Default, false) => LayoutKind::Default,
            (LayoutFamily::Default, true) => LayoutKind::Shift,
        }
    }

    pub fn family(&self) -> LayoutFamily {
        self.family
    }

    pub fn is_shifted(&self) -> bool {
        self.shift
    }

    /// Switches to the family chosen by placement; shift survives the switch.
    pub fn set_family(&mut self, family: LayoutFamily) {
        if self.family == family {
            return;
        }
        self.family = family;
        self.sync_layout();
    }

    /// Renders `kind` directly. Visibility is untouched.
    pub fn set_layout(&mut self, kind: LayoutKind) {
        let (family, shift) = match kind {
            LayoutKind::Default => (LayoutFamily::Default, false),
            LayoutKind::Shift => (LayoutFamily::Default, true),
            LayoutKind::Numeric => (LayoutFamily::Numeric, self.shift),
        };
        if (family, shift) == (self.family, self.shift) {
            return;
        }
        self.family = family;
        self.shift = shift;
        self.sync_layout();
    }

    /// Replaces the widget text. Does not produce a [`FacadeEvent::Change`].
    pub fn set_text(&mut self, text: &str) {
        self.pad.set_input(text);
    }

    pub fn text(&self) -> &str {
        self.pad.input()
    }

    /// `{enter}` types a newline only for multi-line inputs.
    pub fn set_multiline(&mut self, multiline: bool) {
        self.pad.set_options(OptionsPatch {
            new_line_on_enter: Some(multiline),
            ..OptionsPatch::default()
        });
    }

    pub fn rendered(&self) -> &RenderedKeyboard {
        self.pad.rendered()
    }

    pub fn press(&mut self, token: &str) -> Vec<FacadeEvent> {
        let mut out = Vec::new();
        for event in self.pad.press(token) {
            match event {
                KeyPadEvent::KeyPress(key) => match key.as_str() {
                    "{shift}" | "{lock}" => {
                        self.shift = !self.shift;
                        self.sync_layout();
                        out.push(FacadeEvent::ShiftToggled);
                    }
                    "{hide}" => out.push(FacadeEvent::Hide),
                    _ => {}
                },
                KeyPadEvent::Change(text) => out.push(FacadeEvent::Change(text)),
            }
        }
        out
    }

    fn sync_layout(&mut self) {
        let kind = self.layout();
        log::debug!(target: "keyboard.facade", "layout -> {}", kind.mode_name());
        self.pad.set_options(OptionsPatch {
            layout_name: Some(kind.mode_name().to_string()),
            theme: Some(self.tables.theme(kind)),
            ..OptionsPatch::default()
        });
    }
}
