//! Built-in layout tables for the key-rendering widget.

use keypad::{ButtonTheme, DisplayMap, LayoutTable};
use std::collections::BTreeMap;

/// Layout mode shown by the widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayoutKind {
    Default,
    Shift,
    Numeric,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 3] = [LayoutKind::Default, LayoutKind::Shift, LayoutKind::Numeric];

    /// Mode name in the layout table.
    pub fn mode_name(self) -> &'static str {
        match self {
            LayoutKind::Default => "default",
            LayoutKind::Shift => "shift",
            LayoutKind::Numeric => "numeric",
        }
    }

    pub fn from_mode_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.mode_name() == name)
    }
}

const DEFAULT_ROWS: [&str; 5] = [
    "` 1 2 3 4 5 6 7 8 9 0 - = {bksp}",
    "{tab} q w e r t y u i o p [ ] \\",
    "{lock} a s d f g h j k l ; ' {enter}",
    "{shift} z x c v b n m , . / {shift}",
    ".com @ {space} {hide}",
];

const SHIFT_ROWS: [&str; 5] = [
    "~ ! @ # $ % ^ & * ( ) _ + {bksp}",
    "{tab} Q W E R T Y U I O P { } |",
    "{lock} A S D F G H J K L : \" {enter}",
    "{shift} Z X C V B N M < > ? {shift}",
    ".com @ {space} {hide}",
];

const NUMERIC_ROWS: [&str; 5] = ["7 8 9", "4 5 6", "1 2 3", "- 0 .", "{bksp} {hide}"];

const DISPLAY: [(&str, &str); 7] = [
    ("{bksp}", "⌫"),
    ("{enter}", "↵"),
    ("{shift}", "⇧"),
    ("{lock}", "⇪"),
    ("{tab}", "⇥"),
    ("{space}", " "),
    ("{hide}", "▾"),
];

/// Everything the widget needs to render any [`LayoutKind`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutTables {
    pub table: LayoutTable,
    pub display: DisplayMap,
    pub themes: BTreeMap<LayoutKind, Vec<ButtonTheme>>,
}

impl LayoutTables {
    pub fn builtin() -> Self {
        let table = LayoutTable::new()
            .with_mode(LayoutKind::Default.mode_name(), DEFAULT_ROWS)
            .with_mode(LayoutKind::Shift.mode_name(), SHIFT_ROWS)
            .with_mode(LayoutKind::Numeric.mode_name(), NUMERIC_ROWS);

        let display = DISPLAY
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let text_theme = vec![
            ButtonTheme::new("hg-wide", "{bksp} {enter} {shift} {lock} {tab}"),
            ButtonTheme::new("hg-space", "{space}"),
            ButtonTheme::new("hg-hide", "{hide}"),
        ];
        let mut themes = BTreeMap::new();
        themes.insert(LayoutKind::Default, text_theme.clone());
        themes.insert(LayoutKind::Shift, text_theme);
        themes.insert(
            LayoutKind::Numeric,
            vec![
                ButtonTheme::new("hg-numpad", "7 8 9 4 5 6 1 2 3 - 0 ."),
                ButtonTheme::new("hg-hide", "{hide}"),
            ],
        );

        Self {
            table,
            display,
            themes,
        }
    }

    pub fn theme(&self, kind: LayoutKind) -> Vec<ButtonTheme> {
        self.themes.get(&kind).cloned().unwrap_or_default()
    }
}

impl Default for LayoutTables {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_every_kind() {
        let tables = LayoutTables::builtin();
        for kind in LayoutKind::ALL {
            assert!(
                !tables.table.tokens(kind.mode_name()).is_empty(),
                "{kind:?} has rows"
            );
            assert_eq!(LayoutKind::from_mode_name(kind.mode_name()), Some(kind));
        }
    }

    #[test]
    fn text_layouts_expose_shift_and_hide() {
        let tables = LayoutTables::builtin();
        for kind in [LayoutKind::Default, LayoutKind::Shift] {
            let tokens: Vec<&str> = tables
                .table
                .tokens(kind.mode_name())
                .into_iter()
                .flatten()
                .collect();
            assert!(tokens.contains(&"{shift}"));
            assert!(tokens.contains(&"{hide}"));
        }
    }
}
