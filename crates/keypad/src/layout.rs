//! Layout tables, display labels and button themes.

use std::collections::BTreeMap;

/// Mode name -> rows of space-separated key tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutTable {
    modes: BTreeMap<String, Vec<String>>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode<I, S>(mut self, name: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, rows);
        self
    }

    pub fn insert<I, S>(&mut self, name: &str, rows: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modes
            .insert(name.to_string(), rows.into_iter().map(Into::into).collect());
    }

    pub fn rows(&self, name: &str) -> Option<&[String]> {
        self.modes.get(name).map(Vec::as_slice)
    }

    pub fn mode_names(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    /// Tokens of every row of `name`, split on whitespace.
    pub fn tokens(&self, name: &str) -> Vec<Vec<&str>> {
        self.rows(name)
            .map(|rows| {
                rows.iter()
                    .map(|row| row.split_whitespace().collect())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Label overrides for non-printing keys, e.g. `{bksp}` -> `⌫`.
pub type DisplayMap = BTreeMap<String, String>;

/// Extra class applied to a set of keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonTheme {
    pub class: String,
    /// Space-separated tokens this class applies to.
    pub buttons: String,
}

impl ButtonTheme {
    pub fn new(class: &str, buttons: &str) -> Self {
        Self {
            class: class.to_string(),
            buttons: buttons.to_string(),
        }
    }

    pub fn applies_to(&self, token: &str) -> bool {
        self.buttons.split_whitespace().any(|t| t == token)
    }
}

/// `{name}` tokens are function keys; everything else types itself.
pub fn is_function_token(token: &str) -> bool {
    token.len() > 2 && token.starts_with('{') && token.ends_with('}')
}
