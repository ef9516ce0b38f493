use crate::layout::{ButtonTheme, DisplayMap, LayoutTable, is_function_token};

pub const BUTTON_CLASS: &str = "hg-button";
pub const FUNCTION_BUTTON_CLASS: &str = "hg-functionBtn";
pub const STANDARD_BUTTON_CLASS: &str = "hg-standardBtn";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedKey {
    pub token: String,
    pub label: String,
    pub classes: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedKeyboard {
    pub layout_name: String,
    pub rows: Vec<Vec<RenderedKey>>,
}

impl RenderedKeyboard {
    pub fn key(&self, token: &str) -> Option<&RenderedKey> {
        self.rows.iter().flatten().find(|k| k.token == token)
    }

    pub fn key_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn labels(&self, row: usize) -> Vec<&str> {
        self.rows
            .get(row)
            .map(|keys| keys.iter().map(|k| k.label.as_str()).collect())
            .unwrap_or_default()
    }
}

pub(crate) fn render_layout(
    layout: &LayoutTable,
    layout_name: &str,
    display: &DisplayMap,
    theme: &[ButtonTheme],
) -> RenderedKeyboard {
    let tokens = layout.tokens(layout_name);
    if tokens.is_empty() {
        log::warn!(target: "keypad", "layout {layout_name:?} has no rows");
    }
    let rows = tokens
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|token| render_key(token, display, theme))
                .collect()
        })
        .collect();
    RenderedKeyboard {
        layout_name: layout_name.to_string(),
        rows,
    }
}

fn render_key(token: &str, display: &DisplayMap, theme: &[ButtonTheme]) -> RenderedKey {
    let label = match display.get(token) {
        Some(label) => label.clone(),
        None if is_function_token(token) => token[1..token.len() - 1].to_string(),
        None => token.to_string(),
    };
    let mut classes = vec![BUTTON_CLASS.to_string()];
    classes.push(if is_function_token(token) {
        FUNCTION_BUTTON_CLASS.to_string()
    } else {
        STANDARD_BUTTON_CLASS.to_string()
    });
    classes.extend(
        theme
            .iter()
            .filter(|t| t.applies_to(token))
            .map(|t| t.class.clone()),
    );
    RenderedKey {
        token: token.to_string(),
        label,
        classes,
    }
}
