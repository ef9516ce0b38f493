//! Which elements get the keyboard.

use dom::{Document, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Multi-line text area.
    TextArea,
    /// Single-line text field.
    Text,
    /// Numeric field.
    Number,
}

impl InputKind {
    pub fn is_numeric(self) -> bool {
        self == InputKind::Number
    }

    pub fn is_multiline(self) -> bool {
        self == InputKind::TextArea
    }
}

/// Classifies `node`; `None` for anything the keyboard ignores.
pub fn classify(doc: &Document, node: NodeId) -> Option<InputKind> {
    let name = doc.tag_name(node)?;
    if name.eq_ignore_ascii_case("textarea") {
        return Some(InputKind::TextArea);
    }
    if !name.eq_ignore_ascii_case("input") {
        return None;
    }

    let ty = doc
        .attribute(node, "type")
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match ty {
        None => Some(InputKind::Text), // missing type defaults to text
        Some(t) if t.eq_ignore_ascii_case("text") => Some(InputKind::Text),
        Some(t) if t.eq_ignore_ascii_case("number") => Some(InputKind::Number),
        _ => None,
    }
}

/// Eligible inputs among `root` and everything below it, shadow trees included.
pub fn eligible_in(doc: &Document, root: NodeId) -> Vec<(NodeId, InputKind)> {
    std::iter::once(root)
        .chain(doc.composed_descendants(root))
        .filter_map(|n| classify(doc, n).map(|kind| (n, kind)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::test_harness::{element, input_of_type, shadow_host, textarea};

    #[test]
    fn classifies_text_number_and_textarea() {
        let mut doc = Document::new();
        let body = doc.body();
        let text = input_of_type(&mut doc, body, "TEXT");
        let number = input_of_type(&mut doc, body, "number");
        let area = textarea(&mut doc, body);
        let untyped = element(&mut doc, body, "input");
        let checkbox = input_of_type(&mut doc, body, "checkbox");
        let div = element(&mut doc, body, "div");

        assert_eq!(classify(&doc, text), Some(InputKind::Text));
        assert_eq!(classify(&doc, number), Some(InputKind::Number));
        assert_eq!(classify(&doc, area), Some(InputKind::TextArea));
        assert_eq!(classify(&doc, untyped), Some(InputKind::Text));
        assert_eq!(classify(&doc, checkbox), None);
        assert_eq!(classify(&doc, div), None);
    }

    #[test]
    fn eligible_in_walks_shadow_trees() {
        let mut doc = Document::new();
        let body = doc.body();
        let (host, root) = shadow_host(&mut doc, body, "x-form");
        let inner = input_of_type(&mut doc, root, "number");
        let outer = textarea(&mut doc, body);

        assert_eq!(eligible_in(&doc, host), vec![(inner, InputKind::Number)]);
        let all: Vec<NodeId> = eligible_in(&doc, body).into_iter().map(|(n, _)| n).collect();
        assert_eq!(all, vec![inner, outer]);
    }
}
