use crate::{Document, NodeId, NodeKind};
use std::fmt::Write;

/// Indented outline of the composed tree below `root`, one node per line.
///
/// Elements show their classes and a non-empty `.value`; shadow roots appear
/// as `#shadow-root` directly under their host.
pub fn outline(doc: &Document, root: NodeId) -> Vec<String> {
    const INDENT_STEP: &str = "  ";

    fn walk(doc: &Document, node: NodeId, depth: usize, out: &mut Vec<String>) {
        let mut line = INDENT_STEP.repeat(depth);
        match doc.kind(node) {
            Some(NodeKind::Document) => line.push_str("#document"),
            Some(NodeKind::ShadowRoot { .. }) => line.push_str("#shadow-root"),
            Some(NodeKind::Text { text }) => {
                let _ = write!(&mut line, "\"{}\"", text.trim());
            }
            Some(NodeKind::Element(data)) => {
                let _ = write!(&mut line, "<{}", data.name);
                let classes = doc.classes(node);
                if !classes.is_empty() {
                    let _ = write!(&mut line, " .{}", classes.join("."));
                }
                if !data.value.is_empty() {
                    let _ = write!(&mut line, " value={:?}", data.value);
                }
                line.push('>');
            }
            None => return,
        }
        out.push(line);

        if let Some(shadow) = doc.shadow_root(node) {
            walk(doc, shadow, depth + 1, out);
        }
        for &child in doc.children(node) {
            walk(doc, child, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(doc, root, 0, &mut out);
    out
}
