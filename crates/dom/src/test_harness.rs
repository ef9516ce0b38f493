//! Tree builders for tests and benchmarks.
//!
//! These panic on structural errors; they are only meant for fixtures.

use crate::{Document, NodeId};
use core_types::Rect;

pub fn element(doc: &mut Document, parent: NodeId, name: &str) -> NodeId {
    let node = doc.create_element(name);
    doc.append_child(parent, node)
        .unwrap_or_else(|err| panic!("append <{name}>: {err}"));
    node
}

pub fn text_input(doc: &mut Document, parent: NodeId) -> NodeId {
    input_of_type(doc, parent, "text")
}

pub fn number_input(doc: &mut Document, parent: NodeId) -> NodeId {
    input_of_type(doc, parent, "number")
}

pub fn input_of_type(doc: &mut Document, parent: NodeId, ty: &str) -> NodeId {
    let node = doc.create_element_with("input", &[("type", ty)]);
    doc.append_child(parent, node)
        .unwrap_or_else(|err| panic!("append <input type={ty}>: {err}"));
    node
}

pub fn textarea(doc: &mut Document, parent: NodeId) -> NodeId {
    element(doc, parent, "textarea")
}

/// Appends a custom element under `parent` and attaches its shadow root.
/// Returns `(host, shadow_root)`.
pub fn shadow_host(doc: &mut Document, parent: NodeId, name: &str) -> (NodeId, NodeId) {
    let host = element(doc, parent, name);
    let root = doc
        .attach_shadow(host)
        .unwrap_or_else(|err| panic!("attach shadow on <{name}>: {err}"));
    (host, root)
}

/// Builds `depth` nested shadow hosts below `parent` and returns the shadow
/// roots, outermost first.
pub fn shadow_chain(doc: &mut Document, parent: NodeId, depth: usize) -> Vec<NodeId> {
    let mut roots = Vec::with_capacity(depth);
    let mut cursor = parent;
    for level in 0..depth {
        let (_, root) = shadow_host(doc, cursor, &format!("x-level-{level}"));
        roots.push(root);
        cursor = root;
    }
    roots
}

pub fn place(doc: &mut Document, node: NodeId, rect: Rect) {
    doc.set_rect(node, rect)
        .unwrap_or_else(|err| panic!("set rect: {err}"));
}
