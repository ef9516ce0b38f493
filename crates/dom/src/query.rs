//! Tree-scoped and composed traversal.
//!
//! Plain walks stay inside one tree and never enter a shadow root.
//! "Composed" walks descend into every shadow root.

use crate::{Document, NodeId, NodeKind};

impl Document {
    /// Parent, or the host when `id` is a shadow root.
    pub fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).or_else(|| self.shadow_host(id))
    }

    /// Ancestors across shadow boundaries, nearest first, excluding `id`.
    pub fn composed_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.composed_parent(id);
        while let Some(node) = cursor {
            out.push(node);
            cursor = self.composed_parent(node);
        }
        out
    }

    /// Attached to the document, possibly through shadow hosts.
    pub fn is_connected(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let top = self.composed_ancestors(id).last().copied().unwrap_or(id);
        top == self.root()
    }

    /// Descendants of `root` in tree order, excluding `root`, not entering shadow roots.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Every node below `root`, including shadow roots and their contents.
    /// A shadow root is visited right after its host, before the host's light children.
    pub fn composed_descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        push_composed_children(self, root, &mut stack);
        while let Some(node) = stack.pop() {
            out.push(node);
            push_composed_children(self, node, &mut stack);
        }
        out
    }

    pub fn is_shadow_root(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::ShadowRoot { .. }))
    }
}

fn push_composed_children(doc: &Document, node: NodeId, stack: &mut Vec<NodeId>) {
    stack.extend(doc.children(node).iter().rev().copied());
    if let Some(shadow) = doc.shadow_root(node) {
        stack.push(shadow);
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn tree_scoped_vs_composed_walks() {
        let mut doc = Document::new();
        let body = doc.body();
        let host = doc.create_element("x-host");
        let sibling = doc.create_element("p");
        doc.append_child(body, host).unwrap();
        doc.append_child(body, sibling).unwrap();
        let root = doc.attach_shadow(host).unwrap();
        let inner = doc.create_element("input");
        doc.append_child(root, inner).unwrap();

        assert_eq!(doc.descendants(body), vec![host, sibling]);
        assert_eq!(doc.composed_descendants(body), vec![host, root, inner, sibling]);
        assert_eq!(doc.composed_ancestors(inner)[..2], [root, host]);
        assert!(doc.is_connected(inner));

        doc.remove(host).unwrap();
        assert!(!doc.is_connected(inner));
    }
}
