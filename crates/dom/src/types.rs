use core_types::Rect;
use std::sync::Arc;

/// Stable identity of a node for the lifetime of its document.
///
/// Ids are never reused; a node detached from the tree keeps its id and may be
/// re-inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Reserved sentinel, never handed out by a document.
    pub const INVALID: NodeId = NodeId(0);
}

#[derive(Debug)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    /// Root of an isolated subtree owned by `host`.
    ShadowRoot {
        host: NodeId,
    },
    Text {
        text: String,
    },
}

#[derive(Debug)]
pub struct ElementData {
    pub name: Arc<str>,
    pub attributes: Vec<(Arc<str>, Option<String>)>,
    /// Inline style declarations, in insertion order.
    pub style: Vec<(String, String)>,
    /// The `.value` property of form controls. Independent of the `value` attribute.
    pub value: String,
    /// Border box as last reported by the host's layout.
    pub rect: Rect,
}

impl ElementData {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes: Vec::new(),
            style: Vec::new(),
            value: String::new(),
            rect: Rect::ZERO,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }
}

pub(crate) struct NodeRecord {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) shadow_root: Option<NodeId>,
    pub(crate) listeners: Vec<(crate::EventType, crate::ListenerId)>,
}

impl NodeRecord {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
            listeners: Vec::new(),
        }
    }

    pub(crate) fn allows_children(&self) -> bool {
        !matches!(self.kind, NodeKind::Text { .. })
    }
}
