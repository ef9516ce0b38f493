use crate::mutation::{MutationRecord, Observers};
use crate::render::StyleCommits;
use crate::types::{ElementData, NodeKind, NodeRecord};
use crate::{DomError, NodeId};
use core_types::Rect;
use std::sync::Arc;

/// A live, mutable host document.
///
/// Nodes live in an arena for the lifetime of the document; removal only
/// detaches a subtree, so ids held by observers and listeners stay valid.
pub struct Document {
    nodes: Vec<NodeRecord>,
    root: NodeId,
    body: NodeId,
    pub(crate) observers: Observers,
    pub(crate) styles: StyleCommits,
}

impl Document {
    /// A document with `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::INVALID,
            body: NodeId::INVALID,
            observers: Observers::default(),
            styles: StyleCommits::default(),
        };
        let root = doc.alloc(NodeKind::Document);
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        doc.link(root, html, None);
        doc.link(html, body, None);
        doc.root = root;
        doc.body = body;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id != NodeId::INVALID && (id.0 as usize) <= self.nodes.len()
    }

    pub(crate) fn record(&self, id: NodeId) -> Result<&NodeRecord, DomError> {
        if !self.contains(id) {
            return Err(DomError::UnknownNode(id));
        }
        Ok(&self.nodes[id.0 as usize - 1])
    }

    pub(crate) fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, DomError> {
        if !self.contains(id) {
            return Err(DomError::UnknownNode(id));
        }
        Ok(&mut self.nodes[id.0 as usize - 1])
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeRecord::new(kind));
        NodeId(self.nodes.len() as u32)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.record(id).ok().map(|r| &r.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id)? {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.record_mut(id)?.kind {
            NodeKind::Element(data) => Ok(data),
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| &*e.name)
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(name)))
    }

    pub fn create_element_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(name);
        for (k, v) in attributes {
            data.attributes
                .push((Arc::from(k.to_ascii_lowercase()), Some((*v).to_string())));
        }
        self.alloc(NodeKind::Element(data))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text {
            text: text.to_string(),
        })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).ok().and_then(|r| r.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.record(id).map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.record(host).ok().and_then(|r| r.shadow_root)
    }

    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        match self.kind(root)? {
            NodeKind::ShadowRoot { host } => Some(*host),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // Tree mutation
    // ---------------------------------------------------------------------

    /// Appends `child`, moving it first if it already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.link(parent, child, None);
        self.queue_record(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        if self.parent(before) != Some(parent) || before == child {
            return Err(DomError::InvalidSibling { parent, before });
        }
        self.detach(child)?;
        self.link(parent, child, Some(before));
        self.queue_record(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Detaches `node` from its parent. A node without a parent is left alone.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.record(node)?;
        self.detach(node)
    }

    /// Creates the isolated subtree owned by `host`.
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        if !self.is_element(host) {
            return Err(DomError::WrongNodeKind(host));
        }
        if self.shadow_root(host).is_some() {
            return Err(DomError::ShadowAlreadyAttached(host));
        }
        let root = self.alloc(NodeKind::ShadowRoot { host });
        self.record_mut(host)?.shadow_root = Some(root);
        self.queue_record(MutationRecord::ShadowAttached { host, root });
        Ok(root)
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_record = self.record(parent)?;
        let child_record = self.record(child)?;
        if !parent_record.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        if matches!(
            child_record.kind,
            NodeKind::Document | NodeKind::ShadowRoot { .. }
        ) {
            return Err(DomError::WrongNodeKind(child));
        }
        if parent == child || self.composed_ancestors(parent).contains(&child) {
            return Err(DomError::CycleDetected { parent, child });
        }
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.record_mut(node)?.parent.take() else {
            return Ok(());
        };
        self.record_mut(parent)?.children.retain(|c| *c != node);
        self.queue_record(MutationRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![node],
        });
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        let index = parent.0 as usize - 1;
        let siblings = &mut self.nodes[index].children;
        let pos = before
            .and_then(|b| siblings.iter().position(|c| *c == b))
            .unwrap_or(siblings.len());
        siblings.insert(pos, child);
        self.nodes[child.0 as usize - 1].parent = Some(parent);
    }

    // ---------------------------------------------------------------------
    // Attributes and classes
    // ---------------------------------------------------------------------

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attribute(name))
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        let data = self.element_mut(id)?;
        let value = value.map(str::to_string);
        let old_value = match data
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => Some(std::mem::replace(slot, value).unwrap_or_default()),
            None => {
                data.attributes
                    .push((Arc::from(name.to_ascii_lowercase()), value));
                None
            }
        };
        self.queue_record(MutationRecord::Attribute {
            target: id,
            name: Arc::from(name.to_ascii_lowercase()),
            old_value,
        });
        Ok(())
    }

    /// Returns `true` if the attribute was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let data = self.element_mut(id)?;
        let Some(pos) = data
            .attributes
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
        else {
            return Ok(false);
        };
        let (key, old) = data.attributes.remove(pos);
        self.queue_record(MutationRecord::Attribute {
            target: id,
            name: key,
            old_value: Some(old.unwrap_or_default()),
        });
        Ok(true)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|v| v.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if the class was added.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<bool, DomError> {
        if !self.is_element(id) {
            return Err(DomError::WrongNodeKind(id));
        }
        if self.has_class(id, class) {
            return Ok(false);
        }
        let mut list: Vec<String> = self.classes(id).into_iter().map(str::to_string).collect();
        list.push(class.to_string());
        self.set_attribute(id, "class", Some(&list.join(" ")))?;
        Ok(true)
    }

    /// Returns `true` if the class was present.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<bool, DomError> {
        if !self.is_element(id) {
            return Err(DomError::WrongNodeKind(id));
        }
        if !self.has_class(id, class) {
            return Ok(false);
        }
        let list: Vec<String> = self
            .classes(id)
            .into_iter()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        self.set_attribute(id, "class", Some(&list.join(" ")))?;
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Inline style, value, geometry
    // ---------------------------------------------------------------------

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.element(id)?
            .style
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let data = self.element_mut(id)?;
        match data
            .style
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
        {
            Some((_, v)) => *v = value.to_string(),
            None => data
                .style
                .push((property.to_ascii_lowercase(), value.to_string())),
        }
        Ok(())
    }

    /// `display` is anything but `none`.
    pub fn is_displayed(&self, id: NodeId) -> bool {
        self.is_element(id) && self.style(id, "display") != Some("none")
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.value.as_str())
    }

    /// Sets the `.value` property. Fires nothing; callers dispatch notifications.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        let data = self.element_mut(id)?;
        data.value.clear();
        data.value.push_str(value);
        Ok(())
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.element(id).map(|e| e.rect)
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> Result<(), DomError> {
        self.element_mut(id)?.rect = rect;
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
