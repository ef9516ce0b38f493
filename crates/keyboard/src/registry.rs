//! Input binding registry.
//!
//! Every registered input carries the marker class and one focus listener
//! ([`WATCH_FOCUS`]). Only the active input also carries the blur and value
//! listeners, so at most one input is bound at any time. Binding a new input
//! always detaches the previous one first.

use crate::eligible::{self, InputKind};
use crate::facade::KeyboardFacade;
use dom::{Document, DomError, Event, EventType, ListenerId, NodeId};
use std::collections::BTreeSet;

pub const WATCH_FOCUS: ListenerId = ListenerId(0x6b62_0001);
pub const BOUND_BLUR: ListenerId = ListenerId(0x6b62_0002);
pub const BOUND_INPUT: ListenerId = ListenerId(0x6b62_0003);

/// Focus transitions the registry reports to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingSignal {
    FocusGained(NodeId),
    FocusLost,
}

pub struct BindingRegistry {
    marker: String,
    registered: BTreeSet<NodeId>,
    active: Option<NodeId>,
    has_focus: bool,
}

impl BindingRegistry {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            registered: BTreeSet::new(),
            active: None,
            has_focus: false,
        }
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn is_registered(&self, node: NodeId) -> bool {
        self.registered.contains(&node)
    }

    pub fn registered(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.registered.iter().copied()
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    /// Marks `node` and attaches its focus listener. Returns `false` if the
    /// marker was already present.
    pub fn register(&mut self, doc: &mut Document, node: NodeId) -> Result<bool, DomError> {
        if doc.has_class(node, &self.marker) {
            return Ok(false);
        }
        doc.add_class(node, &self.marker)?;
        doc.add_event_listener(node, EventType::Focus, WATCH_FOCUS)?;
        self.registered.insert(node);
        log::debug!(target: "keyboard.registry", "registered input {}", node.0);
        Ok(true)
    }

    /// Records the active input. `Some` attaches the blur and value listeners
    /// to `node` without touching the previous one; `None` clears the active
    /// reference and reports focus lost.
    pub fn set_input(
        &mut self,
        doc: &mut Document,
        node: Option<NodeId>,
    ) -> Result<Option<BindingSignal>, DomError> {
        match node {
            Some(node) => {
                doc.add_event_listener(node, EventType::Blur, BOUND_BLUR)?;
                doc.add_event_listener(node, EventType::Input, BOUND_INPUT)?;
                self.active = Some(node);
                Ok(None)
            }
            None => {
                self.active = None;
                self.has_focus = false;
                Ok(Some(BindingSignal::FocusLost))
            }
        }
    }

    /// Makes `node` the bound input, detaching the previous one first.
    pub fn bind(&mut self, doc: &mut Document, node: NodeId) -> Result<(), DomError> {
        if self.active == Some(node) {
            return Ok(());
        }
        self.unbind(doc)?;
        self.set_input(doc, Some(node))?;
        log::debug!(target: "keyboard.registry", "bound input {}", node.0);
        Ok(())
    }

    fn unbind(&mut self, doc: &mut Document) -> Result<(), DomError> {
        let Some(prev) = self.active.take() else {
            return Ok(());
        };
        if doc.contains(prev) {
            doc.remove_event_listener(prev, EventType::Blur, BOUND_BLUR)?;
            doc.remove_event_listener(prev, EventType::Input, BOUND_INPUT)?;
        }
        Ok(())
    }

    /// Strips listeners and marker from `node`. Reports focus lost if it was
    /// the active input.
    pub fn remove_input(
        &mut self,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<Option<BindingSignal>, DomError> {
        if !self.registered.remove(&node) {
            return Ok(None);
        }
        doc.remove_event_listener(node, EventType::Focus, WATCH_FOCUS)?;
        doc.remove_event_listener(node, EventType::Blur, BOUND_BLUR)?;
        doc.remove_event_listener(node, EventType::Input, BOUND_INPUT)?;
        doc.remove_class(node, &self.marker)?;
        log::debug!(target: "keyboard.registry", "removed input {}", node.0);

        if self.active == Some(node) {
            return self.set_input(doc, None);
        }
        Ok(None)
    }

    /// A registered input received focus: bind it and load its value into the widget.
    pub fn on_focus(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        facade: &mut KeyboardFacade,
    ) -> Result<Option<BindingSignal>, DomError> {
        if !self.registered.contains(&node) {
            return Ok(None);
        }
        self.bind(doc, node)?;
        facade.set_text(doc.value(node).unwrap_or_default());
        facade.set_multiline(eligible::classify(doc, node).is_some_and(InputKind::is_multiline));
        self.has_focus = true;
        Ok(Some(BindingSignal::FocusGained(node)))
    }

    /// Blur of anything but the active input is stale and ignored.
    pub fn on_blur(&mut self, node: NodeId) -> Option<BindingSignal> {
        if self.active != Some(node) {
            return None;
        }
        self.has_focus = false;
        Some(BindingSignal::FocusLost)
    }

    /// The bound input's value changed outside the keyboard.
    pub fn on_value_change(&self, doc: &Document, node: NodeId, facade: &mut KeyboardFacade) {
        if self.active != Some(node) {
            return;
        }
        let value = doc.value(node).unwrap_or_default();
        if facade.text() != value {
            facade.set_text(value);
        }
    }

    /// Dismissal from the keyboard itself.
    pub fn clear_focus(&mut self) {
        self.has_focus = false;
    }

    /// Writes widget text into the active input and returns the notifications
    /// the host must dispatch on it: an insertion `input` event, then `change`.
    pub fn write_from_keyboard(
        &mut self,
        doc: &mut Document,
        text: &str,
    ) -> Result<Vec<Event>, DomError> {
        let Some(active) = self.active else {
            return Ok(Vec::new());
        };
        doc.set_value(active, text)?;
        Ok(vec![Event::insert_text(active, text), Event::change(active)])
    }
}
