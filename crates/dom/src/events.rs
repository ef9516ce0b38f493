//! Event listeners and dispatch.
//!
//! Listeners are opaque [`ListenerId`] tokens owned by whoever registered them.
//! `dispatch` does not run code; it resolves the propagation path and returns
//! the deliveries in order, and the event loop routes each one to its owner.
//!
//! Propagation:
//! - The target is always visited first.
//! - Bubbling events continue through the parent chain.
//! - At a shadow root a `composed` event continues at the host and is
//!   retargeted to it; a non-composed event stops.

use crate::{Document, DomError, NodeId, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Focus,
    Blur,
    Input,
    Change,
    TransitionEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputType {
    InsertText,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub ty: EventType,
    pub target: NodeId,
    pub bubbles: bool,
    pub composed: bool,
    pub input_type: Option<InputType>,
    pub data: Option<String>,
}

impl Event {
    pub fn focus(target: NodeId) -> Self {
        Self::plain(EventType::Focus, target, false, true)
    }

    pub fn blur(target: NodeId) -> Self {
        Self::plain(EventType::Blur, target, false, true)
    }

    /// Input notification carrying an insertion semantic.
    pub fn insert_text(target: NodeId, data: impl Into<String>) -> Self {
        Self {
            ty: EventType::Input,
            target,
            bubbles: true,
            composed: true,
            input_type: Some(InputType::InsertText),
            data: Some(data.into()),
        }
    }

    pub fn change(target: NodeId) -> Self {
        Self::plain(EventType::Change, target, true, false)
    }

    pub fn transition_end(target: NodeId) -> Self {
        Self::plain(EventType::TransitionEnd, target, true, false)
    }

    fn plain(ty: EventType, target: NodeId, bubbles: bool, composed: bool) -> Self {
        Self {
            ty,
            target,
            bubbles,
            composed,
            input_type: None,
            data: None,
        }
    }
}

/// One listener invocation produced by [`Document::dispatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub current_target: NodeId,
    /// The event target as seen from `current_target` (retargeted across shadow boundaries).
    pub target: NodeId,
    pub listener: ListenerId,
}

impl Document {
    /// Returns `false` if the same listener was already registered for this type.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        ty: EventType,
        listener: ListenerId,
    ) -> Result<bool, DomError> {
        let record = self.record_mut(node)?;
        if record.listeners.contains(&(ty, listener)) {
            return Ok(false);
        }
        record.listeners.push((ty, listener));
        Ok(true)
    }

    /// Returns `true` if the listener was registered.
    pub fn remove_event_listener(
        &mut self,
        node: NodeId,
        ty: EventType,
        listener: ListenerId,
    ) -> Result<bool, DomError> {
        let record = self.record_mut(node)?;
        let before = record.listeners.len();
        record.listeners.retain(|entry| *entry != (ty, listener));
        Ok(record.listeners.len() != before)
    }

    pub fn has_event_listener(&self, node: NodeId, ty: EventType, listener: ListenerId) -> bool {
        self.record(node)
            .is_ok_and(|r| r.listeners.contains(&(ty, listener)))
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.record(node).map(|r| r.listeners.len()).unwrap_or(0)
    }

    /// `(current_target, retargeted target)` pairs in propagation order.
    pub fn propagation_path(&self, event: &Event) -> Vec<(NodeId, NodeId)> {
        let mut path = Vec::new();
        if !self.contains(event.target) {
            return path;
        }
        path.push((event.target, event.target));
        if !event.bubbles {
            return path;
        }

        let mut target = event.target;
        let mut current = event.target;
        loop {
            let Ok(record) = self.record(current) else {
                break;
            };
            if let NodeKind::ShadowRoot { host } = record.kind {
                if !event.composed {
                    break;
                }
                target = host;
                current = host;
                path.push((current, target));
                continue;
            }
            let Some(parent) = record.parent else {
                break;
            };
            current = parent;
            path.push((current, target));
        }
        path
    }

    pub fn dispatch(&self, event: &Event) -> Vec<Delivery> {
        let mut out = Vec::new();
        for (current_target, target) in self.propagation_path(event) {
            let Ok(record) = self.record(current_target) else {
                continue;
            };
            for &(ty, listener) in &record.listeners {
                if ty == event.ty {
                    out.push(Delivery {
                        current_target,
                        target,
                        listener,
                    });
                }
            }
        }
        log::trace!(
            target: "dom.events",
            "dispatch {:?} on {} -> {} deliveries",
            event.ty,
            event.target.0,
            out.len()
        );
        out
    }
}
