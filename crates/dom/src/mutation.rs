//! Mutation observers.
//!
//! Records are queued while the tree is mutated and handed out in batches via
//! [`Document::take_records`], the way a browser delivers them at the next
//! microtask checkpoint.
//!
//! Invariants:
//! - A registration only sees mutations inside the tree it was registered in.
//!   Observing with `subtree` never reaches into a nested shadow root; every
//!   isolated subtree must be observed on its own.
//! - Each mutation produces at most one record per observer.
//! - Records keep the order in which the mutations happened.

use crate::{Document, DomError, NodeId};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u32);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    /// Attribute names to report. Empty means attributes are not observed.
    pub attribute_filter: Vec<String>,
    /// Report `attachShadow` on observed elements. Hosts patch `attachShadow`
    /// to get this; plain DOM observers never see shadow roots appear.
    pub shadow_roots: bool,
}

impl ObserveOptions {
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attribute_filter: Vec::new(),
            shadow_roots: true,
        }
    }

    pub fn attributes(names: &[&str]) -> Self {
        Self {
            child_list: false,
            subtree: true,
            attribute_filter: names.iter().map(|n| n.to_ascii_lowercase()).collect(),
            shadow_roots: false,
        }
    }

    fn wants(&self, record: &MutationRecord) -> bool {
        match record {
            MutationRecord::ChildList { .. } => self.child_list,
            MutationRecord::Attribute { name, .. } => self
                .attribute_filter
                .iter()
                .any(|f| f.eq_ignore_ascii_case(name)),
            MutationRecord::ShadowAttached { .. } => self.shadow_roots,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attribute {
        target: NodeId,
        name: Arc<str>,
        old_value: Option<String>,
    },
    ShadowAttached {
        host: NodeId,
        root: NodeId,
    },
}

impl MutationRecord {
    pub fn target(&self) -> NodeId {
        match self {
            MutationRecord::ChildList { target, .. } => *target,
            MutationRecord::Attribute { target, .. } => *target,
            MutationRecord::ShadowAttached { host, .. } => *host,
        }
    }
}

struct ObserverEntry {
    id: ObserverId,
    registrations: Vec<(NodeId, ObserveOptions)>,
    pending: Vec<MutationRecord>,
}

#[derive(Default)]
pub(crate) struct Observers {
    entries: Vec<ObserverEntry>,
    next: u32,
}

impl Observers {
    fn entry_mut(&mut self, id: ObserverId) -> Result<&mut ObserverEntry, DomError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(DomError::UnknownObserver(id))
    }
}

impl Document {
    pub fn create_observer(&mut self) -> ObserverId {
        self.observers.next += 1;
        let id = ObserverId(self.observers.next);
        self.observers.entries.push(ObserverEntry {
            id,
            registrations: Vec::new(),
            pending: Vec::new(),
        });
        id
    }

    /// Observing the same target again replaces its options.
    pub fn observe(
        &mut self,
        observer: ObserverId,
        target: NodeId,
        options: ObserveOptions,
    ) -> Result<(), DomError> {
        if !self.contains(target) {
            return Err(DomError::UnknownNode(target));
        }
        let entry = self.observers.entry_mut(observer)?;
        if let Some(existing) = entry.registrations.iter_mut().find(|(n, _)| *n == target) {
            existing.1 = options;
        } else {
            entry.registrations.push((target, options));
        }
        Ok(())
    }

    /// Drops every registration of `target`; pending records are kept.
    pub fn unobserve(&mut self, observer: ObserverId, target: NodeId) -> Result<(), DomError> {
        let entry = self.observers.entry_mut(observer)?;
        entry.registrations.retain(|(n, _)| *n != target);
        Ok(())
    }

    /// Drops all registrations and pending records.
    pub fn disconnect(&mut self, observer: ObserverId) -> Result<(), DomError> {
        let entry = self.observers.entry_mut(observer)?;
        entry.registrations.clear();
        entry.pending.clear();
        Ok(())
    }

    pub fn observed_targets(&self, observer: ObserverId) -> Vec<NodeId> {
        self.observers
            .entries
            .iter()
            .find(|e| e.id == observer)
            .map(|e| e.registrations.iter().map(|(n, _)| *n).collect())
            .unwrap_or_default()
    }

    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .entry_mut(observer)
            .map(|e| std::mem::take(&mut e.pending))
            .unwrap_or_default()
    }

    /// Observers with queued records, in creation order.
    pub fn observers_with_records(&self) -> Vec<ObserverId> {
        self.observers
            .entries
            .iter()
            .filter(|e| !e.pending.is_empty())
            .map(|e| e.id)
            .collect()
    }

    pub fn has_pending_records(&self) -> bool {
        self.observers.entries.iter().any(|e| !e.pending.is_empty())
    }

    pub(crate) fn queue_record(&mut self, record: MutationRecord) {
        let target = record.target();
        if self.observers.entries.is_empty() {
            return;
        }

        // Inclusive ancestors inside the target's own tree.
        let mut scope = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            scope.push(node);
            cursor = self.record(node).ok().and_then(|r| r.parent);
        }

        for entry in &mut self.observers.entries {
            let interested = entry.registrations.iter().any(|(node, options)| {
                scope.contains(node)
                    && (*node == target || options.subtree)
                    && options.wants(&record)
            });
            if interested {
                entry.pending.push(record.clone());
            }
        }
    }
}
