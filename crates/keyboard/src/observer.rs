//! Subtree attachment observer.
//!
//! A tree-scoped mutation observer never sees into shadow roots, so every
//! shadow root found below the attach point gets its own registration.
//! Roots that appear later are picked up from shadow-attach records, which
//! the observer receives for hosts inside any tree it already watches.

use crate::eligible::{self, InputKind};
use dom::{Document, DomError, MutationRecord, NodeId, ObserveOptions, ObserverId};
use std::collections::BTreeSet;

/// What a batch of records means for input registration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Eligible inputs that became reachable, in tree order.
    pub appeared: Vec<(NodeId, InputKind)>,
    /// Eligible inputs that left the document.
    pub disappeared: Vec<NodeId>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.appeared.is_empty() && self.disappeared.is_empty()
    }

    fn extend(&mut self, other: Discovery) {
        self.appeared.extend(other.appeared);
        self.disappeared.extend(other.disappeared);
    }
}

pub struct SubtreeObserver {
    id: ObserverId,
    watched: BTreeSet<NodeId>,
}

impl SubtreeObserver {
    pub fn new(doc: &mut Document) -> Self {
        Self {
            id: doc.create_observer(),
            watched: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Tree roots (the attach point and shadow roots) currently observed.
    pub fn watched_roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.watched.iter().copied()
    }

    pub fn is_watching(&self, root: NodeId) -> bool {
        self.watched.contains(&root)
    }

    /// Starts observing `root` and every shadow root below it, and reports the
    /// eligible inputs already present.
    pub fn attach(&mut self, doc: &mut Document, root: NodeId) -> Result<Discovery, DomError> {
        self.watch(doc, root)?;
        let discovery = self.discover(doc, root)?;
        log::info!(
            target: "keyboard.observer",
            "attached at {}: {} tree(s), {} input(s)",
            root.0,
            self.watched.len(),
            discovery.appeared.len()
        );
        Ok(discovery)
    }

    pub fn on_records(
        &mut self,
        doc: &mut Document,
        records: &[MutationRecord],
    ) -> Result<Discovery, DomError> {
        let mut out = Discovery::default();
        for record in records {
            match record {
                MutationRecord::ChildList { added, removed, .. } => {
                    for &node in removed {
                        out.disappeared.extend(self.forget(doc, node)?);
                    }
                    for &node in added {
                        if doc.is_connected(node) {
                            out.extend(self.discover(doc, node)?);
                        }
                    }
                }
                MutationRecord::ShadowAttached { host, root } => {
                    if doc.is_connected(*host) {
                        log::debug!(
                            target: "keyboard.observer",
                            "shadow root attached on <{}>",
                            doc.tag_name(*host).unwrap_or("?")
                        );
                        out.extend(self.discover(doc, *root)?);
                    }
                }
                MutationRecord::Attribute { .. } => {}
            }
        }
        Ok(out)
    }

    /// Watches every tree root in `node`'s composed subtree and collects its inputs.
    fn discover(&mut self, doc: &mut Document, node: NodeId) -> Result<Discovery, DomError> {
        let mut out = Discovery::default();
        let nodes: Vec<NodeId> = std::iter::once(node)
            .chain(doc.composed_descendants(node))
            .collect();
        for n in nodes {
            if doc.is_shadow_root(n) {
                self.watch(doc, n)?;
            }
            if let Some(kind) = eligible::classify(doc, n) {
                out.appeared.push((n, kind));
            }
        }
        Ok(out)
    }

    /// Connected and below the attach point or a watched shadow root. Records
    /// for anything else never reach this observer.
    fn in_scope(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_connected(node)
            && std::iter::once(node)
                .chain(doc.composed_ancestors(node))
                .any(|n| self.watched.contains(&n))
    }

    fn watch(&mut self, doc: &mut Document, root: NodeId) -> Result<(), DomError> {
        if self.watched.insert(root) {
            doc.observe(self.id, root, ObserveOptions::child_list_subtree())?;
            log::trace!(target: "keyboard.observer", "watching tree {}", root.0);
        }
        Ok(())
    }

    /// Drops watches below a node that left the observed trees and returns
    /// the inputs it took with it. A node moved to another place inside the
    /// observed trees keeps everything.
    fn forget(&mut self, doc: &mut Document, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        if !doc.contains(node) || self.in_scope(doc, node) {
            return Ok(Vec::new());
        }
        let mut gone = Vec::new();
        for n in std::iter::once(node).chain(doc.composed_descendants(node)) {
            if doc.is_shadow_root(n) && self.watched.remove(&n) {
                doc.unobserve(self.id, n)?;
                log::trace!(target: "keyboard.observer", "dropped tree {}", n.0);
            }
            if eligible::classify(doc, n).is_some() {
                gone.push(n);
            }
        }
        Ok(gone)
    }
}
