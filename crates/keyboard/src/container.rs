//! The keyboard's container element.

use crate::config::{ClassNames, MountConfig};
use crate::machine::Target;
use crate::policy::{LayoutFamily, Side};
use dom::{
    Document, DomError, EventType, ListenerId, MutationRecord, NodeId, ObserveOptions,
    ObserverId, TransitionRule,
};

pub const CONTAINER_TRANSITION: ListenerId = ListenerId(0x6b62_0004);

const INERT: &str = "inert";

pub struct Container {
    node: NodeId,
    classes: ClassNames,
    modal_hosts: Vec<String>,
    inert_observer: ObserverId,
}

impl Container {
    /// Creates the container under the body at `initial`, hidden.
    pub fn mount(
        doc: &mut Document,
        classes: ClassNames,
        mount: &MountConfig,
        initial: Target,
    ) -> Result<Self, DomError> {
        let node = doc.create_element("div");
        doc.add_class(node, &classes.base)?;
        doc.add_class(node, side_class(&classes, initial.placement.side))?;
        doc.add_class(node, layout_class(&classes, initial.placement.layout))?;
        doc.set_style(node, "display", "none")?;
        doc.append_child(initial.surface, node)?;
        doc.add_event_listener(node, EventType::TransitionEnd, CONTAINER_TRANSITION)?;
        doc.set_transition_rule(
            node,
            TransitionRule {
                class: classes.visible.clone(),
                suppressed_by: Some(classes.no_transition.clone()),
            },
        );

        // modal hosts mark everything outside the dialog inert
        let inert_observer = doc.create_observer();
        doc.observe(inert_observer, node, ObserveOptions::attributes(&[INERT]))?;

        Ok(Self {
            node,
            classes,
            modal_hosts: mount.modal_hosts.clone(),
            inert_observer,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn inert_observer(&self) -> ObserverId {
        self.inert_observer
    }

    pub fn set_displayed(&self, doc: &mut Document, displayed: bool) -> Result<(), DomError> {
        doc.set_style(self.node, "display", if displayed { "block" } else { "none" })
    }

    pub fn set_visible(&self, doc: &mut Document, visible: bool) -> Result<(), DomError> {
        if visible {
            doc.add_class(self.node, &self.classes.visible)?;
        } else {
            doc.remove_class(self.node, &self.classes.visible)?;
        }
        Ok(())
    }

    pub fn is_visible(&self, doc: &Document) -> bool {
        doc.has_class(self.node, &self.classes.visible)
    }

    /// Swaps placement classes and the mount surface with transitions
    /// suppressed, committing styles before they are re-enabled.
    pub fn apply_placement(
        &self,
        doc: &mut Document,
        from: &Target,
        to: &Target,
    ) -> Result<(), DomError> {
        let c = &self.classes;
        doc.add_class(self.node, &c.no_transition)?;

        doc.remove_class(self.node, side_class(c, from.placement.side))?;
        doc.remove_class(self.node, layout_class(c, from.placement.layout))?;
        doc.add_class(self.node, side_class(c, to.placement.side))?;
        doc.add_class(self.node, layout_class(c, to.placement.layout))?;

        if doc.parent(self.node) != Some(to.surface) {
            log::debug!(
                target: "keyboard.machine",
                "remounting container under {}",
                to.surface.0
            );
            doc.append_child(to.surface, self.node)?;
        }

        doc.force_layout();
        doc.remove_class(self.node, &c.no_transition)?;
        Ok(())
    }

    /// Puts the container back under the body when the surface holding it
    /// left the document. Returns the surface it was taken from.
    pub fn remount_if_detached(&self, doc: &mut Document) -> Result<Option<NodeId>, DomError> {
        if doc.is_connected(self.node) {
            return Ok(None);
        }
        let Some(old) = doc.parent(self.node) else {
            return Ok(None);
        };
        log::debug!(
            target: "keyboard.machine",
            "surface {} left the document, container back under body",
            old.0
        );
        let body = doc.body();
        doc.append_child(body, self.node)?;
        Ok(Some(old))
    }

    /// Where the container belongs while `input` is bound: inside the nearest
    /// modal host around it, else the body.
    pub fn surface_for(&self, doc: &Document, input: NodeId) -> NodeId {
        doc.composed_ancestors(input)
            .into_iter()
            .find(|&n| {
                doc.tag_name(n)
                    .is_some_and(|name| self.modal_hosts.iter().any(|h| h.eq_ignore_ascii_case(name)))
            })
            .unwrap_or_else(|| doc.body())
    }

    /// Removes `inert` wherever the records say it was set.
    pub fn strip_inert(
        &self,
        doc: &mut Document,
        records: &[MutationRecord],
    ) -> Result<usize, DomError> {
        let mut stripped = 0;
        for record in records {
            let MutationRecord::Attribute { target, name, .. } = record else {
                continue;
            };
            if name.eq_ignore_ascii_case(INERT) && doc.remove_attribute(*target, INERT)? {
                stripped += 1;
            }
        }
        if stripped > 0 {
            log::debug!(target: "keyboard.machine", "stripped inert from {stripped} element(s)");
        }
        Ok(stripped)
    }
}

pub fn side_class(classes: &ClassNames, side: Side) -> &str {
    match side {
        Side::Top => &classes.top,
        Side::Bottom => &classes.bottom,
        Side::Left => &classes.left,
        Side::Right => &classes.right,
    }
}

pub fn layout_class(classes: &ClassNames, layout: LayoutFamily) -> &str {
    match layout {
        LayoutFamily::Default => &classes.default_layout,
        LayoutFamily::Numeric => &classes.numeric_layout,
    }
}
