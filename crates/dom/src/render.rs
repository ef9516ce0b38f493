//! Style commits and transition starts.
//!
//! A minimal stand-in for the host renderer's style engine. A
//! [`TransitionRule`] marks an element whose class toggle animates (the
//! equivalent of a stylesheet `transition` on that class). Styles are only
//! committed by [`Document::flush_styles`], which a host calls once per frame
//! and on forced layout. A transition starts only if the element was
//! displayed at the previous commit and is still displayed, so toggling the
//! class in the same frame that un-hides the element does not animate.

use crate::{Document, NodeId};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionRule {
    pub class: String,
    /// While this class is present, toggles snap instead of animating.
    pub suppressed_by: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionChange {
    Started,
    /// The element stopped being displayed mid-flight; no end will follow.
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionNotice {
    pub node: NodeId,
    pub change: TransitionChange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CommittedStyle {
    displayed: bool,
    active: bool,
}

#[derive(Default)]
pub(crate) struct StyleCommits {
    rules: Vec<(NodeId, TransitionRule)>,
    committed: HashMap<NodeId, CommittedStyle>,
    notices: Vec<TransitionNotice>,
}

impl Document {
    pub fn set_transition_rule(&mut self, node: NodeId, rule: TransitionRule) {
        let rules = &mut self.styles.rules;
        match rules.iter_mut().find(|(n, _)| *n == node) {
            Some((_, existing)) => *existing = rule,
            None => rules.push((node, rule)),
        }
    }

    /// Commits current styles, producing transition notices.
    pub fn flush_styles(&mut self) {
        let mut notices = Vec::new();
        let mut next = Vec::with_capacity(self.styles.rules.len());
        for (node, rule) in &self.styles.rules {
            let displayed = self.is_connected(*node) && self.is_displayed(*node);
            let active = self.has_class(*node, &rule.class);
            let suppressed = rule
                .suppressed_by
                .as_deref()
                .is_some_and(|c| self.has_class(*node, c));
            let now = CommittedStyle { displayed, active };

            if let Some(prev) = self.styles.committed.get(node) {
                if prev.displayed && now.displayed && prev.active != now.active && !suppressed {
                    notices.push(TransitionNotice {
                        node: *node,
                        change: TransitionChange::Started,
                    });
                } else if prev.displayed && !now.displayed {
                    notices.push(TransitionNotice {
                        node: *node,
                        change: TransitionChange::Cancelled,
                    });
                }
            }
            next.push((*node, now));
        }
        for (node, style) in next {
            self.styles.committed.insert(node, style);
        }
        self.styles.notices.extend(notices);
    }

    /// Forced synchronous layout: commits styles immediately.
    pub fn force_layout(&mut self) {
        self.flush_styles();
    }

    pub fn take_transition_notices(&mut self) -> Vec<TransitionNotice> {
        std::mem::take(&mut self.styles.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let el = doc.create_element("div");
        doc.append_child(body, el).unwrap();
        doc.set_style(el, "display", "none").unwrap();
        doc.set_transition_rule(
            el,
            TransitionRule {
                class: "visible".into(),
                suppressed_by: Some("still".into()),
            },
        );
        doc.flush_styles();
        (doc, el)
    }

    #[test]
    fn toggle_in_same_frame_as_display_does_not_animate() {
        let (mut doc, el) = setup();
        doc.set_style(el, "display", "block").unwrap();
        doc.add_class(el, "visible").unwrap();
        doc.flush_styles();
        assert!(doc.take_transition_notices().is_empty());
    }

    #[test]
    fn toggle_after_committed_display_animates() {
        let (mut doc, el) = setup();
        doc.set_style(el, "display", "block").unwrap();
        doc.flush_styles();
        doc.add_class(el, "visible").unwrap();
        doc.flush_styles();
        assert_eq!(
            doc.take_transition_notices(),
            vec![TransitionNotice {
                node: el,
                change: TransitionChange::Started
            }]
        );
    }

    #[test]
    fn suppression_class_snaps() {
        let (mut doc, el) = setup();
        doc.set_style(el, "display", "block").unwrap();
        doc.flush_styles();
        doc.add_class(el, "still").unwrap();
        doc.add_class(el, "visible").unwrap();
        doc.force_layout();
        assert!(doc.take_transition_notices().is_empty());
    }

    #[test]
    fn hiding_mid_flight_cancels() {
        let (mut doc, el) = setup();
        doc.set_style(el, "display", "block").unwrap();
        doc.flush_styles();
        doc.set_style(el, "display", "none").unwrap();
        doc.flush_styles();
        assert_eq!(
            doc.take_transition_notices(),
            vec![TransitionNotice {
                node: el,
                change: TransitionChange::Cancelled
            }]
        );
    }
}
