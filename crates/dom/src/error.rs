use crate::{NodeId, ObserverId};
use std::fmt;

/// Structural violations reported by [`Document`](crate::Document) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomError {
    UnknownNode(NodeId),
    UnknownObserver(ObserverId),
    WrongNodeKind(NodeId),
    InvalidParent(NodeId),
    InvalidSibling { parent: NodeId, before: NodeId },
    CycleDetected { parent: NodeId, child: NodeId },
    ShadowAlreadyAttached(NodeId),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::UnknownNode(id) => write!(f, "unknown node {}", id.0),
            DomError::UnknownObserver(id) => write!(f, "unknown mutation observer {}", id.0),
            DomError::WrongNodeKind(id) => write!(f, "node {} has the wrong kind", id.0),
            DomError::InvalidParent(id) => write!(f, "node {} cannot take this child", id.0),
            DomError::InvalidSibling { parent, before } => {
                write!(f, "node {} is not a child of {}", before.0, parent.0)
            }
            DomError::CycleDetected { parent, child } => {
                write!(f, "inserting {} under {} would create a cycle", child.0, parent.0)
            }
            DomError::ShadowAlreadyAttached(id) => {
                write!(f, "node {} already hosts a shadow root", id.0)
            }
        }
    }
}

impl std::error::Error for DomError {}
