//! # dom
//!
//! The host document the keyboard lives in, reduced to what an injected
//! component can observe and touch:
//! - a node arena with elements, text and shadow roots ([`Document`])
//! - attributes, class lists, inline style, the `.value` property and layout boxes
//! - event listeners with bubbling / composed propagation ([`events`])
//! - child-list, attribute and shadow-attach mutation observers ([`mutation`])
//! - style commits that decide when a class toggle animates ([`render`])

pub mod debug;
mod document;
mod error;
pub mod events;
pub mod mutation;
mod query;
pub mod render;
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;
mod types;

pub use crate::document::Document;
pub use crate::error::DomError;
pub use crate::events::{Delivery, Event, EventType, InputType, ListenerId};
pub use crate::mutation::{MutationRecord, ObserveOptions, ObserverId};
pub use crate::render::{TransitionChange, TransitionNotice, TransitionRule};
pub use crate::types::{ElementData, NodeId, NodeKind};
