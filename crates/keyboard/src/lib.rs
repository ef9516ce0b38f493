//! # keyboard
//!
//! A shared on-screen keyboard injected into a host page whose inputs live in
//! arbitrarily nested shadow trees.
//!
//! - [`observer`] finds eligible inputs below an attach point, including ones
//!   inserted later in shadow roots that did not exist at attach time
//! - [`registry`] marks inputs once and keeps at most one of them bound
//! - [`policy`] picks the side and layout for the focused input
//! - [`machine`] serializes show, hide and reposition so only one animation
//!   runs at a time
//! - [`facade`] wraps the key-rendering widget
//! - [`service`] owns all of it and talks to the host loop
//!
//! ```
//! use core_types::Viewport;
//! use dom::Document;
//! use keyboard::{KeyboardConfig, KeyboardService, Visibility};
//!
//! let mut doc = Document::new();
//! let root = doc.body();
//! let mut keyboard =
//!     KeyboardService::install(&mut doc, &KeyboardConfig::default(), Viewport::default()).unwrap();
//! keyboard.attach(&mut doc, root).unwrap();
//! assert_eq!(keyboard.visibility(), Visibility::Hidden);
//! ```

pub mod config;
pub mod container;
pub mod eligible;
mod error;
pub mod facade;
pub mod layouts;
pub mod machine;
pub mod observer;
pub mod policy;
pub mod registry;
pub mod service;

pub use crate::config::{ConfigError, KeyboardConfig};
pub use crate::eligible::InputKind;
pub use crate::error::{KeyboardError, Result};
pub use crate::facade::{FacadeEvent, KeyboardFacade};
pub use crate::layouts::LayoutKind;
pub use crate::machine::{Target, Transition, Visibility};
pub use crate::policy::{LayoutFamily, Placement, Side};
pub use crate::service::{Deferred, HostRequest, KeyboardService};
