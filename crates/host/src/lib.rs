//! # host
//!
//! A single-threaded host page with a virtual clock. It stands in for the
//! web app the keyboard is injected into: it owns the document and focus,
//! commits styles once per frame, runs paint callbacks after each commit,
//! fires `transitionend` for started transitions, and carries out every
//! [`keyboard::HostRequest`].
//!
//! Ordering within a step:
//! 1. timers and frames run in due order (a timer due on a frame boundary first)
//! 2. after every callback, queued events are dispatched and mutation records
//!    delivered until neither is left

mod page;
mod timers;

pub use crate::page::{HostNotice, Page, PageConfig};
pub use crate::timers::TimerQueue;
