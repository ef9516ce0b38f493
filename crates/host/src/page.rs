//! Headless host page.
//!
//! Owns the document, a virtual clock and the frame loop. Keyboard requests
//! (timers, paint callbacks, synthetic events, blur) are carried out here, and
//! DOM deliveries are routed either to the keyboard or to page listeners.

use crate::timers::TimerQueue;
use core_types::{Millis, TimerId, Viewport};
use dom::{
    Document, DomError, Event, EventType, ListenerId, NodeId, TransitionChange,
};
use keyboard::{Deferred, HostRequest, KeyboardConfig, KeyboardError, KeyboardService, Transition};
use std::collections::VecDeque;

const FIRST_HOST_LISTENER: u64 = 1000;

#[derive(Clone, Debug, PartialEq)]
pub struct PageConfig {
    /// Interval between frames (style commit, then paint callbacks).
    pub frame_ms: Millis,
    /// Duration of every started CSS transition.
    pub transition_ms: Millis,
    pub viewport: Viewport,
    /// `settle` gives up after this much virtual time.
    pub idle_limit_ms: Millis,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            frame_ms: 16, // ~60Hz
            transition_ms: 200,
            viewport: Viewport::default(),
            idle_limit_ms: 10_000,
        }
    }
}

/// An event that reached one of the page's own listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct HostNotice {
    pub at: Millis,
    pub listener: ListenerId,
    pub current_target: NodeId,
    pub event: Event,
}

enum Task {
    Keyboard { id: TimerId, task: Deferred },
    TransitionEnd(NodeId),
}

/// The host application around the keyboard: owns the document, the virtual
/// clock, focus and the frame loop, and carries out the keyboard's requests.
pub struct Page {
    config: PageConfig,
    doc: Document,
    keyboard: KeyboardService,
    now: Millis,
    next_frame: Millis,
    frames: u64,
    timers: TimerQueue<Task>,
    paints: Vec<Deferred>,
    events: VecDeque<Event>,
    focused: Option<NodeId>,
    next_listener: u64,
    notices: Vec<HostNotice>,
}

impl Page {
    pub fn new(config: PageConfig, keyboard_config: &KeyboardConfig) -> Result<Self, KeyboardError> {
        let mut doc = Document::new();
        let keyboard = KeyboardService::install(&mut doc, keyboard_config, config.viewport)?;
        let next_frame = config.frame_ms;
        Ok(Self {
            config,
            doc,
            keyboard,
            now: 0,
            next_frame,
            frames: 0,
            timers: TimerQueue::new(),
            paints: Vec::new(),
            events: VecDeque::new(),
            focused: None,
            next_listener: FIRST_HOST_LISTENER,
            notices: Vec::new(),
        })
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn keyboard(&self) -> &KeyboardService {
        &self.keyboard
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Runs `f` against the document, then delivers the resulting mutation records.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> R {
        let out = f(&mut self.doc);
        self.run_microtasks();
        out
    }

    pub fn attach_keyboard(&mut self, root: NodeId) -> Result<usize, KeyboardError> {
        let found = self.keyboard.attach(&mut self.doc, root)?;
        self.run_microtasks();
        Ok(found)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        self.keyboard.set_viewport(viewport);
    }

    /// Registers a page-owned listener; its deliveries land in [`notices`](Self::notices).
    pub fn listen(&mut self, node: NodeId, ty: EventType) -> Result<ListenerId, DomError> {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.doc.add_event_listener(node, ty, id)?;
        Ok(id)
    }

    pub fn notices(&self) -> &[HostNotice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<HostNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn take_transitions(&mut self) -> Vec<Transition> {
        self.keyboard.take_transitions()
    }

    /// Moves focus to `node`, blurring the previously focused element first.
    pub fn focus(&mut self, node: NodeId) {
        if self.focused == Some(node) {
            return;
        }
        if let Some(prev) = self.focused.take() {
            self.events.push_back(Event::blur(prev));
        }
        log::debug!(target: "host.page", "t={} focus {}", self.now, node.0);
        self.focused = Some(node);
        self.events.push_back(Event::focus(node));
        self.run_microtasks();
    }

    pub fn blur(&mut self) {
        if let Some(prev) = self.focused.take() {
            log::debug!(target: "host.page", "t={} blur {}", self.now, prev.0);
            self.events.push_back(Event::blur(prev));
            self.run_microtasks();
        }
    }

    /// An edit that did not come from the keyboard (physical typing, paste, script).
    pub fn type_text(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.doc.set_value(node, value)?;
        self.events.push_back(Event::insert_text(node, value));
        self.run_microtasks();
        Ok(())
    }

    /// A tap on a key of the on-screen keyboard.
    pub fn press_key(&mut self, token: &str) {
        let requests = self.keyboard.press_key(&mut self.doc, token);
        self.apply(requests);
        self.run_microtasks();
    }

    /// Advances the virtual clock by `ms`, running timers and frames in order.
    /// A timer due at the same instant as a frame runs first.
    pub fn advance(&mut self, ms: Millis) {
        let end = self.now + ms;
        loop {
            let timer = self.timers.next_due().filter(|&due| due <= end);
            let frame = Some(self.next_frame).filter(|&at| at <= end);
            match (timer, frame) {
                (Some(due), Some(at)) if due <= at => self.run_timer(due),
                (Some(due), None) => self.run_timer(due),
                (_, Some(at)) => {
                    self.now = at;
                    self.next_frame = at + self.config.frame_ms;
                    self.frame();
                }
                (None, None) => break,
            }
        }
        self.now = end;
    }

    /// Advances frame by frame until nothing is pending. Returns `false` if
    /// the idle limit ran out first.
    pub fn settle(&mut self) -> bool {
        let limit = self.now + self.config.idle_limit_ms;
        while !self.is_idle() {
            if self.now >= limit {
                log::warn!(target: "host.page", "not idle after {}ms", self.config.idle_limit_ms);
                return false;
            }
            self.advance(self.config.frame_ms);
        }
        true
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.paints.is_empty() && self.events.is_empty()
    }

    fn run_timer(&mut self, due: Millis) {
        self.now = self.now.max(due);
        let Some((_, task)) = self.timers.pop_due(self.now) else {
            return;
        };
        match task {
            Task::Keyboard { id, task } => {
                let requests = self.keyboard.handle_timer(&mut self.doc, id, task);
                self.apply(requests);
            }
            Task::TransitionEnd(node) => {
                log::trace!(target: "host.page", "t={} transitionend {}", self.now, node.0);
                self.events.push_back(Event::transition_end(node));
            }
        }
        self.run_microtasks();
    }

    /// Commit styles, then run the paint callbacks requested before the commit.
    fn frame(&mut self) {
        self.frames += 1;
        self.doc.flush_styles();
        self.collect_transitions();
        for task in std::mem::take(&mut self.paints) {
            let requests = self.keyboard.handle_after_paint(&mut self.doc, task);
            self.apply(requests);
        }
        self.run_microtasks();
    }

    /// Dispatches queued events and delivers mutation records until both are exhausted.
    fn run_microtasks(&mut self) {
        loop {
            if let Some(event) = self.events.pop_front() {
                self.dispatch(event);
                continue;
            }
            let observers = self.doc.observers_with_records();
            if observers.is_empty() {
                break;
            }
            for observer in observers {
                let records = self.doc.take_records(observer);
                if self.keyboard.observes(observer) {
                    let requests = self.keyboard.handle_mutations(&mut self.doc, observer, &records);
                    self.apply(requests);
                }
            }
        }
        self.collect_transitions();
    }

    fn dispatch(&mut self, event: Event) {
        for delivery in self.doc.dispatch(&event) {
            if self.keyboard.owns(delivery.listener) {
                let requests = self.keyboard.handle_event(&mut self.doc, &delivery, &event);
                self.apply(requests);
            } else {
                self.notices.push(HostNotice {
                    at: self.now,
                    listener: delivery.listener,
                    current_target: delivery.current_target,
                    event: event.clone(),
                });
            }
        }
    }

    fn apply(&mut self, requests: Vec<HostRequest>) {
        for request in requests {
            match request {
                HostRequest::SetTimer { id, delay, task } => {
                    self.timers
                        .schedule(self.now + delay, Task::Keyboard { id, task });
                }
                HostRequest::ClearTimer(id) => {
                    self.timers
                        .cancel(|t| matches!(t, Task::Keyboard { id: i, .. } if *i == id));
                }
                HostRequest::AfterPaint(task) => self.paints.push(task),
                HostRequest::Dispatch(event) => self.events.push_back(event),
                HostRequest::Blur(node) => {
                    if self.focused == Some(node) {
                        self.focused = None;
                        self.events.push_back(Event::blur(node));
                    }
                }
            }
        }
    }

    fn collect_transitions(&mut self) {
        for notice in self.doc.take_transition_notices() {
            let node = notice.node;
            self.timers
                .cancel(|t| matches!(t, Task::TransitionEnd(n) if *n == node));
            if notice.change == TransitionChange::Started {
                self.timers
                    .schedule(self.now + self.config.transition_ms, Task::TransitionEnd(node));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::test_harness::{element, text_input};

    fn page() -> Page {
        Page::new(PageConfig::default(), &KeyboardConfig::default()).unwrap()
    }

    #[test]
    fn frames_tick_on_the_virtual_clock() {
        let mut p = page();
        p.advance(100);
        assert_eq!(p.now(), 100);
        assert_eq!(p.frames(), 6);
    }

    #[test]
    fn focus_moves_blur_first() {
        let mut p = page();
        let body = p.doc().body();
        let (a, b) = p.mutate(|doc| (text_input(doc, body), text_input(doc, body)));
        let blur = p.listen(a, EventType::Blur).unwrap();
        let focus = p.listen(b, EventType::Focus).unwrap();

        p.focus(a);
        p.focus(b);
        let seen: Vec<ListenerId> = p.notices().iter().map(|n| n.listener).collect();
        assert_eq!(seen, vec![blur, focus]);
        assert_eq!(p.focused(), Some(b));
    }

    #[test]
    fn host_listeners_see_external_edits() {
        let mut p = page();
        let body = p.doc().body();
        let form = p.mutate(|doc| element(doc, body, "form"));
        let input = p.mutate(|doc| text_input(doc, form));
        let listener = p.listen(form, EventType::Input).unwrap();

        p.type_text(input, "x").unwrap();
        let notice = &p.notices()[0];
        assert_eq!(notice.listener, listener);
        assert_eq!(notice.event.data.as_deref(), Some("x"));
    }

    #[test]
    fn settle_reaches_idle() {
        let mut p = page();
        p.advance(5);
        assert!(p.settle());
        assert!(p.is_idle());
    }
}
