//! The installed keyboard: owns every part and routes host callbacks to them.
//!
//! The host loop delivers DOM listener invocations, mutation batches, timer
//! expiries and paint callbacks. Each handler runs to completion, drains the
//! state-machine queue, and returns the [`HostRequest`]s the host must carry
//! out. Errors are logged and never reach the host.

use crate::config::{KeyboardConfig, TimingConfig};
use crate::container::{self, Container};
use crate::eligible;
use crate::error::Result;
use crate::facade::{FacadeEvent, KeyboardFacade};
use crate::machine::{Command, MachineInput, Target, Transition, Visibility, VisibilityMachine};
use crate::observer::{Discovery, SubtreeObserver};
use crate::policy::{InputGeometry, Placement, PositioningPolicy};
use crate::registry::{self, BindingRegistry, BindingSignal};
use core_types::{Millis, TimerId, Viewport};
use dom::{Delivery, Document, Event, EventType, ListenerId, MutationRecord, NodeId, ObserverId};
use std::collections::VecDeque;

const HISTORY_LIMIT: usize = 1024;

/// Work the keyboard wants run later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deferred {
    /// Sample the bound input's geometry (debounced after focus).
    Reposition,
    /// Blur grace period ran out.
    BlurGrace,
    /// First paint after the container was un-hidden.
    FrameReady { epoch: u64 },
    /// A show/hide transition took too long.
    AnimationTimeout { epoch: u64 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum HostRequest {
    /// Call [`KeyboardService::handle_timer`] with `id` and `task` after `delay`.
    SetTimer {
        id: TimerId,
        delay: Millis,
        task: Deferred,
    },
    ClearTimer(TimerId),
    /// Call [`KeyboardService::handle_after_paint`] after the next frame is painted.
    AfterPaint(Deferred),
    /// Dispatch a synthetic event into the document.
    Dispatch(Event),
    /// Move focus away from `node`.
    Blur(NodeId),
}

pub struct KeyboardService {
    timing: TimingConfig,
    policy: PositioningPolicy,
    viewport: Viewport,
    facade: KeyboardFacade,
    registry: BindingRegistry,
    machine: VisibilityMachine,
    observer: SubtreeObserver,
    container: Container,
    queue: VecDeque<MachineInput>,
    outbox: Vec<HostRequest>,
    next_timer: u64,
    reposition_timer: Option<TimerId>,
    blur_timer: Option<TimerId>,
    history: Vec<Transition>,
}

impl KeyboardService {
    /// Mounts the hidden container under the body. Nothing is observed until
    /// [`attach`](Self::attach).
    pub fn install(doc: &mut Document, config: &KeyboardConfig, viewport: Viewport) -> Result<Self> {
        let tables = config.layout_tables()?;
        let initial = Target {
            placement: Placement::INITIAL,
            surface: doc.body(),
        };
        let container = Container::mount(doc, config.classes.clone(), &config.mount, initial)?;
        let observer = SubtreeObserver::new(doc);
        log::info!(target: "keyboard", "installed, container {}", container.node().0);

        Ok(Self {
            timing: config.timing.clone(),
            policy: PositioningPolicy::new(config.placement.numeric_edge_margin),
            viewport,
            facade: KeyboardFacade::new(tables),
            registry: BindingRegistry::new(config.classes.marker.clone()),
            machine: VisibilityMachine::new(initial),
            observer,
            container,
            queue: VecDeque::new(),
            outbox: Vec::new(),
            next_timer: 0,
            reposition_timer: None,
            blur_timer: None,
            history: Vec::new(),
        })
    }

    /// Starts watching `root` (and every shadow root below it) for inputs.
    pub fn attach(&mut self, doc: &mut Document, root: NodeId) -> Result<usize> {
        let discovery = self.observer.attach(doc, root)?;
        let found = discovery.appeared.len();
        self.apply_discovery(doc, discovery)?;
        Ok(found)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Whether a listener token belongs to the keyboard.
    pub fn owns(&self, listener: ListenerId) -> bool {
        [
            registry::WATCH_FOCUS,
            registry::BOUND_BLUR,
            registry::BOUND_INPUT,
            container::CONTAINER_TRANSITION,
        ]
        .contains(&listener)
    }

    pub fn observes(&self, observer: ObserverId) -> bool {
        observer == self.observer.id() || observer == self.container.inert_observer()
    }

    pub fn handle_event(
        &mut self,
        doc: &mut Document,
        delivery: &Delivery,
        event: &Event,
    ) -> Vec<HostRequest> {
        let result = self.on_event(doc, delivery, event);
        self.finish(doc, result, "event")
    }

    pub fn handle_mutations(
        &mut self,
        doc: &mut Document,
        observer: ObserverId,
        records: &[MutationRecord],
    ) -> Vec<HostRequest> {
        let result = self.on_mutations(doc, observer, records);
        self.finish(doc, result, "mutations")
    }

    pub fn handle_timer(
        &mut self,
        doc: &mut Document,
        id: TimerId,
        task: Deferred,
    ) -> Vec<HostRequest> {
        let result = self.on_deferred(doc, Some(id), task);
        self.finish(doc, result, "timer")
    }

    pub fn handle_after_paint(&mut self, doc: &mut Document, task: Deferred) -> Vec<HostRequest> {
        let result = self.on_deferred(doc, None, task);
        self.finish(doc, result, "after paint")
    }

    /// A key on the widget was pressed.
    pub fn press_key(&mut self, doc: &mut Document, token: &str) -> Vec<HostRequest> {
        let result = self.on_key(doc, token);
        self.finish(doc, result, "key press")
    }

    pub fn visibility(&self) -> Visibility {
        self.machine.state()
    }

    pub fn current(&self) -> Target {
        self.machine.current()
    }

    pub fn target(&self) -> Target {
        self.machine.target()
    }

    pub fn active_input(&self) -> Option<NodeId> {
        self.registry.active()
    }

    pub fn has_focus(&self) -> bool {
        self.machine.has_focus()
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn facade(&self) -> &KeyboardFacade {
        &self.facade
    }

    pub fn observer(&self) -> &SubtreeObserver {
        &self.observer
    }

    pub fn container(&self) -> NodeId {
        self.container.node()
    }

    pub fn is_shown(&self, doc: &Document) -> bool {
        self.container.is_visible(doc)
    }

    /// Transitions since the last call, oldest first.
    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.history)
    }

    fn on_event(&mut self, doc: &mut Document, delivery: &Delivery, event: &Event) -> Result<()> {
        let node = delivery.current_target;
        match (delivery.listener, event.ty) {
            (registry::WATCH_FOCUS, EventType::Focus) => {
                let signal = self.registry.on_focus(doc, node, &mut self.facade)?;
                if let Some(BindingSignal::FocusGained(node)) = signal {
                    log::debug!(target: "keyboard.registry", "focus on {}", node.0);
                    cancel(&mut self.outbox, &mut self.blur_timer);
                    cancel(&mut self.outbox, &mut self.reposition_timer);
                    self.reposition_timer =
                        Some(self.set_timer(self.timing.focus_debounce_ms, Deferred::Reposition));
                    self.queue.push_back(MachineInput::FocusGained);
                }
            }
            (registry::BOUND_BLUR, EventType::Blur) => {
                if self.registry.on_blur(node).is_some() {
                    cancel(&mut self.outbox, &mut self.blur_timer);
                    self.blur_timer =
                        Some(self.set_timer(self.timing.blur_grace_ms, Deferred::BlurGrace));
                }
            }
            (registry::BOUND_INPUT, EventType::Input) => {
                self.registry.on_value_change(doc, node, &mut self.facade);
            }
            (container::CONTAINER_TRANSITION, EventType::TransitionEnd) => {
                if delivery.target == self.container.node() {
                    self.queue
                        .push_back(MachineInput::AnimationComplete { epoch: None });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_mutations(
        &mut self,
        doc: &mut Document,
        observer: ObserverId,
        records: &[MutationRecord],
    ) -> Result<()> {
        if observer == self.observer.id() {
            let discovery = self.observer.on_records(doc, records)?;
            self.apply_discovery(doc, discovery)?;
            if let Some(old) = self.container.remount_if_detached(doc)? {
                self.machine.rebase_surface(old, doc.body());
            }
        } else if observer == self.container.inert_observer() {
            self.container.strip_inert(doc, records)?;
        }
        Ok(())
    }

    fn on_deferred(&mut self, doc: &mut Document, id: Option<TimerId>, task: Deferred) -> Result<()> {
        match task {
            Deferred::Reposition => {
                if id.is_none() || self.reposition_timer != id {
                    return Ok(());
                }
                self.reposition_timer = None;
                self.reposition(doc);
            }
            Deferred::BlurGrace => {
                if id.is_none() || self.blur_timer != id {
                    return Ok(());
                }
                self.blur_timer = None;
                if !self.registry.has_focus() {
                    self.queue.push_back(MachineInput::FocusLost);
                }
            }
            Deferred::FrameReady { epoch } => {
                self.queue.push_back(MachineInput::FrameReady { epoch });
            }
            Deferred::AnimationTimeout { epoch } => {
                log::trace!(target: "keyboard.machine", "animation timeout for epoch {epoch}");
                self.queue.push_back(MachineInput::AnimationComplete { epoch: Some(epoch) });
            }
        }
        Ok(())
    }

    fn on_key(&mut self, doc: &mut Document, token: &str) -> Result<()> {
        for event in self.facade.press(token) {
            match event {
                FacadeEvent::Change(text) => {
                    for notification in self.registry.write_from_keyboard(doc, &text)? {
                        self.outbox.push(HostRequest::Dispatch(notification));
                    }
                }
                FacadeEvent::ShiftToggled => {
                    doc.force_layout();
                    self.reposition(doc);
                }
                FacadeEvent::Hide => {
                    self.registry.clear_focus();
                    cancel(&mut self.outbox, &mut self.blur_timer);
                    if let Some(active) = self.registry.active() {
                        self.outbox.push(HostRequest::Blur(active));
                    }
                    self.queue.push_back(MachineInput::FocusLost);
                }
            }
        }
        Ok(())
    }

    fn apply_discovery(&mut self, doc: &mut Document, discovery: Discovery) -> Result<()> {
        for node in discovery.disappeared {
            if let Some(BindingSignal::FocusLost) = self.registry.remove_input(doc, node)? {
                cancel(&mut self.outbox, &mut self.reposition_timer);
                cancel(&mut self.outbox, &mut self.blur_timer);
                self.queue.push_back(MachineInput::FocusLost);
            }
        }
        for (node, _) in discovery.appeared {
            self.registry.register(doc, node)?;
        }
        Ok(())
    }

    /// Samples the bound input and feeds the resulting target to the machine.
    fn reposition(&mut self, doc: &Document) {
        let Some(active) = self.registry.active() else {
            return;
        };
        let Some(kind) = eligible::classify(doc, active) else {
            return;
        };
        let geometry = InputGeometry {
            rect: doc.rect(active).unwrap_or_default(),
            kind,
        };
        let target = Target {
            placement: self.policy.decide(&geometry, self.viewport),
            surface: self.container.surface_for(doc, active),
        };
        log::debug!(target: "keyboard.machine", "target {target:?}");
        self.queue.push_back(MachineInput::TargetChanged(target));
    }

    fn drain(&mut self, doc: &mut Document) -> Result<()> {
        while let Some(input) = self.queue.pop_front() {
            let outcome = self.machine.handle(input);
            self.history.extend(outcome.transitions);
            if self.history.len() > HISTORY_LIMIT {
                let excess = self.history.len() - HISTORY_LIMIT;
                self.history.drain(..excess);
            }
            for command in outcome.commands {
                self.execute(doc, command)?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, doc: &mut Document, command: Command) -> Result<()> {
        match command {
            Command::SetDisplayed(displayed) => self.container.set_displayed(doc, displayed)?,
            Command::SetVisibleClass(visible) => self.container.set_visible(doc, visible)?,
            Command::ApplyPlacement { from, to } => {
                self.container.apply_placement(doc, &from, &to)?;
                self.facade.set_family(to.placement.layout);
            }
            Command::Complete { epoch } => self
                .queue
                .push_back(MachineInput::AnimationComplete { epoch: Some(epoch) }),
            Command::AfterPaint { epoch } => self
                .outbox
                .push(HostRequest::AfterPaint(Deferred::FrameReady { epoch })),
            Command::Watchdog { epoch } => {
                self.set_timer(
                    self.timing.animation_timeout_ms,
                    Deferred::AnimationTimeout { epoch },
                );
            }
        }
        Ok(())
    }

    fn set_timer(&mut self, delay: Millis, task: Deferred) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.outbox.push(HostRequest::SetTimer { id, delay, task });
        id
    }

    fn finish(&mut self, doc: &mut Document, result: Result<()>, what: &str) -> Vec<HostRequest> {
        if let Err(err) = result {
            log::warn!(target: "keyboard", "{what} failed: {err}");
        }
        if let Err(err) = self.drain(doc) {
            log::warn!(target: "keyboard", "state update after {what} failed: {err}");
        }
        std::mem::take(&mut self.outbox)
    }
}

fn cancel(outbox: &mut Vec<HostRequest>, slot: &mut Option<TimerId>) {
    if let Some(id) = slot.take() {
        outbox.push(HostRequest::ClearTimer(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layouts::LayoutKind;
    use crate::policy::{LayoutFamily, Side};
    use core_types::Rect;
    use dom::test_harness::{element, number_input, place, shadow_chain, text_input};

    /// Executes host requests by hand; timers only fire when a test says so.
    struct Rig {
        doc: Document,
        kb: KeyboardService,
        app: NodeId,
        timers: Vec<(TimerId, Deferred)>,
        paints: Vec<Deferred>,
        dispatched: Vec<Event>,
        blurred: Vec<NodeId>,
    }

    impl Rig {
        fn new() -> Self {
            let mut doc = Document::new();
            let body = doc.body();
            let app = element(&mut doc, body, "home-assistant");
            let kb = KeyboardService::install(&mut doc, &KeyboardConfig::default(), Viewport::default())
                .unwrap();
            let mut rig = Self {
                doc,
                kb,
                app,
                timers: Vec::new(),
                paints: Vec::new(),
                dispatched: Vec::new(),
                blurred: Vec::new(),
            };
            rig.kb.attach(&mut rig.doc, app).unwrap();
            rig
        }

        fn apply(&mut self, requests: Vec<HostRequest>) {
            for request in requests {
                match request {
                    HostRequest::SetTimer { id, task, .. } => self.timers.push((id, task)),
                    HostRequest::ClearTimer(id) => self.timers.retain(|(t, _)| *t != id),
                    HostRequest::AfterPaint(task) => self.paints.push(task),
                    HostRequest::Dispatch(event) => self.dispatched.push(event),
                    HostRequest::Blur(node) => self.blurred.push(node),
                }
            }
        }

        fn deliver(&mut self, event: Event) {
            for delivery in self.doc.dispatch(&event) {
                if self.kb.owns(delivery.listener) {
                    let requests = self.kb.handle_event(&mut self.doc, &delivery, &event);
                    self.apply(requests);
                }
            }
        }

        fn fire(&mut self, wanted: Deferred) {
            let pos = self
                .timers
                .iter()
                .position(|(_, task)| *task == wanted)
                .unwrap_or_else(|| panic!("no {wanted:?} timer in {:?}", self.timers));
            let (id, task) = self.timers.remove(pos);
            let requests = self.kb.handle_timer(&mut self.doc, id, task);
            self.apply(requests);
        }

        fn paint(&mut self) {
            for task in std::mem::take(&mut self.paints) {
                let requests = self.kb.handle_after_paint(&mut self.doc, task);
                self.apply(requests);
            }
        }

        fn transition_end(&mut self) {
            let container = self.kb.container();
            self.deliver(Event::transition_end(container));
        }

        fn flush_mutations(&mut self) {
            for observer in self.doc.observers_with_records() {
                let records = self.doc.take_records(observer);
                if self.kb.observes(observer) {
                    let requests = self.kb.handle_mutations(&mut self.doc, observer, &records);
                    self.apply(requests);
                }
            }
        }

        fn input_at(&mut self, rect: Rect) -> NodeId {
            let input = text_input(&mut self.doc, self.app);
            place(&mut self.doc, input, rect);
            self.flush_mutations();
            input
        }

        fn show(&mut self, input: NodeId) {
            self.deliver(Event::focus(input));
            self.fire(Deferred::Reposition);
            self.paint();
            self.transition_end();
            assert_eq!(self.kb.visibility(), Visibility::Visible);
        }
    }

    fn pairs(transitions: Vec<Transition>) -> Vec<(Visibility, Visibility)> {
        transitions.into_iter().map(|t| (t.from, t.to)).collect()
    }

    #[test]
    fn focus_shows_after_debounce_and_paint() {
        let mut rig = Rig::new();
        let input = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));

        rig.deliver(Event::focus(input));
        assert_eq!(rig.kb.visibility(), Visibility::Hidden);
        assert_eq!(rig.kb.active_input(), Some(input));

        rig.fire(Deferred::Reposition);
        assert_eq!(rig.kb.visibility(), Visibility::Showing);
        assert!(rig.doc.is_displayed(rig.kb.container()));
        assert!(!rig.kb.is_shown(&rig.doc), "visible class waits for a paint");

        rig.paint();
        assert!(rig.kb.is_shown(&rig.doc));
        rig.transition_end();
        assert_eq!(rig.kb.visibility(), Visibility::Visible);
        assert_eq!(rig.kb.current().placement.side, Side::Bottom);
    }

    #[test]
    fn numeric_field_moves_before_showing() {
        let mut rig = Rig::new();
        let input = number_input(&mut rig.doc, rig.app);
        place(&mut rig.doc, input, Rect::new(1100.0, 300.0, 100.0, 30.0));
        rig.flush_mutations();

        rig.deliver(Event::focus(input));
        rig.fire(Deferred::Reposition);
        assert_eq!(
            pairs(rig.kb.take_transitions()),
            vec![
                (Visibility::Hidden, Visibility::Moving),
                (Visibility::Moving, Visibility::Hidden),
                (Visibility::Hidden, Visibility::Showing),
            ]
        );
        let container = rig.kb.container();
        assert!(rig.doc.has_class(container, "kb-left"));
        assert!(rig.doc.has_class(container, "kb-numeric"));
        assert_eq!(rig.kb.facade().layout(), LayoutKind::Numeric);
        assert_eq!(rig.kb.current().placement.layout, LayoutFamily::Numeric);
    }

    #[test]
    fn blur_then_refocus_within_grace_stays_visible() {
        let mut rig = Rig::new();
        let a = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));
        let b = rig.input_at(Rect::new(10.0, 150.0, 200.0, 30.0));
        rig.show(a);
        rig.kb.take_transitions();

        rig.deliver(Event::blur(a));
        rig.deliver(Event::focus(b));
        assert!(
            !rig.timers.iter().any(|(_, t)| *t == Deferred::BlurGrace),
            "refocus cancels the grace timer"
        );
        rig.fire(Deferred::Reposition);
        assert_eq!(rig.kb.visibility(), Visibility::Visible);
        assert!(rig.kb.take_transitions().is_empty());
        assert_eq!(rig.kb.active_input(), Some(b));
    }

    #[test]
    fn blur_hides_after_grace() {
        let mut rig = Rig::new();
        let input = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));
        rig.show(input);

        rig.deliver(Event::blur(input));
        assert_eq!(rig.kb.visibility(), Visibility::Visible);
        rig.fire(Deferred::BlurGrace);
        assert_eq!(rig.kb.visibility(), Visibility::Hiding);
        assert!(!rig.kb.is_shown(&rig.doc));
        rig.transition_end();
        assert_eq!(rig.kb.visibility(), Visibility::Hidden);
        assert!(!rig.doc.is_displayed(rig.kb.container()));
    }

    #[test]
    fn removing_bound_input_hides() {
        let mut rig = Rig::new();
        let input = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));
        rig.show(input);

        rig.doc.remove(input).unwrap();
        rig.flush_mutations();
        assert_eq!(rig.kb.visibility(), Visibility::Hiding);
        assert_eq!(rig.kb.active_input(), None);
        assert!(!rig.kb.registry().is_registered(input));
    }

    #[test]
    fn hide_key_blurs_input_and_hides() {
        let mut rig = Rig::new();
        let input = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));
        rig.show(input);

        let requests = rig.kb.press_key(&mut rig.doc, "{hide}");
        rig.apply(requests);
        assert_eq!(rig.blurred, vec![input]);
        assert_eq!(rig.kb.visibility(), Visibility::Hiding);
    }

    #[test]
    fn typing_writes_value_and_requests_notifications() {
        let mut rig = Rig::new();
        let input = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));
        rig.doc.set_value(input, "4").unwrap();
        rig.deliver(Event::focus(input));

        let requests = rig.kb.press_key(&mut rig.doc, "2");
        rig.apply(requests);
        assert_eq!(rig.doc.value(input), Some("42"));
        let kinds: Vec<EventType> = rig.dispatched.iter().map(|e| e.ty).collect();
        assert_eq!(kinds, vec![EventType::Input, EventType::Change]);
    }

    #[test]
    fn external_edit_updates_widget() {
        let mut rig = Rig::new();
        let input = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));
        rig.deliver(Event::focus(input));

        rig.doc.set_value(input, "pasted").unwrap();
        rig.deliver(Event::insert_text(input, "pasted"));
        assert_eq!(rig.kb.facade().text(), "pasted");
    }

    #[test]
    fn stale_watchdog_does_not_disturb_visible() {
        let mut rig = Rig::new();
        let input = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));
        rig.show(input);
        rig.kb.take_transitions();

        let epoch = rig.kb.machine.epoch();
        rig.fire(Deferred::AnimationTimeout { epoch });
        assert_eq!(rig.kb.visibility(), Visibility::Visible);
        assert!(rig.kb.take_transitions().is_empty());
    }

    #[test]
    fn watchdog_completes_stuck_hide() {
        let mut rig = Rig::new();
        let input = rig.input_at(Rect::new(10.0, 100.0, 200.0, 30.0));
        rig.show(input);
        rig.deliver(Event::blur(input));
        rig.fire(Deferred::BlurGrace);
        assert_eq!(rig.kb.visibility(), Visibility::Hiding);

        let epoch = rig.kb.machine.epoch();
        rig.fire(Deferred::AnimationTimeout { epoch });
        assert_eq!(rig.kb.visibility(), Visibility::Hidden);
    }

    #[test]
    fn inputs_in_late_nested_shadow_roots_register() {
        let mut rig = Rig::new();
        let roots = shadow_chain(&mut rig.doc, rig.app, 3);
        rig.flush_mutations();
        let input = text_input(&mut rig.doc, roots[2]);
        rig.flush_mutations();
        assert!(rig.kb.registry().is_registered(input));
        assert!(rig.doc.has_class(input, "keyboard-enabled"));
    }
}
