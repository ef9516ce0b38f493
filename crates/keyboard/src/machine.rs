//! Visibility / position state machine.
//!
//! Pure logic: inputs in, [`Command`]s out. The service executes the commands
//! against the container and the host. Every input is handled completely,
//! including all follow-up transitions it enables, before the next one.
//!
//! | state   | condition                                 | next    |
//! |---------|-------------------------------------------|---------|
//! | hidden  | target != current                         | moving  |
//! | hidden  | focus, target == current, placement fresh | showing |
//! | moving  | animation complete                        | hidden  |
//! | showing | animation complete                        | visible |
//! | visible | no focus, or target != current            | hiding  |
//! | hiding  | animation complete                        | hidden  |
//!
//! Invariants:
//! - the visible class is only ever added in `showing`, with focus held and
//!   `target == current`
//! - `current` only changes on entering `moving`
//! - completions carrying a stale epoch are dropped

use crate::policy::Placement;
use dom::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Hidden,
    Moving,
    Showing,
    Visible,
    Hiding,
}

impl Visibility {
    pub fn is_animating(self) -> bool {
        matches!(
            self,
            Visibility::Moving | Visibility::Showing | Visibility::Hiding
        )
    }
}

/// Where the keyboard should be: placement plus the element it is mounted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub placement: Placement,
    pub surface: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineInput {
    FocusGained,
    FocusLost,
    /// Debounced geometry sampled; `target` is now settled.
    TargetChanged(Target),
    /// `None` comes from a real transition end; `Some` from the moving step
    /// or the watchdog and must match the current epoch.
    AnimationComplete { epoch: Option<u64> },
    /// The frame after `showing` un-hid the container was painted.
    FrameReady { epoch: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SetDisplayed(bool),
    SetVisibleClass(bool),
    /// Snap to `to` without animating, then report completion.
    ApplyPlacement { from: Target, to: Target },
    /// Feed back `AnimationComplete { epoch: Some(epoch) }`.
    Complete { epoch: u64 },
    /// Run `FrameReady { epoch }` after the next paint.
    AfterPaint { epoch: u64 },
    /// Arm the animation timeout for `epoch`.
    Watchdog { epoch: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: Visibility,
    pub to: Visibility,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub transitions: Vec<Transition>,
    pub commands: Vec<Command>,
}

pub struct VisibilityMachine {
    state: Visibility,
    current: Target,
    target: Target,
    has_focus: bool,
    /// Geometry has been sampled since focus was last gained.
    settled: bool,
    displayed: bool,
    epoch: u64,
}

impl VisibilityMachine {
    pub fn new(initial: Target) -> Self {
        Self {
            state: Visibility::Hidden,
            current: initial,
            target: initial,
            has_focus: false,
            settled: false,
            displayed: false,
            epoch: 0,
        }
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn current(&self) -> Target {
        self.current
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The container was put under `to` by its owner because `from` left the
    /// document. Targets naming `from` now name `to`; no transition runs.
    pub fn rebase_surface(&mut self, from: NodeId, to: NodeId) {
        for t in [&mut self.current, &mut self.target] {
            if t.surface == from {
                t.surface = to;
            }
        }
    }

    pub fn handle(&mut self, input: MachineInput) -> Outcome {
        let mut out = Outcome::default();
        match input {
            MachineInput::FocusGained => {
                self.has_focus = true;
                self.settled = false;
            }
            MachineInput::FocusLost => self.has_focus = false,
            MachineInput::TargetChanged(target) => {
                self.target = target;
                self.settled = true;
            }
            MachineInput::AnimationComplete { epoch } => self.complete(epoch, &mut out),
            MachineInput::FrameReady { epoch } => self.frame_ready(epoch, &mut out),
        }
        self.evaluate(&mut out);
        out
    }

    fn complete(&mut self, epoch: Option<u64>, out: &mut Outcome) {
        if !self.state.is_animating() || epoch.is_some_and(|e| e != self.epoch) {
            log::trace!(
                target: "keyboard.machine",
                "dropping completion {epoch:?} in {:?} (epoch {})",
                self.state,
                self.epoch
            );
            return;
        }
        match self.state {
            Visibility::Moving => self.enter(Visibility::Hidden, out),
            Visibility::Showing => self.enter(Visibility::Visible, out),
            Visibility::Hiding => {
                self.enter(Visibility::Hidden, out);
                if !self.has_focus {
                    self.set_displayed(false, out);
                }
            }
            Visibility::Hidden | Visibility::Visible => {}
        }
    }

    fn frame_ready(&mut self, epoch: u64, out: &mut Outcome) {
        if self.state != Visibility::Showing || epoch != self.epoch {
            return;
        }
        if self.has_focus && self.target == self.current {
            out.commands.push(Command::SetVisibleClass(true));
            out.commands.push(Command::Watchdog { epoch });
        } else {
            // conditions changed while waiting for paint: abandon the show
            self.enter(Visibility::Hidden, out);
        }
    }

    /// Runs the table until no row applies.
    fn evaluate(&mut self, out: &mut Outcome) {
        loop {
            match self.state {
                Visibility::Hidden if self.target != self.current => {
                    let from = self.current;
                    let to = self.target;
                    self.enter(Visibility::Moving, out);
                    self.current = to;
                    out.commands.push(Command::ApplyPlacement { from, to });
                    out.commands.push(Command::Complete { epoch: self.epoch });
                    // Moving waits for its own completion.
                    return;
                }
                Visibility::Hidden if self.has_focus && self.settled => {
                    self.enter(Visibility::Showing, out);
                    self.set_displayed(true, out);
                    out.commands.push(Command::AfterPaint { epoch: self.epoch });
                    return;
                }
                Visibility::Hidden => {
                    if !self.has_focus {
                        self.set_displayed(false, out);
                    }
                    return;
                }
                Visibility::Visible if !self.has_focus || self.target != self.current => {
                    self.enter(Visibility::Hiding, out);
                    out.commands.push(Command::SetVisibleClass(false));
                    out.commands.push(Command::Watchdog { epoch: self.epoch });
                    return;
                }
                Visibility::Visible
                | Visibility::Moving
                | Visibility::Showing
                | Visibility::Hiding => return,
            }
        }
    }

    fn enter(&mut self, to: Visibility, out: &mut Outcome) {
        let from = self.state;
        self.state = to;
        if to.is_animating() {
            self.epoch += 1;
        }
        log::debug!(target: "keyboard.machine", "{from:?} -> {to:?} (epoch {})", self.epoch);
        out.transitions.push(Transition { from, to });
    }

    fn set_displayed(&mut self, displayed: bool, out: &mut Outcome) {
        if self.displayed != displayed {
            self.displayed = displayed;
            out.commands.push(Command::SetDisplayed(displayed));
        }
    }
}
