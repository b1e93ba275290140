//! Finite state machine shared by every non-player actor.
//!
//! A [`StateMachine`] owns one instance of each registered [`State`] and
//! keeps exactly one of them current. State instances are created once and
//! reused across activations. Transition rules live in the states
//! themselves: hooks return a [`Transition`] and the machine carries it out
//! after the hook has returned.
//!
//! The machine is generic over the context `C` the states operate on, so
//! it never holds a reference back into its owner.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Longest chain of transitions requested from `on_enter` hooks before the
/// machine stops following them.
pub const MAX_CHAINED_TRANSITIONS: usize = 8;

/// Variant tag of a state; the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateKind {
    /// Standing still, watching for targets
    Idle,
    /// Chasing a detected target
    Move,
    /// Attacking a target in range
    Attack,
    /// Walking a waypoint route
    Patrol,
    /// Dead; terminal
    Death,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Move => "Move",
            Self::Attack => "Attack",
            Self::Patrol => "Patrol",
            Self::Death => "Death",
        };
        f.write_str(name)
    }
}

/// What a lifecycle hook asks the machine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep the current state
    Stay,
    /// Switch to the given state
    To(StateKind),
}

/// Error types for state machine operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsmError {
    /// Transition requested to a kind nobody registered
    #[error("State {0} is not registered")]
    UnregisteredState(StateKind),
    /// A second instance of a kind was registered
    #[error("State {0} is already registered")]
    DuplicateState(StateKind),
    /// Registration attempted after the machine started updating
    #[error("Cannot register {0} after the machine started running")]
    RegistrationClosed(StateKind),
    /// A registered state can request a kind that is not registered
    #[error("State {from} may transition to {to}, which is not registered")]
    MissingExit {
        /// State declaring the exit
        from: StateKind,
        /// Kind that is missing
        to: StateKind,
    },
}

/// Result type for state machine operations.
pub type FsmResult<T> = Result<T, FsmError>;

/// A reusable unit of behavior.
///
/// Hooks run in this order over an activation window: `on_initialize` once
/// at registration, then `on_enter`, any number of `on_update`, and
/// `on_exit`. The same instance goes through many windows.
pub trait State<C> {
    /// Registry key of this state.
    fn kind(&self) -> StateKind;

    /// Kinds this state may request. Checked by [`StateMachine::validate`].
    fn exits(&self) -> &'static [StateKind] {
        &[]
    }

    /// Called once when the state is registered.
    fn on_initialize(&mut self, _ctx: &mut C) {}

    /// Called every time the state becomes current.
    fn on_enter(&mut self, _ctx: &mut C) -> Transition {
        Transition::Stay
    }

    /// Called every tick while the state is current.
    fn on_update(&mut self, ctx: &mut C, dt: f32) -> Transition;

    /// Called every time the state stops being current.
    fn on_exit(&mut self, _ctx: &mut C) {}
}

/// Owner and driver of exactly one current state.
pub struct StateMachine<C> {
    /// One instance per kind
    states: AHashMap<StateKind, Box<dyn State<C>>>,
    /// Kind of the current state
    current: StateKind,
    /// Kind that was current before the last transition
    previous: Option<StateKind>,
    /// Seconds spent in the current state
    time_in_state: f32,
    /// Set by the first update; closes explicit registration
    running: bool,
    /// Transition requested by the initial state's enter hook that could
    /// not be honored yet
    pending: Option<StateKind>,
    /// Number of transitions performed
    transitions: u64,
}

impl<C> fmt::Debug for StateMachine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.states.keys().copied().collect();
        kinds.sort();
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("registered", &kinds)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl<C> StateMachine<C> {
    /// Creates a machine, registering and entering `initial`.
    ///
    /// If the initial state's enter hook asks for a kind that is registered
    /// later, the transition is carried out at the start of the first update.
    pub fn new(ctx: &mut C, mut initial: Box<dyn State<C>>) -> Self {
        let kind = initial.kind();
        initial.on_initialize(ctx);

        let mut states = AHashMap::new();
        states.insert(kind, initial);

        let mut machine = Self {
            states,
            current: kind,
            previous: None,
            time_in_state: 0.0,
            running: false,
            pending: None,
            transitions: 0,
        };
        debug!(state = %kind, "state machine initialized");
        if let Transition::To(next) = machine.enter_current(ctx) {
            machine.pending = Some(next);
        }
        machine
    }

    /// Returns the kind of the current state.
    #[must_use]
    pub const fn current(&self) -> StateKind {
        self.current
    }

    /// Returns the kind that was current before the last transition.
    #[must_use]
    pub const fn previous(&self) -> Option<StateKind> {
        self.previous
    }

    /// Returns the seconds spent in the current state.
    #[must_use]
    pub const fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// Returns the number of transitions performed so far.
    #[must_use]
    pub const fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Checks if updates have started.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Checks if a kind is registered.
    #[must_use]
    pub fn is_registered(&self, kind: StateKind) -> bool {
        self.states.contains_key(&kind)
    }

    /// Returns the number of registered states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if no state is registered (never the case after `new`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Adds a state to the registry and runs its initialize hook.
    ///
    /// Only allowed before the first update. A second instance of an
    /// already registered kind is refused and the first one kept.
    pub fn register_state(&mut self, ctx: &mut C, mut state: Box<dyn State<C>>) -> FsmResult<()> {
        let kind = state.kind();
        if self.running {
            warn!(state = %kind, "registration after start refused");
            return Err(FsmError::RegistrationClosed(kind));
        }
        if self.states.contains_key(&kind) {
            warn!(state = %kind, "duplicate state registration ignored");
            return Err(FsmError::DuplicateState(kind));
        }
        state.on_initialize(ctx);
        self.states.insert(kind, state);
        Ok(())
    }

    /// Checks that every exit declared by a registered state is registered.
    pub fn validate(&self) -> FsmResult<()> {
        let mut kinds: Vec<_> = self.states.keys().copied().collect();
        kinds.sort();
        for from in kinds {
            let Some(state) = self.states.get(&from) else {
                continue;
            };
            if let Some(&to) = state.exits().iter().find(|k| !self.states.contains_key(k)) {
                return Err(FsmError::MissingExit { from, to });
            }
        }
        Ok(())
    }

    /// Switches to the registered state of `kind`.
    ///
    /// The current state's exit hook runs before the new state's enter hook,
    /// also when `kind` is already current. Transitions requested by enter
    /// hooks are followed, up to [`MAX_CHAINED_TRANSITIONS`]. Returns the
    /// kind that ends up current.
    pub fn change_state(&mut self, ctx: &mut C, kind: StateKind) -> FsmResult<StateKind> {
        let mut next = kind;
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            if !self.states.contains_key(&next) {
                return Err(FsmError::UnregisteredState(next));
            }

            if let Some(state) = self.states.get_mut(&self.current) {
                state.on_exit(ctx);
            }
            debug!(from = %self.current, to = %next, "state transition");
            self.previous = Some(self.current);
            self.current = next;
            self.time_in_state = 0.0;
            self.transitions += 1;

            match self.enter_current(ctx) {
                Transition::Stay => return Ok(self.current),
                Transition::To(requested) => next = requested,
            }
        }
        warn!(
            state = %self.current,
            limit = MAX_CHAINED_TRANSITIONS,
            "transition chain cut short"
        );
        Ok(self.current)
    }

    /// Switches to `state`'s kind, registering `state` first if the kind is
    /// unknown. If the kind is already registered, the existing instance is
    /// reused and `state` is dropped.
    pub fn change_to(&mut self, ctx: &mut C, mut state: Box<dyn State<C>>) -> FsmResult<StateKind> {
        let kind = state.kind();
        if !self.states.contains_key(&kind) {
            state.on_initialize(ctx);
            self.states.insert(kind, state);
        }
        self.change_state(ctx, kind)
    }

    /// Runs the current state's update hook and carries out its request.
    pub fn update(&mut self, ctx: &mut C, dt: f32) -> FsmResult<StateKind> {
        self.running = true;
        if let Some(kind) = self.pending.take() {
            self.change_state(ctx, kind)?;
        }

        self.time_in_state += dt;
        let transition = match self.states.get_mut(&self.current) {
            Some(state) => state.on_update(ctx, dt),
            None => Transition::Stay,
        };
        match transition {
            Transition::Stay => Ok(self.current),
            Transition::To(kind) => self.change_state(ctx, kind),
        }
    }

    fn enter_current(&mut self, ctx: &mut C) -> Transition {
        self.states
            .get_mut(&self.current)
            .map_or(Transition::Stay, |state| state.on_enter(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test context: a log of hook invocations.
    #[derive(Default)]
    struct Trace {
        calls: Vec<String>,
    }

    /// Configurable state that records its hooks.
    struct Probe {
        kind: StateKind,
        exits: &'static [StateKind],
        enter_request: Option<StateKind>,
        update_request: Option<StateKind>,
    }

    impl Probe {
        fn boxed(kind: StateKind) -> Box<dyn State<Trace>> {
            Box::new(Self {
                kind,
                exits: &[],
                enter_request: None,
                update_request: None,
            })
        }
    }

    impl State<Trace> for Probe {
        fn kind(&self) -> StateKind {
            self.kind
        }

        fn exits(&self) -> &'static [StateKind] {
            self.exits
        }

        fn on_initialize(&mut self, ctx: &mut Trace) {
            ctx.calls.push(format!("init {}", self.kind));
        }

        fn on_enter(&mut self, ctx: &mut Trace) -> Transition {
            ctx.calls.push(format!("enter {}", self.kind));
            self.enter_request.map_or(Transition::Stay, Transition::To)
        }

        fn on_update(&mut self, ctx: &mut Trace, _dt: f32) -> Transition {
            ctx.calls.push(format!("update {}", self.kind));
            self.update_request.map_or(Transition::Stay, Transition::To)
        }

        fn on_exit(&mut self, ctx: &mut Trace) {
            ctx.calls.push(format!("exit {}", self.kind));
        }
    }

    fn machine(ctx: &mut Trace) -> StateMachine<Trace> {
        let mut fsm = StateMachine::new(ctx, Probe::boxed(StateKind::Idle));
        fsm.register_state(ctx, Probe::boxed(StateKind::Move))
            .expect("register move");
        fsm.register_state(ctx, Probe::boxed(StateKind::Attack))
            .expect("register attack");
        ctx.calls.clear();
        fsm
    }

    #[test]
    fn test_new_initializes_then_enters() {
        let mut ctx = Trace::default();
        let fsm = StateMachine::new(&mut ctx, Probe::boxed(StateKind::Idle));
        assert_eq!(fsm.current(), StateKind::Idle);
        assert_eq!(ctx.calls, vec!["init Idle", "enter Idle"]);
    }

    #[test]
    fn test_change_state_exits_before_entering() {
        let mut ctx = Trace::default();
        let mut fsm = machine(&mut ctx);

        let current = fsm.change_state(&mut ctx, StateKind::Attack).expect("change");
        assert_eq!(current, StateKind::Attack);
        assert_eq!(fsm.previous(), Some(StateKind::Idle));
        assert_eq!(ctx.calls, vec!["exit Idle", "enter Attack"]);
    }

    #[test]
    fn test_change_to_same_kind_reruns_hooks() {
        let mut ctx = Trace::default();
        let mut fsm = machine(&mut ctx);

        fsm.change_state(&mut ctx, StateKind::Idle).expect("change");
        assert_eq!(ctx.calls, vec!["exit Idle", "enter Idle"]);
        assert_eq!(fsm.transitions(), 1);
    }

    #[test]
    fn test_update_delegates_to_current_only() {
        let mut ctx = Trace::default();
        let mut fsm = machine(&mut ctx);

        fsm.update(&mut ctx, 0.1).expect("update");
        fsm.change_state(&mut ctx, StateKind::Move).expect("change");
        ctx.calls.clear();
        fsm.update(&mut ctx, 0.1).expect("update");

        assert_eq!(ctx.calls, vec!["update Move"]);
        assert!((fsm.time_in_state() - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_update_transition_request() {
        let mut ctx = Trace::default();
        let mut fsm = StateMachine::new(
            &mut ctx,
            Box::new(Probe {
                kind: StateKind::Idle,
                exits: &[StateKind::Attack],
                enter_request: None,
                update_request: Some(StateKind::Attack),
            }),
        );
        fsm.register_state(&mut ctx, Probe::boxed(StateKind::Attack))
            .expect("register");
        ctx.calls.clear();

        assert_eq!(fsm.update(&mut ctx, 0.1), Ok(StateKind::Attack));
        assert_eq!(ctx.calls, vec!["update Idle", "exit Idle", "enter Attack"]);
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut ctx = Trace::default();
        let mut fsm = machine(&mut ctx);

        let result = fsm.register_state(&mut ctx, Probe::boxed(StateKind::Move));
        assert_eq!(result, Err(FsmError::DuplicateState(StateKind::Move)));
        assert!(ctx.calls.is_empty());
        assert_eq!(fsm.len(), 3);
    }

    #[test]
    fn test_registration_closed_after_update() {
        let mut ctx = Trace::default();
        let mut fsm = machine(&mut ctx);
        fsm.update(&mut ctx, 0.1).expect("update");

        let result = fsm.register_state(&mut ctx, Probe::boxed(StateKind::Death));
        assert_eq!(result, Err(FsmError::RegistrationClosed(StateKind::Death)));
        assert!(fsm.is_running());
    }

    #[test]
    fn test_change_to_unregistered_kind_fails() {
        let mut ctx = Trace::default();
        let mut fsm = machine(&mut ctx);

        let result = fsm.change_state(&mut ctx, StateKind::Death);
        assert_eq!(result, Err(FsmError::UnregisteredState(StateKind::Death)));
        assert_eq!(fsm.current(), StateKind::Idle);
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn test_change_to_registers_on_demand_once() {
        let mut ctx = Trace::default();
        let mut fsm = machine(&mut ctx);
        fsm.update(&mut ctx, 0.1).expect("update");
        ctx.calls.clear();

        fsm.change_to(&mut ctx, Probe::boxed(StateKind::Death))
            .expect("change");
        assert_eq!(ctx.calls, vec!["init Death", "exit Idle", "enter Death"]);

        ctx.calls.clear();
        fsm.change_to(&mut ctx, Probe::boxed(StateKind::Death))
            .expect("change");
        assert_eq!(ctx.calls, vec!["exit Death", "enter Death"]);
    }

    #[test]
    fn test_enter_hook_chains_transition() {
        let mut ctx = Trace::default();
        let mut fsm = machine(&mut ctx);
        fsm.register_state(
            &mut ctx,
            Box::new(Probe {
                kind: StateKind::Patrol,
                exits: &[StateKind::Idle],
                enter_request: Some(StateKind::Idle),
                update_request: None,
            }),
        )
        .expect("register");
        ctx.calls.clear();

        assert_eq!(fsm.change_state(&mut ctx, StateKind::Patrol), Ok(StateKind::Idle));
        assert_eq!(
            ctx.calls,
            vec!["exit Idle", "enter Patrol", "exit Patrol", "enter Idle"]
        );
    }

    #[test]
    fn test_enter_chain_is_bounded() {
        let mut ctx = Trace::default();
        let bouncing = |kind, other| -> Box<dyn State<Trace>> {
            Box::new(Probe {
                kind,
                exits: &[],
                enter_request: Some(other),
                update_request: None,
            })
        };
        let mut fsm = StateMachine::new(&mut ctx, Probe::boxed(StateKind::Idle));
        fsm.register_state(&mut ctx, bouncing(StateKind::Move, StateKind::Attack))
            .expect("register");
        fsm.register_state(&mut ctx, bouncing(StateKind::Attack, StateKind::Move))
            .expect("register");

        assert!(fsm.change_state(&mut ctx, StateKind::Move).is_ok());
        assert_eq!(fsm.transitions(), MAX_CHAINED_TRANSITIONS as u64);
    }

    #[test]
    fn test_initial_enter_request_waits_for_first_update() {
        let mut ctx = Trace::default();
        let mut fsm = StateMachine::new(
            &mut ctx,
            Box::new(Probe {
                kind: StateKind::Patrol,
                exits: &[StateKind::Idle],
                enter_request: Some(StateKind::Idle),
                update_request: None,
            }),
        );
        fsm.register_state(&mut ctx, Probe::boxed(StateKind::Idle))
            .expect("register");
        assert_eq!(fsm.current(), StateKind::Patrol);

        fsm.update(&mut ctx, 0.1).expect("update");
        assert_eq!(fsm.current(), StateKind::Idle);
    }

    #[test]
    fn test_validate_reports_missing_exit() {
        let mut ctx = Trace::default();
        let fsm = StateMachine::new(
            &mut ctx,
            Box::new(Probe {
                kind: StateKind::Idle,
                exits: &[StateKind::Attack],
                enter_request: None,
                update_request: None,
            }),
        );
        assert_eq!(
            fsm.validate(),
            Err(FsmError::MissingExit {
                from: StateKind::Idle,
                to: StateKind::Attack,
            })
        );
    }

    #[test]
    fn test_validate_passes_when_complete() {
        let mut ctx = Trace::default();
        let fsm = machine(&mut ctx);
        assert!(fsm.validate().is_ok());
    }
}
