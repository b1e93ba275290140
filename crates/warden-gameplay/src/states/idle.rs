use crate::actor::ActorContext;
use crate::animation::AnimParam;
use crate::fsm::{State, StateKind, Transition};

const EXITS: &[StateKind] = &[StateKind::Attack, StateKind::Move];
const PATROL_EXITS: &[StateKind] = &[StateKind::Attack, StateKind::Move, StateKind::Patrol];

/// Stands still and waits for the detector to report a target.
///
/// Actors with a patrol route resume patrolling after a random dwell.
#[derive(Debug, Clone)]
pub struct IdleState {
    /// Kinds this instance may request
    exits: &'static [StateKind],
    /// Seconds left before the next patrol leg
    dwell: f32,
}

impl Default for IdleState {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleState {
    /// Creates an idle state for a stationary actor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            exits: EXITS,
            dwell: 0.0,
        }
    }

    /// Creates an idle state that hands control back to patrol.
    #[must_use]
    pub const fn patrolling() -> Self {
        Self {
            exits: PATROL_EXITS,
            dwell: 0.0,
        }
    }

    /// Returns the seconds left before patrol resumes.
    #[must_use]
    pub const fn dwell_remaining(&self) -> f32 {
        self.dwell
    }

    fn resumes_patrol(&self) -> bool {
        self.exits.contains(&StateKind::Patrol)
    }
}

impl State<ActorContext> for IdleState {
    fn kind(&self) -> StateKind {
        StateKind::Idle
    }

    fn exits(&self) -> &'static [StateKind] {
        self.exits
    }

    fn on_enter(&mut self, ctx: &mut ActorContext) -> Transition {
        ctx.animator.set_float(AnimParam::ForwardSpeed, 0.0);
        self.dwell = if self.resumes_patrol() && ctx.has_patrol() {
            ctx.roll_dwell()
        } else {
            0.0
        };
        Transition::Stay
    }

    fn on_update(&mut self, ctx: &mut ActorContext, dt: f32) -> Transition {
        if ctx.target().is_some() {
            return if ctx.is_attackable() {
                Transition::To(StateKind::Attack)
            } else {
                Transition::To(StateKind::Move)
            };
        }

        if self.resumes_patrol() && ctx.has_patrol() {
            self.dwell -= dt;
            if self.dwell <= 0.0 {
                return Transition::To(StateKind::Patrol);
            }
        }
        Transition::Stay
    }
}
