use crate::actor::ActorContext;
use crate::animation::AnimParam;
use crate::fsm::{State, StateKind, Transition};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ordered, cyclic list of waypoints. The patrol capability of an actor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatrolRoute {
    waypoints: Vec<Vec3>,
    index: usize,
}

impl PatrolRoute {
    /// Creates a route starting at the first waypoint.
    #[must_use]
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self {
            waypoints,
            index: 0,
        }
    }

    /// Returns the waypoints.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Returns the index of the waypoint currently headed for.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Checks if the route has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Returns the waypoint currently headed for.
    #[must_use]
    pub fn current(&self) -> Option<Vec3> {
        self.waypoints.get(self.index).copied()
    }

    /// Moves on to the next waypoint, wrapping after the last one.
    pub fn advance(&mut self) -> Option<Vec3> {
        if self.waypoints.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.waypoints.len();
        self.current()
    }
}

/// Walks the actor's patrol route one leg at a time.
///
/// Reaching a waypoint hands control back to Idle, so detection gets a
/// chance to interrupt before the next leg starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatrolState;

impl State<ActorContext> for PatrolState {
    fn kind(&self) -> StateKind {
        StateKind::Patrol
    }

    fn exits(&self) -> &'static [StateKind] {
        &[StateKind::Idle, StateKind::Attack, StateKind::Move]
    }

    fn on_enter(&mut self, ctx: &mut ActorContext) -> Transition {
        let stop = ctx.config.patrol_stopping_distance;
        ctx.navigator.set_stopping_distance(stop);

        match ctx.patrol.as_ref().and_then(PatrolRoute::current) {
            Some(waypoint) => {
                ctx.navigator.set_destination(waypoint);
                Transition::Stay
            }
            None => Transition::To(StateKind::Idle),
        }
    }

    fn on_update(&mut self, ctx: &mut ActorContext, _dt: f32) -> Transition {
        if ctx.target().is_some() {
            return if ctx.is_attackable() {
                Transition::To(StateKind::Attack)
            } else {
                Transition::To(StateKind::Move)
            };
        }

        if ctx.navigator.has_arrived() {
            if let Some(route) = ctx.patrol.as_mut() {
                route.advance();
                debug!(actor = %ctx.id, next = route.index(), "waypoint reached");
            }
            return Transition::To(StateKind::Idle);
        }

        let speed = ctx.navigator.speed();
        ctx.animator.set_float(AnimParam::ForwardSpeed, speed);
        Transition::Stay
    }

    fn on_exit(&mut self, ctx: &mut ActorContext) {
        ctx.navigator.reset_path();
    }
}
