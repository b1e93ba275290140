use crate::actor::ActorContext;
use crate::animation::AnimParam;
use crate::fsm::{State, StateKind, Transition};
use tracing::debug;

/// Faces the target and swings whenever the cooldown allows.
///
/// Firing the swing only signals the animation layer. Damage lands when
/// that layer reports the attack frame back through
/// [`World::attack_frame_reached`](crate::world::World::attack_frame_reached).
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackState {
    swings: u32,
}

impl AttackState {
    /// Returns the number of swings started by this instance.
    #[must_use]
    pub const fn swings(&self) -> u32 {
        self.swings
    }
}

impl State<ActorContext> for AttackState {
    fn kind(&self) -> StateKind {
        StateKind::Attack
    }

    fn exits(&self) -> &'static [StateKind] {
        &[StateKind::Idle, StateKind::Move]
    }

    fn on_enter(&mut self, ctx: &mut ActorContext) -> Transition {
        ctx.navigator.reset_path();
        ctx.animator.set_float(AnimParam::ForwardSpeed, 0.0);
        Transition::Stay
    }

    fn on_update(&mut self, ctx: &mut ActorContext, dt: f32) -> Transition {
        if ctx.target().is_none() {
            return Transition::To(StateKind::Idle);
        }
        if !ctx.is_attackable() {
            return Transition::To(StateKind::Move);
        }

        ctx.face_target(dt);
        if ctx.can_attack() {
            ctx.animator.set_trigger(AnimParam::Attack);
            ctx.cooldown.restart();
            self.swings += 1;
            debug!(actor = %ctx.id, swings = self.swings, "attack swing");
        }
        Transition::Stay
    }
}
