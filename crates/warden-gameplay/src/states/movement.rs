use crate::actor::ActorContext;
use crate::animation::AnimParam;
use crate::fsm::{State, StateKind, Transition};

/// Fraction of the attack range the chase stops short at, so the actor
/// ends up inside the range rather than on its edge.
const CHASE_STOP_FRACTION: f32 = 0.5;

/// Chases the current target through the navigation layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveState;

impl State<ActorContext> for MoveState {
    fn kind(&self) -> StateKind {
        StateKind::Move
    }

    fn exits(&self) -> &'static [StateKind] {
        &[StateKind::Idle, StateKind::Attack]
    }

    fn on_enter(&mut self, ctx: &mut ActorContext) -> Transition {
        let stop = ctx.config.attack_range * CHASE_STOP_FRACTION;
        ctx.navigator.set_stopping_distance(stop);
        if let Some(target) = ctx.target().copied() {
            ctx.navigator.set_destination(target.position);
        }
        Transition::Stay
    }

    fn on_update(&mut self, ctx: &mut ActorContext, dt: f32) -> Transition {
        let Some(target) = ctx.target().copied() else {
            return Transition::To(StateKind::Idle);
        };
        if ctx.is_attackable() {
            return Transition::To(StateKind::Attack);
        }

        ctx.navigator.set_destination(target.position);
        ctx.face_target(dt);
        let speed = ctx.navigator.speed();
        ctx.animator.set_float(AnimParam::ForwardSpeed, speed);
        Transition::Stay
    }

    fn on_exit(&mut self, ctx: &mut ActorContext) {
        ctx.navigator.reset_path();
        ctx.animator.set_float(AnimParam::ForwardSpeed, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::testing::{enemy_context, spot_player};
    use glam::Vec3;

    #[test]
    fn test_chase_sets_destination() {
        let mut ctx = enemy_context();
        spot_player(&mut ctx, 4.0);

        let mut state = MoveState;
        state.on_enter(&mut ctx);
        assert_eq!(state.on_update(&mut ctx, 0.1), Transition::Stay);
        assert_eq!(ctx.navigator.destination(), Some(Vec3::new(4.0, 0.0, 0.0)));
    }

    #[test]
    fn test_lost_target_returns_to_idle() {
        let mut ctx = enemy_context();
        let mut state = MoveState;
        assert_eq!(state.on_update(&mut ctx, 0.1), Transition::To(StateKind::Idle));
    }

    #[test]
    fn test_in_range_switches_to_attack() {
        let mut ctx = enemy_context();
        spot_player(&mut ctx, 1.5);
        let mut state = MoveState;
        assert_eq!(state.on_update(&mut ctx, 0.1), Transition::To(StateKind::Attack));
    }

    #[test]
    fn test_exit_resets_path() {
        let mut ctx = enemy_context();
        spot_player(&mut ctx, 4.0);
        let mut state = MoveState;
        state.on_enter(&mut ctx);
        state.on_exit(&mut ctx);
        assert!(ctx.navigator.destination().is_none());
    }
}
