use crate::actor::ActorContext;
use crate::animation::AnimParam;
use crate::fsm::{State, StateKind, Transition};

/// Terminal state entered when health runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeathState;

impl State<ActorContext> for DeathState {
    fn kind(&self) -> StateKind {
        StateKind::Death
    }

    fn on_enter(&mut self, ctx: &mut ActorContext) -> Transition {
        ctx.navigator.reset_path();
        ctx.animator.set_trigger(AnimParam::Death);
        Transition::Stay
    }

    fn on_update(&mut self, _ctx: &mut ActorContext, _dt: f32) -> Transition {
        Transition::Stay
    }
}
