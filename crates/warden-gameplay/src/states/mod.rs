//! Concrete states for non-player actors.
//!
//! Every state operates on an [`ActorContext`](crate::actor::ActorContext)
//! and decides its own outgoing transitions; the machine only carries them
//! out.

mod attack;
mod death;
mod idle;
mod movement;
mod patrol;

pub use attack::AttackState;
pub use death::DeathState;
pub use idle::IdleState;
pub use movement::MoveState;
pub use patrol::{PatrolRoute, PatrolState};
