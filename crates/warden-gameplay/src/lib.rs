//! # Warden Gameplay
//!
//! Behavior core for Project Warden actors.
//!
//! This crate provides:
//! - A state machine executor and the Idle, Move, Attack, Patrol and Death states
//! - Health with invulnerability windows and directional hit arcs
//! - A per-actor message bus for Damaged/Died/Respawn notifications
//! - An end-of-tick queue for death handling
//! - Periodic proximity detection on its own cadence
//! - Navigation and animation boundaries with reference implementations
//! - The world that schedules detection, main and late phases

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod animation;
pub mod config;
pub mod deferred;
pub mod detection;
pub mod fsm;
pub mod health;
pub mod message;
pub mod navigation;
pub mod states;
pub mod timer;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::animation::*;
    pub use crate::config::*;
    pub use crate::deferred::*;
    pub use crate::detection::*;
    pub use crate::fsm::*;
    pub use crate::health::*;
    pub use crate::message::*;
    pub use crate::navigation::*;
    pub use crate::states::*;
    pub use crate::timer::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const DT: f32 = 1.0 / 30.0;

    fn quick_patrol() -> ActorConfig {
        ActorConfig {
            patrol_dwell_min: 0.0,
            patrol_dwell_max: 0.2,
            spawn_invulnerable: false,
            ..ActorConfig::default()
        }
    }

    #[test]
    fn test_patrol_loop_visits_waypoints() {
        let mut world = World::new();
        let guard = ActorBuilder::enemy(Vec3::ZERO)
            .with_config(quick_patrol())
            .with_patrol(vec![Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 3.0)])
            .with_seed(7)
            .build()
            .expect("build guard");
        let guard = world.spawn(guard);

        let mut seen = Vec::new();
        for _ in 0..600 {
            world.tick(DT);
            let actor = world.actor(guard).expect("guard");
            let state = actor.state().expect("machine");
            if seen.last() != Some(&state) {
                seen.push(state);
            }
        }

        assert!(seen.contains(&StateKind::Patrol));
        assert!(seen.windows(2).any(|w| w == [StateKind::Patrol, StateKind::Idle]));
        assert!(!seen.contains(&StateKind::Attack));
    }

    #[test]
    fn test_patrolling_guard_engages_player() {
        let mut world = World::new();
        let guard = ActorBuilder::enemy(Vec3::ZERO)
            .with_config(quick_patrol())
            .with_patrol(vec![Vec3::new(6.0, 0.0, 0.0), Vec3::new(-6.0, 0.0, 0.0)])
            .build()
            .expect("build guard");
        let guard = world.spawn(guard);
        let player = ActorBuilder::player(Vec3::new(8.0, 0.0, 0.0))
            .build()
            .expect("build player");
        let player = world.spawn(player);

        let mut attacked = false;
        for _ in 0..300 {
            world.tick(DT);
            if world.actor(guard).and_then(Actor::state) == Some(StateKind::Attack) {
                attacked = true;
                break;
            }
        }
        assert!(attacked);
        assert_eq!(
            world.actor(guard).and_then(|a| a.target().map(|t| t.entity)),
            Some(player)
        );
    }

    #[test]
    fn test_fight_to_the_death() {
        let mut world = World::new();
        let config = ActorConfig {
            spawn_invulnerable: false,
            invulnerability_time: 0.1,
            ..ActorConfig::default()
        };
        let enemy = world.spawn(
            ActorBuilder::enemy(Vec3::ZERO)
                .with_config(config)
                .build()
                .expect("build enemy"),
        );
        let player = world.spawn(
            ActorBuilder::player(Vec3::new(1.0, 0.0, 0.0))
                .build()
                .expect("build player"),
        );

        // the player strikes back every half second until the enemy falls
        let mut since_strike = 0.0;
        for _ in 0..600 {
            world.tick(DT);
            since_strike += DT;
            if since_strike >= 0.5 {
                since_strike = 0.0;
                world.attack_frame_reached(player).expect("player attack");
            }
            if !world.contains(enemy) {
                break;
            }
        }

        assert!(!world.contains(enemy));
        assert!(world.actor(player).is_some_and(|p| p.target().is_none()));
    }
}
