//! Navigation boundary.
//!
//! Path following belongs to an external layer. States hand it a
//! destination and read back remaining distance, speed and arrival; the
//! world steps it once per tick to move the actor.

use glam::Vec3;
use warden_common::{turn_towards, Transform};

/// Path-following layer as seen by the behavior core.
pub trait Navigator {
    /// Requests a path to `destination`.
    fn set_destination(&mut self, destination: Vec3);

    /// Drops the current path and stops.
    fn reset_path(&mut self);

    /// Returns the current destination, if a path is active.
    fn destination(&self) -> Option<Vec3>;

    /// Sets how close to the destination counts as arrived.
    fn set_stopping_distance(&mut self, distance: f32);

    /// Returns the stopping distance.
    fn stopping_distance(&self) -> f32;

    /// Returns the distance left along the path, zero without a path.
    fn remaining_distance(&self) -> f32;

    /// Returns the current speed.
    fn speed(&self) -> f32;

    /// Moves the actor along the path by `dt` seconds.
    fn step(&mut self, transform: &mut Transform, dt: f32);

    /// Checks if the actor is within stopping distance of its destination.
    fn has_arrived(&self) -> bool {
        self.remaining_distance() <= self.stopping_distance()
    }
}

/// Moves in a straight line toward the destination at a fixed speed.
///
/// Stands in for a navmesh in tests and headless runs.
#[derive(Debug, Clone)]
pub struct StraightLineNavigator {
    /// Travel speed in units per second
    max_speed: f32,
    /// Active destination
    destination: Option<Vec3>,
    /// Arrival tolerance
    stopping_distance: f32,
    /// Position observed at the last step
    last_position: Vec3,
    /// Speed achieved during the last step
    speed: f32,
}

impl StraightLineNavigator {
    /// Creates a navigator for an actor starting at `position`.
    #[must_use]
    pub fn new(max_speed: f32, position: Vec3) -> Self {
        Self {
            max_speed: max_speed.max(0.0),
            destination: None,
            stopping_distance: 0.0,
            last_position: position,
            speed: 0.0,
        }
    }
}

impl Navigator for StraightLineNavigator {
    fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
    }

    fn reset_path(&mut self) {
        self.destination = None;
        self.speed = 0.0;
    }

    fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance.max(0.0);
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn remaining_distance(&self) -> f32 {
        self.destination
            .map_or(0.0, |dest| self.last_position.distance(dest))
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn step(&mut self, transform: &mut Transform, dt: f32) {
        self.last_position = transform.position;
        self.speed = 0.0;

        let Some(dest) = self.destination else {
            return;
        };
        let offset = dest - transform.position;
        let distance = offset.length();
        if distance <= self.stopping_distance || dt <= 0.0 {
            return;
        }

        let travel = (self.max_speed * dt).min(distance - self.stopping_distance);
        let direction = offset / distance;
        transform.position += direction * travel;
        transform.forward = turn_towards(transform.forward, direction, 1.0);

        self.last_position = transform.position;
        self.speed = travel / dt;
    }
}
