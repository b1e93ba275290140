//! The simulation world and its per-tick schedule.
//!
//! Each [`World::tick`] runs three phases in a fixed order:
//!
//! 1. **Detection**: every actor's detector advances on its own cadence
//!    and, when due, scans a snapshot of the live actors.
//! 2. **Main**: invulnerability decay, cooldowns, target tracking, state
//!    machine updates, movement and despawn countdowns.
//! 3. **Late**: death notices scheduled during the tick are drained and
//!    dispatched, then actors whose despawn countdown ran out are removed.
//!
//! Damage entering from outside (attack frames, scripted hits) is applied
//! between ticks through [`World::apply_damage`] and
//! [`World::attack_frame_reached`]; the death notices it produces wait for
//! the next late phase.

use crate::actor::{Actor, ActorError};
use crate::deferred::DeferredQueue;
use crate::detection::Candidate;
use crate::health::{DamageOutcome, DeathNotice};
use crate::message::DamageMessage;
use ahash::AHashMap;
use glam::Vec3;
use thiserror::Error;
use tracing::{debug, info};
use warden_common::{EntityId, WardenError};

/// Error types for world operations.
#[derive(Debug, Error)]
pub enum WorldError {
    /// No actor with this id is in the world
    #[error("Actor {0} not found")]
    ActorNotFound(EntityId),

    /// An actor refused the operation
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

impl From<ActorError> for WardenError {
    fn from(err: ActorError) -> Self {
        match err {
            ActorError::InvalidConfig(config) => Self::Config(config),
            other => Self::Simulation(other.to_string()),
        }
    }
}

impl From<WorldError> for WardenError {
    fn from(err: WorldError) -> Self {
        match err {
            WorldError::Actor(actor) => actor.into(),
            other => Self::Simulation(other.to_string()),
        }
    }
}

/// Frame statistics for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    /// Actors whose detector scanned this tick
    pub scans: u32,
    /// Death notices dispatched in the late phase
    pub deaths: u32,
    /// Actors removed in the late phase
    pub despawned: u32,
}

/// Owns every actor and the end-of-tick death queue.
#[derive(Debug, Default)]
pub struct World {
    actors: Vec<Actor>,
    deaths: DeferredQueue<DeathNotice>,
    despawned: Vec<EntityId>,
    elapsed: f32,
    ticks: u64,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `actor` and adds it to the world.
    pub fn spawn(&mut self, mut actor: Actor) -> EntityId {
        actor.activate();
        let id = actor.id();
        self.actors.push(actor);
        id
    }

    /// Returns the number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Checks if the world has no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Checks if an actor is in the world.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.actor(id).is_some()
    }

    /// Returns an actor.
    #[must_use]
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id() == id)
    }

    /// Returns an actor for modification.
    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id() == id)
    }

    /// Iterates over all actors in spawn order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    /// Returns the simulated seconds so far.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Returns the number of ticks run.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns the number of death notices waiting for the late phase.
    #[must_use]
    pub fn pending_deaths(&self) -> usize {
        self.deaths.len()
    }

    /// Returns and clears the ids removed since the last call.
    pub fn take_despawned(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.despawned)
    }

    /// Advances the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickStats {
        let mut stats = TickStats {
            scans: self.detection_phase(dt),
            ..TickStats::default()
        };
        self.main_phase(dt);
        let (deaths, despawned) = self.late_phase();
        stats.deaths = deaths;
        stats.despawned = despawned;

        self.elapsed += dt;
        self.ticks += 1;
        stats
    }

    /// Applies a hit to actor `target`.
    pub fn apply_damage(&mut self, target: EntityId, data: &DamageMessage) -> WorldResult<DamageOutcome> {
        let actor = self
            .actors
            .iter_mut()
            .find(|a| a.id() == target)
            .ok_or(WorldError::ActorNotFound(target))?;
        Ok(actor.take_damage(data, &mut self.deaths))
    }

    /// Resolves the damage of an attack whose swing reached its hit frame.
    ///
    /// The hit goes to the attacker's current target, coming from the
    /// attacker's position. Returns `None` when the attacker is dead or has
    /// no target any more.
    pub fn attack_frame_reached(&mut self, attacker: EntityId) -> WorldResult<Option<DamageOutcome>> {
        let actor = self.actor(attacker).ok_or(WorldError::ActorNotFound(attacker))?;
        if !actor.is_alive() {
            return Ok(None);
        }
        let Some(target) = actor.target().copied() else {
            return Ok(None);
        };

        let origin = actor.position();
        let data = DamageMessage::new(attacker, actor.context().config.attack_damage)
            .with_source(origin)
            .with_direction((target.position - origin).normalize_or_zero());

        if !self.contains(target.entity) {
            if let Some(actor) = self.actor_mut(attacker) {
                actor.forget(target.entity);
            }
            return Ok(None);
        }
        debug!(attacker = %attacker, target = %target.entity, amount = data.amount, "attack frame");
        self.apply_damage(target.entity, &data).map(Some)
    }

    /// Raises an actor's health.
    pub fn heal(&mut self, id: EntityId, amount: f32) -> WorldResult<()> {
        let actor = self.actor_mut(id).ok_or(WorldError::ActorNotFound(id))?;
        actor.health_mut().heal(amount);
        Ok(())
    }

    /// Brings a dead (or living) actor back at full health in Idle.
    ///
    /// A death notice still waiting for the late phase is discarded.
    pub fn respawn(&mut self, id: EntityId) -> WorldResult<()> {
        let actor = self
            .actors
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(WorldError::ActorNotFound(id))?;
        actor.respawn()?;
        self.deaths.retain(|notice| notice.entity != id);
        Ok(())
    }

    fn detection_phase(&mut self, dt: f32) -> u32 {
        let candidates: Vec<Candidate> = self
            .actors
            .iter()
            .filter(|a| a.is_alive())
            .map(|a| Candidate {
                entity: a.id(),
                position: a.position(),
                layer: a.layer(),
            })
            .collect();

        let mut scans = 0;
        for actor in &mut self.actors {
            if actor.detect(dt, &candidates) {
                scans += 1;
            }
        }
        scans
    }

    fn main_phase(&mut self, dt: f32) {
        let live: AHashMap<EntityId, Vec3> = self
            .actors
            .iter()
            .filter(|a| a.is_alive())
            .map(|a| (a.id(), a.position()))
            .collect();

        for actor in &mut self.actors {
            actor.track_target(|id| live.get(&id).copied());
            actor.update(dt);
        }
    }

    fn late_phase(&mut self) -> (u32, u32) {
        let mut deaths = 0;
        for notice in self.deaths.drain() {
            if let Some(actor) = self
                .actors
                .iter_mut()
                .find(|a| a.id() == notice.entity && !a.is_alive())
            {
                actor.finish_death(&notice);
                deaths += 1;
            }
        }

        let expired: Vec<EntityId> = self
            .actors
            .iter()
            .filter(|a| a.despawn_due())
            .map(Actor::id)
            .collect();
        for id in &expired {
            if let Some(index) = self.actors.iter().position(|a| a.id() == *id) {
                let mut actor = self.actors.remove(index);
                actor.deactivate();
                info!(actor = %id, "actor despawned");
            }
            for other in &mut self.actors {
                other.forget(*id);
            }
        }
        let despawned = expired.len() as u32;
        self.despawned.extend(expired);
        (deaths, despawned)
    }
}
