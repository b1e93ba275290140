//! Health, invulnerability and damage acceptance.

use crate::config::ActorConfig;
use crate::deferred::DeferredQueue;
use crate::message::{DamageMessage, Message, MessageBus};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use warden_common::{horizontal_angle_deg, rotate_about_up, EntityId, Transform};

/// Why a damage request had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoreReason {
    /// The component is already dead
    Dead,
    /// The invulnerability window is still running
    Invulnerable,
    /// The hit came from outside the accepted arc
    OutsideHitArc,
}

/// Result of [`HealthComponent::apply_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Nothing changed and nothing was broadcast
    Ignored(IgnoreReason),
    /// Health dropped but stayed above zero
    Damaged {
        /// Health after the hit
        remaining: f32,
    },
    /// Health reached zero or below; a death notice was scheduled
    Died {
        /// Health after the hit, possibly negative
        remaining: f32,
    },
}

impl DamageOutcome {
    /// Checks if the damage was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }

    /// Checks if the damage was lethal.
    #[must_use]
    pub const fn is_lethal(&self) -> bool {
        matches!(self, Self::Died { .. })
    }
}

/// Record scheduled for the end of the tick when an actor dies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathNotice {
    /// The actor that died
    pub entity: EntityId,
    /// The hit that killed it
    pub damage: DamageMessage,
}

type DamageHook = Box<dyn FnMut(&DamageMessage)>;
type DeathHook = Box<dyn FnMut(&DeathNotice)>;

/// Owns current health, the invulnerability window and the damage rules.
///
/// Health is only changed by [`apply_damage`](Self::apply_damage),
/// [`heal`](Self::heal) and the reset paths; the invulnerability flag decays
/// through [`tick`](Self::tick). The raw health value is kept even when a
/// hit overshoots below zero.
pub struct HealthComponent {
    /// Entity this component belongs to; used as the message sender
    owner: EntityId,
    /// Maximum health
    max_health: f32,
    /// Current health (may be negative after a lethal hit)
    current_health: f32,
    /// Invulnerability window after an accepted hit, in seconds
    invulnerability_time: f32,
    /// Time accumulated since the window opened
    time_since_last_hit: f32,
    /// Whether hits are currently ignored
    invulnerable: bool,
    /// Half-angle of the accepted hit cone, in degrees
    hit_half_angle: f32,
    /// Rotation applied to the owner's forward before the arc test, in degrees
    hit_forward_rotation: f32,
    /// Listeners for Damaged/Died/Respawn
    bus: MessageBus,
    /// Called inline for non-lethal hits
    on_damaged: Vec<DamageHook>,
    /// Called from the end-of-tick phase after a lethal hit
    on_death: Vec<DeathHook>,
}

impl fmt::Debug for HealthComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthComponent")
            .field("owner", &self.owner)
            .field("current_health", &self.current_health)
            .field("max_health", &self.max_health)
            .field("invulnerable", &self.invulnerable)
            .field("listeners", &self.bus.len())
            .finish_non_exhaustive()
    }
}

impl HealthComponent {
    /// Creates a component at full health with no invulnerability window
    /// and an unrestricted hit arc.
    #[must_use]
    pub fn new(owner: EntityId, max_health: f32) -> Self {
        let max_health = max_health.max(f32::EPSILON);
        Self {
            owner,
            max_health,
            current_health: max_health,
            invulnerability_time: 0.0,
            time_since_last_hit: 0.0,
            invulnerable: false,
            hit_half_angle: 180.0,
            hit_forward_rotation: 0.0,
            bus: MessageBus::new(),
            on_damaged: Vec::new(),
            on_death: Vec::new(),
        }
    }

    /// Creates a component from an actor's tunables.
    #[must_use]
    pub fn from_config(owner: EntityId, config: &ActorConfig) -> Self {
        Self::new(owner, config.max_health)
            .with_invulnerability(config.invulnerability_time)
            .with_hit_arc(config.hit_half_angle, config.hit_forward_rotation)
    }

    /// Sets the invulnerability window length.
    #[must_use]
    pub fn with_invulnerability(mut self, seconds: f32) -> Self {
        self.invulnerability_time = seconds.max(0.0);
        self
    }

    /// Restricts accepted hits to a cone around the (rotated) forward vector.
    #[must_use]
    pub fn with_hit_arc(mut self, half_angle_deg: f32, forward_rotation_deg: f32) -> Self {
        self.hit_half_angle = half_angle_deg.clamp(0.0, 180.0);
        self.hit_forward_rotation = forward_rotation_deg;
        self
    }

    /// Returns the owning entity.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Returns current health. May be negative after a lethal hit.
    #[must_use]
    pub const fn current_health(&self) -> f32 {
        self.current_health
    }

    /// Returns maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Returns health as a fraction of the maximum, clamped to `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        (self.current_health / self.max_health).clamp(0.0, 1.0)
    }

    /// Checks if the component is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current_health <= 0.0
    }

    /// Checks if hits are currently ignored.
    #[must_use]
    pub const fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    /// Opens or closes the invulnerability window manually.
    pub fn set_invulnerable(&mut self, invulnerable: bool) {
        self.invulnerable = invulnerable;
        self.time_since_last_hit = 0.0;
    }

    /// Returns the message bus listeners register on.
    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Adds a hook invoked inline after every non-lethal accepted hit.
    pub fn on_damaged(&mut self, hook: impl FnMut(&DamageMessage) + 'static) {
        self.on_damaged.push(Box::new(hook));
    }

    /// Adds a hook invoked from the end-of-tick phase after a lethal hit.
    pub fn on_death(&mut self, hook: impl FnMut(&DeathNotice) + 'static) {
        self.on_death.push(Box::new(hook));
    }

    /// Restores full health and clears invulnerability.
    pub fn reset(&mut self) {
        self.current_health = self.max_health;
        self.invulnerable = false;
        self.time_since_last_hit = 0.0;
    }

    /// Resets the component and tells listeners the owner is back.
    pub fn revive(&mut self) {
        self.reset();
        self.bus.broadcast(self.owner, &Message::Respawn);
    }

    /// Raises health, never above the maximum. Dead components stay dead.
    pub fn heal(&mut self, amount: f32) {
        if self.is_dead() {
            return;
        }
        self.current_health = (self.current_health + amount.max(0.0)).min(self.max_health);
    }

    /// Advances the invulnerability window by `dt` seconds of simulation time.
    pub fn tick(&mut self, dt: f32) {
        if !self.invulnerable {
            return;
        }
        self.time_since_last_hit += dt;
        if self.time_since_last_hit >= self.invulnerability_time {
            self.invulnerable = false;
            self.time_since_last_hit = 0.0;
        }
    }

    /// Applies one hit.
    ///
    /// Dead or invulnerable components, and hits arriving outside the
    /// accepted arc, are ignored without side effects. An accepted hit opens
    /// the invulnerability window, subtracts the amount, and broadcasts
    /// `Damaged` or `Died` to every listener. A lethal hit additionally
    /// schedules a [`DeathNotice`] on `deferred`.
    pub fn apply_damage(
        &mut self,
        data: &DamageMessage,
        transform: &Transform,
        deferred: &mut DeferredQueue<DeathNotice>,
    ) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::Ignored(IgnoreReason::Dead);
        }
        if self.invulnerable {
            return DamageOutcome::Ignored(IgnoreReason::Invulnerable);
        }
        if !self.accepts_direction(data, transform) {
            debug!(owner = %self.owner, "hit rejected outside arc");
            return DamageOutcome::Ignored(IgnoreReason::OutsideHitArc);
        }

        self.invulnerable = true;
        self.time_since_last_hit = 0.0;
        self.current_health -= data.amount;

        let message = if self.is_dead() {
            deferred.schedule(DeathNotice {
                entity: self.owner,
                damage: *data,
            });
            Message::Died(*data)
        } else {
            for hook in &mut self.on_damaged {
                hook(data);
            }
            Message::Damaged(*data)
        };

        debug!(
            owner = %self.owner,
            damager = %data.damager,
            amount = data.amount,
            remaining = self.current_health,
            kind = ?message.kind(),
            "damage applied"
        );
        self.bus.broadcast(self.owner, &message);

        if self.is_dead() {
            DamageOutcome::Died {
                remaining: self.current_health,
            }
        } else {
            DamageOutcome::Damaged {
                remaining: self.current_health,
            }
        }
    }

    /// Runs the death hooks for a notice drained from the end-of-tick queue.
    pub fn notify_death(&mut self, notice: &DeathNotice) {
        for hook in &mut self.on_death {
            hook(notice);
        }
    }

    fn accepts_direction(&self, data: &DamageMessage, transform: &Transform) -> bool {
        if self.hit_half_angle >= 180.0 {
            return true;
        }
        let forward = rotate_about_up(transform.forward, self.hit_forward_rotation);
        let to_damager = data.damage_source - transform.position;
        // a source with no horizontal offset has no direction to reject
        horizontal_angle_deg(forward, to_damager).map_or(true, |angle| angle <= self.hit_half_angle)
    }
}
