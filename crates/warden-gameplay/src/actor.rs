//! Actors: the owners of a state machine, a detector and a health component.
//!
//! An [`Actor`] is composed rather than specialized. The behavior of the
//! enemy family comes from the states registered on its machine; the
//! patrol variant is an ordinary actor that carries a [`PatrolRoute`]. The
//! player analogue has neither machine nor detector-driven behavior.

use crate::animation::{AnimParam, Animator, NullAnimator};
use crate::config::ActorConfig;
use crate::deferred::DeferredQueue;
use crate::detection::{Candidate, DetectedTarget, ProximityDetector};
use crate::fsm::{FsmError, State, StateKind, StateMachine};
use crate::health::{DamageOutcome, DeathNotice, HealthComponent};
use crate::message::{DamageMessage, Inbox, Message};
use crate::navigation::{Navigator, StraightLineNavigator};
use crate::states::{AttackState, DeathState, IdleState, MoveState, PatrolRoute, PatrolState};
use crate::timer::Cooldown;
use glam::Vec3;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};
use warden_common::{turn_towards, ConfigError, EntityId, Layer, ListenerId, Transform};

/// Error types for actor construction and control.
#[derive(Debug, Error)]
pub enum ActorError {
    /// The state machine refused an operation
    #[error("State machine error: {0}")]
    Fsm(#[from] FsmError),

    /// A state was registered without the capability it relies on
    #[error("State {state} requires a {capability}")]
    MissingCapability {
        /// The state that cannot run
        state: StateKind,
        /// What the actor lacks
        capability: &'static str,
    },

    /// The actor's tunables are unusable
    #[error("Invalid actor config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Result type for actor operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Everything a state may read or change while it runs.
pub struct ActorContext {
    /// Owning entity
    pub id: EntityId,
    /// Classification layer
    pub layer: Layer,
    /// Position and facing
    pub transform: Transform,
    /// Tunables
    pub config: ActorConfig,
    /// Nearest-target scanner, if the actor looks for targets
    pub detector: Option<ProximityDetector>,
    /// Gate between attacks
    pub cooldown: Cooldown,
    /// Path-following layer
    pub navigator: Box<dyn Navigator>,
    /// Animation layer
    pub animator: Box<dyn Animator>,
    /// Patrol capability
    pub patrol: Option<PatrolRoute>,
    /// Source for dwell times
    rng: fastrand::Rng,
}

impl fmt::Debug for ActorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorContext")
            .field("id", &self.id)
            .field("layer", &self.layer)
            .field("transform", &self.transform)
            .field("target", &self.target())
            .field("patrol", &self.patrol)
            .finish_non_exhaustive()
    }
}

impl ActorContext {
    /// Creates a context with a detector, a straight-line navigator and no
    /// animation output.
    #[must_use]
    pub fn new(id: EntityId, layer: Layer, transform: Transform, config: ActorConfig) -> Self {
        Self {
            id,
            layer,
            transform,
            detector: Some(ProximityDetector::from_config(id, &config)),
            cooldown: Cooldown::new(config.attack_cooldown),
            navigator: Box::new(StraightLineNavigator::new(config.move_speed, transform.position)),
            animator: Box::new(NullAnimator),
            patrol: None,
            rng: fastrand::Rng::with_seed(id.raw()),
            config,
        }
    }

    /// Returns the cached nearest target.
    #[must_use]
    pub fn target(&self) -> Option<&DetectedTarget> {
        self.detector.as_ref().and_then(ProximityDetector::target)
    }

    /// Returns the current distance to the target.
    #[must_use]
    pub fn distance_to_target(&self) -> Option<f32> {
        self.target()
            .map(|target| self.transform.distance_to(target.position))
    }

    /// Checks if the target is within attack range. False without a target.
    #[must_use]
    pub fn is_attackable(&self) -> bool {
        self.distance_to_target()
            .is_some_and(|distance| distance <= self.config.attack_range)
    }

    /// Checks if an attack may start now.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.is_attackable() && self.cooldown.is_ready()
    }

    /// Checks if the actor carries a patrol route.
    #[must_use]
    pub fn has_patrol(&self) -> bool {
        self.patrol.is_some()
    }

    /// Turns toward the target on the horizontal plane.
    pub fn face_target(&mut self, dt: f32) {
        let Some(target) = self.target() else {
            return;
        };
        let direction = target.position - self.transform.position;
        let t = self.config.turn_speed * dt;
        self.transform.forward = turn_towards(self.transform.forward, direction, t);
    }

    /// Picks a random pause between patrol legs.
    pub fn roll_dwell(&mut self) -> f32 {
        let min = self.config.patrol_dwell_min;
        let max = self.config.patrol_dwell_max.max(min);
        min + self.rng.f32() * (max - min)
    }
}

/// A simulated entity.
pub struct Actor {
    ctx: ActorContext,
    /// Absent for the player analogue
    machine: Option<StateMachine<ActorContext>>,
    health: HealthComponent,
    /// Receives this actor's own health messages
    inbox: Rc<Inbox>,
    /// Registration of `inbox` on the health bus while active
    listener: Option<ListenerId>,
    /// Seconds left before removal, once dead
    despawn: Option<f32>,
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.ctx.id)
            .field("state", &self.state())
            .field("health", &self.health)
            .field("despawn", &self.despawn)
            .finish_non_exhaustive()
    }
}

impl Actor {
    /// Returns the entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.ctx.id
    }

    /// Returns the classification layer.
    #[must_use]
    pub fn layer(&self) -> Layer {
        self.ctx.layer
    }

    /// Returns the world position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.ctx.transform.position
    }

    /// Returns the transform.
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.ctx.transform
    }

    /// Returns the state context.
    #[must_use]
    pub fn context(&self) -> &ActorContext {
        &self.ctx
    }

    /// Returns the state context for modification.
    pub fn context_mut(&mut self) -> &mut ActorContext {
        &mut self.ctx
    }

    /// Returns the health component.
    #[must_use]
    pub fn health(&self) -> &HealthComponent {
        &self.health
    }

    /// Returns the health component for modification (hooks, healing).
    pub fn health_mut(&mut self) -> &mut HealthComponent {
        &mut self.health
    }

    /// Returns the state machine, if the actor has one.
    #[must_use]
    pub fn machine(&self) -> Option<&StateMachine<ActorContext>> {
        self.machine.as_ref()
    }

    /// Returns the kind of the current state.
    #[must_use]
    pub fn state(&self) -> Option<StateKind> {
        self.machine.as_ref().map(StateMachine::current)
    }

    /// Returns the cached nearest target.
    #[must_use]
    pub fn target(&self) -> Option<&DetectedTarget> {
        self.ctx.target()
    }

    /// Checks if the target is within attack range.
    #[must_use]
    pub fn is_attackable(&self) -> bool {
        self.ctx.is_attackable()
    }

    /// Checks if the actor is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Checks if the actor listens to its health bus.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Returns the seconds left before removal, if the countdown started.
    #[must_use]
    pub fn despawn_remaining(&self) -> Option<f32> {
        self.despawn
    }

    /// Checks if the despawn countdown has run out.
    #[must_use]
    pub fn despawn_due(&self) -> bool {
        self.despawn.is_some_and(|remaining| remaining <= 0.0)
    }

    /// Registers the inbox on the health bus and applies spawn rules.
    pub fn activate(&mut self) {
        self.health.reset();
        if self.ctx.config.spawn_invulnerable {
            self.health.set_invulnerable(true);
        }
        if self.listener.is_none() {
            let inbox: Rc<Inbox> = Rc::clone(&self.inbox);
            self.listener = Some(self.health.bus().add(inbox));
        }
        info!(actor = %self.ctx.id, layer = ?self.ctx.layer, "actor activated");
    }

    /// Removes the inbox from the health bus.
    pub fn deactivate(&mut self) {
        if let Some(id) = self.listener.take() {
            self.health.bus().remove(id);
        }
        self.ctx.navigator.reset_path();
        debug!(actor = %self.ctx.id, "actor deactivated");
    }

    /// Refreshes the detector if its cadence is due. Returns true if a scan
    /// ran.
    pub fn detect(&mut self, dt: f32, candidates: &[Candidate]) -> bool {
        if self.health.is_dead() {
            return false;
        }
        let origin = self.ctx.transform.position;
        let Some(detector) = self.ctx.detector.as_mut() else {
            return false;
        };
        if !detector.advance(dt) {
            return false;
        }
        detector.scan(origin, candidates);
        true
    }

    /// Follows the target's current position, or forgets a target that is
    /// gone. `locate` returns the position of a live entity.
    pub fn track_target(&mut self, locate: impl Fn(EntityId) -> Option<Vec3>) {
        let Some(detector) = self.ctx.detector.as_mut() else {
            return;
        };
        let Some(entity) = detector.target().map(|t| t.entity) else {
            return;
        };
        match locate(entity) {
            Some(position) => detector.track(position),
            None => detector.clear_target(),
        }
    }

    /// Forgets the target if it is `entity`.
    pub fn forget(&mut self, entity: EntityId) {
        if let Some(detector) = self.ctx.detector.as_mut() {
            if detector.target().is_some_and(|t| t.entity == entity) {
                detector.clear_target();
            }
        }
    }

    /// Main-phase update: invulnerability decay, cooldown, state logic,
    /// movement and the despawn countdown.
    pub fn update(&mut self, dt: f32) {
        self.health.tick(dt);
        self.ctx.cooldown.tick(dt);

        if let Some(machine) = self.machine.as_mut() {
            if let Err(err) = machine.update(&mut self.ctx, dt) {
                warn!(actor = %self.ctx.id, error = %err, "state update failed");
            }
        }
        self.ctx.navigator.step(&mut self.ctx.transform, dt);

        if let Some(remaining) = self.despawn.as_mut() {
            *remaining -= dt;
        }
    }

    /// Applies a hit and reacts to the resulting messages.
    ///
    /// The reaction runs after the health component has finished its
    /// broadcast, never from inside it.
    pub fn take_damage(
        &mut self,
        data: &DamageMessage,
        deferred: &mut DeferredQueue<DeathNotice>,
    ) -> DamageOutcome {
        let outcome = self.health.apply_damage(data, &self.ctx.transform, deferred);
        self.process_messages();
        outcome
    }

    /// Handles everything the inbox received since the last call.
    pub fn process_messages(&mut self) {
        for (sender, message) in self.inbox.take() {
            match message {
                Message::Damaged(data) => {
                    debug!(actor = %self.ctx.id, damager = %data.damager, "hit taken");
                    self.ctx.animator.set_trigger(AnimParam::Hit);
                }
                Message::Died(data) => self.die(sender, &data),
                Message::Respawn => {
                    debug!(actor = %self.ctx.id, "respawn received");
                }
            }
        }
    }

    /// Runs the end-of-tick part of a death: hooks and despawn countdown.
    pub fn finish_death(&mut self, notice: &DeathNotice) {
        self.health.notify_death(notice);
        if self.despawn.is_none() {
            self.despawn = Some(self.ctx.config.despawn_delay);
            info!(
                actor = %self.ctx.id,
                delay = self.ctx.config.despawn_delay,
                "despawn scheduled"
            );
        }
    }

    /// Brings the actor back: full health, fresh spawn window, Idle.
    pub fn respawn(&mut self) -> ActorResult<()> {
        self.health.revive();
        self.process_messages();
        self.activate();

        self.despawn = None;
        self.ctx.cooldown.clear();
        self.ctx.navigator.reset_path();
        if let Some(detector) = self.ctx.detector.as_mut() {
            detector.clear_target();
        }
        if let Some(machine) = self.machine.as_mut() {
            machine.change_state(&mut self.ctx, StateKind::Idle)?;
        }
        info!(actor = %self.ctx.id, "actor respawned");
        Ok(())
    }

    fn die(&mut self, sender: EntityId, data: &DamageMessage) {
        info!(actor = %sender, damager = %data.damager, "actor died");
        if let Some(machine) = self.machine.as_mut() {
            if let Err(err) = machine.change_to(&mut self.ctx, Box::new(DeathState)) {
                warn!(actor = %self.ctx.id, error = %err, "death transition failed");
            }
        }
    }
}

enum Archetype {
    Npc,
    Player,
}

/// Builds an [`Actor`] and validates it before it can run.
pub struct ActorBuilder {
    archetype: Archetype,
    id: EntityId,
    layer: Layer,
    transform: Transform,
    config: ActorConfig,
    navigator: Option<Box<dyn Navigator>>,
    animator: Option<Box<dyn Animator>>,
    patrol: Option<PatrolRoute>,
    seed: Option<u64>,
    extra_states: Vec<Box<dyn State<ActorContext>>>,
}

impl ActorBuilder {
    fn with_archetype(archetype: Archetype, layer: Layer, position: Vec3) -> Self {
        Self {
            archetype,
            id: EntityId::new(),
            layer,
            transform: Transform::at(position),
            config: ActorConfig::default(),
            navigator: None,
            animator: None,
            patrol: None,
            seed: None,
            extra_states: Vec::new(),
        }
    }

    /// Starts an enemy at `position`: Idle, Move, Attack and Death states,
    /// hunting the player layer.
    #[must_use]
    pub fn enemy(position: Vec3) -> Self {
        Self::with_archetype(Archetype::Npc, Layer::Enemy, position)
    }

    /// Starts a player analogue at `position`: no state machine, detecting
    /// enemies.
    #[must_use]
    pub fn player(position: Vec3) -> Self {
        let mut builder = Self::with_archetype(Archetype::Player, Layer::Player, position);
        builder.config.target_mask = Layer::Enemy.into();
        builder
    }

    /// Sets the entity id.
    #[must_use]
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    /// Sets the classification layer.
    #[must_use]
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the initial facing.
    #[must_use]
    pub fn facing(mut self, forward: Vec3) -> Self {
        self.transform = self.transform.facing(forward);
        self
    }

    /// Replaces the tunables.
    #[must_use]
    pub fn with_config(mut self, config: ActorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default straight-line navigator.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Box<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Replaces the default silent animator.
    #[must_use]
    pub fn with_animator(mut self, animator: Box<dyn Animator>) -> Self {
        self.animator = Some(animator);
        self
    }

    /// Gives the actor a patrol route and the Patrol state.
    #[must_use]
    pub fn with_patrol(mut self, waypoints: Vec<Vec3>) -> Self {
        self.patrol = Some(PatrolRoute::new(waypoints));
        self
    }

    /// Seeds the dwell-time generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Registers an extra state after the defaults.
    #[must_use]
    pub fn with_state(mut self, state: Box<dyn State<ActorContext>>) -> Self {
        self.extra_states.push(state);
        self
    }

    /// Validates and assembles the actor. The actor still has to be
    /// activated before it listens to its own health messages.
    pub fn build(self) -> ActorResult<Actor> {
        self.config.validate()?;

        let mut ctx = ActorContext::new(self.id, self.layer, self.transform, self.config);
        if let Some(navigator) = self.navigator {
            ctx.navigator = navigator;
        }
        if let Some(animator) = self.animator {
            ctx.animator = animator;
        }
        if let Some(seed) = self.seed {
            ctx.rng = fastrand::Rng::with_seed(seed);
        }
        ctx.patrol = self.patrol;

        let machine = match self.archetype {
            Archetype::Player => {
                if !self.extra_states.is_empty() {
                    warn!(actor = %ctx.id, "player analogue ignores extra states");
                }
                None
            }
            Archetype::Npc => Some(Self::assemble_machine(&mut ctx, self.extra_states)?),
        };

        let health = HealthComponent::from_config(ctx.id, &ctx.config);
        debug!(actor = %ctx.id, states = machine.as_ref().map_or(0, StateMachine::len), "actor built");
        Ok(Actor {
            ctx,
            machine,
            health,
            inbox: Rc::new(Inbox::new()),
            listener: None,
            despawn: None,
        })
    }

    fn assemble_machine(
        ctx: &mut ActorContext,
        extra_states: Vec<Box<dyn State<ActorContext>>>,
    ) -> ActorResult<StateMachine<ActorContext>> {
        let idle = if ctx.has_patrol() {
            IdleState::patrolling()
        } else {
            IdleState::new()
        };
        let mut machine = StateMachine::new(ctx, Box::new(idle));
        machine.register_state(ctx, Box::new(MoveState))?;
        machine.register_state(ctx, Box::new(AttackState::default()))?;
        machine.register_state(ctx, Box::new(DeathState))?;
        if ctx.has_patrol() {
            machine.register_state(ctx, Box::new(PatrolState))?;
        }

        for state in extra_states {
            if state.kind() == StateKind::Patrol && !ctx.has_patrol() {
                return Err(ActorError::MissingCapability {
                    state: StateKind::Patrol,
                    capability: "patrol route",
                });
            }
            machine.register_state(ctx, state)?;
        }

        machine.validate()?;
        Ok(machine)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{enemy_context, spot_player};
    use super::*;
    use crate::animation::{AnimSignal, RecordingAnimator};
    use crate::fsm::Transition;
    use crate::health::IgnoreReason;

    fn lethal() -> DamageMessage {
        DamageMessage::new(EntityId::new(), 1000.0)
    }

    struct Taunt;

    impl State<ActorContext> for Taunt {
        fn kind(&self) -> StateKind {
            StateKind::Patrol
        }

        fn on_update(&mut self, _ctx: &mut ActorContext, _dt: f32) -> Transition {
            Transition::Stay
        }
    }

    #[test]
    fn test_context_queries_without_target() {
        let ctx = enemy_context();
        assert!(ctx.target().is_none());
        assert!(ctx.distance_to_target().is_none());
        assert!(!ctx.is_attackable());
        assert!(!ctx.can_attack());
    }

    #[test]
    fn test_context_attackable_uses_range() {
        let mut ctx = enemy_context();
        spot_player(&mut ctx, 2.0);
        assert!(ctx.is_attackable());

        spot_player(&mut ctx, 2.5);
        assert!(!ctx.is_attackable());
    }

    #[test]
    fn test_dwell_within_configured_range() {
        let mut ctx = enemy_context();
        for _ in 0..50 {
            let dwell = ctx.roll_dwell();
            assert!((0.0..=3.0).contains(&dwell));
        }
    }

    #[test]
    fn test_enemy_build_registers_defaults() {
        let actor = ActorBuilder::enemy(Vec3::ZERO).build().expect("build");
        let machine = actor.machine().expect("machine");
        assert_eq!(actor.state(), Some(StateKind::Idle));
        assert_eq!(machine.len(), 4);
        assert!(!machine.is_registered(StateKind::Patrol));
    }

    #[test]
    fn test_patrol_build_registers_patrol() {
        let actor = ActorBuilder::enemy(Vec3::ZERO)
            .with_patrol(vec![Vec3::X])
            .build()
            .expect("build");
        assert!(actor
            .machine()
            .is_some_and(|m| m.is_registered(StateKind::Patrol)));
    }

    #[test]
    fn test_patrol_state_without_route_is_refused() {
        let result = ActorBuilder::enemy(Vec3::ZERO)
            .with_state(Box::new(Taunt))
            .build();
        assert!(matches!(
            result,
            Err(ActorError::MissingCapability {
                state: StateKind::Patrol,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_extra_state_is_refused() {
        let result = ActorBuilder::enemy(Vec3::ZERO)
            .with_state(Box::new(MoveState))
            .build();
        assert!(matches!(
            result,
            Err(ActorError::Fsm(FsmError::DuplicateState(StateKind::Move)))
        ));
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let config = ActorConfig {
            detection_radius: -1.0,
            ..ActorConfig::default()
        };
        let result = ActorBuilder::enemy(Vec3::ZERO).with_config(config).build();
        assert!(matches!(result, Err(ActorError::InvalidConfig(_))));
    }

    #[test]
    fn test_player_has_no_machine() {
        let player = ActorBuilder::player(Vec3::ZERO).build().expect("build");
        assert!(player.machine().is_none());
        assert_eq!(player.layer(), Layer::Player);
        assert!(player.context().config.target_mask.contains(Layer::Enemy));
    }

    #[test]
    fn test_activation_opens_spawn_window() {
        let mut actor = ActorBuilder::enemy(Vec3::ZERO).build().expect("build");
        let mut deferred = DeferredQueue::new();
        actor.activate();
        assert!(actor.is_active());

        let outcome = actor.take_damage(&lethal(), &mut deferred);
        assert_eq!(outcome, DamageOutcome::Ignored(IgnoreReason::Invulnerable));
    }

    #[test]
    fn test_lethal_hit_enters_death() {
        let animator = RecordingAnimator::new();
        let log = animator.log();
        let config = ActorConfig {
            spawn_invulnerable: false,
            ..ActorConfig::default()
        };
        let mut actor = ActorBuilder::enemy(Vec3::ZERO)
            .with_config(config)
            .with_animator(Box::new(animator))
            .build()
            .expect("build");
        let mut deferred = DeferredQueue::new();
        actor.activate();

        let outcome = actor.take_damage(&lethal(), &mut deferred);
        assert!(outcome.is_lethal());
        assert_eq!(actor.state(), Some(StateKind::Death));
        assert_eq!(deferred.len(), 1);
        assert!(log.borrow().contains(&AnimSignal::Trigger(AnimParam::Death)));
        assert!(actor.despawn_remaining().is_none());
    }

    #[test]
    fn test_inactive_actor_ignores_its_messages() {
        let config = ActorConfig {
            spawn_invulnerable: false,
            ..ActorConfig::default()
        };
        let mut actor = ActorBuilder::enemy(Vec3::ZERO)
            .with_config(config)
            .build()
            .expect("build");
        let mut deferred = DeferredQueue::new();

        actor.take_damage(&lethal(), &mut deferred);
        assert!(!actor.is_alive());
        assert_eq!(actor.state(), Some(StateKind::Idle));
    }

    #[test]
    fn test_finish_death_starts_countdown() {
        let config = ActorConfig {
            spawn_invulnerable: false,
            despawn_delay: 1.0,
            ..ActorConfig::default()
        };
        let mut actor = ActorBuilder::enemy(Vec3::ZERO)
            .with_config(config)
            .build()
            .expect("build");
        let mut deferred = DeferredQueue::new();
        actor.activate();
        actor.take_damage(&lethal(), &mut deferred);

        for notice in deferred.drain() {
            actor.finish_death(&notice);
        }
        assert_eq!(actor.despawn_remaining(), Some(1.0));
        actor.update(0.6);
        assert!(!actor.despawn_due());
        actor.update(0.6);
        assert!(actor.despawn_due());
    }

    #[test]
    fn test_respawn_restores_idle() {
        let config = ActorConfig {
            spawn_invulnerable: false,
            ..ActorConfig::default()
        };
        let mut actor = ActorBuilder::enemy(Vec3::ZERO)
            .with_config(config)
            .build()
            .expect("build");
        let mut deferred = DeferredQueue::new();
        actor.activate();
        actor.take_damage(&lethal(), &mut deferred);

        actor.respawn().expect("respawn");
        assert!(actor.is_alive());
        assert_eq!(actor.state(), Some(StateKind::Idle));
        assert!(actor.despawn_remaining().is_none());
    }

    #[test]
    fn test_deactivate_removes_listener() {
        let mut actor = ActorBuilder::enemy(Vec3::ZERO).build().expect("build");
        actor.activate();
        assert_eq!(actor.health().bus().len(), 1);
        actor.deactivate();
        assert!(actor.health().bus().is_empty());
        assert!(!actor.is_active());
    }

    #[test]
    fn test_track_target_clears_missing_entity() {
        let mut actor = ActorBuilder::enemy(Vec3::ZERO).build().expect("build");
        let player = spot_player(actor.context_mut(), 1.0);
        assert_eq!(actor.target().map(|t| t.entity), Some(player));

        actor.track_target(|_| Some(Vec3::new(0.0, 0.0, 1.5)));
        assert_eq!(actor.target().map(|t| t.position), Some(Vec3::new(0.0, 0.0, 1.5)));

        actor.track_target(|_| None);
        assert!(actor.target().is_none());
    }
}
