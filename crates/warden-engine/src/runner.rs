//! Headless fixed-step simulation.
//!
//! The runner stands in for the animation layer: it watches the attack
//! triggers every actor publishes and, after the configured wind-up, reports
//! the attack frame back to the world.

use crate::config::ScenarioConfig;
use glam::Vec3;
use serde::Serialize;
use tracing::{debug, info};
use warden_common::{ConfigError, EntityId, Layer, WardenResult};
use warden_gameplay::{
    ActorBuilder, ActorResult, AnimParam, AnimSignal, AnimationLog, DamageOutcome, RecordingAnimator,
    StateKind, World, WorldResult,
};

/// Final state of one actor.
#[derive(Debug, Clone, Serialize)]
pub struct ActorReport {
    /// Entity id
    pub id: u64,
    /// Archetype name, or "player"
    pub archetype: String,
    /// Classification layer
    pub layer: Layer,
    /// Current state, if the actor has a state machine
    pub state: Option<StateKind>,
    /// Current health
    pub health: f32,
    /// Final position
    pub position: Vec3,
}

/// Summary printed at the end of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimReport {
    /// Ticks simulated
    pub ticks: u64,
    /// Simulated seconds
    pub elapsed: f32,
    /// Attack swings started
    pub swings: u32,
    /// Hits that changed health
    pub hits_landed: u32,
    /// Hits ignored (dead, invulnerable or outside the hit arc)
    pub hits_ignored: u32,
    /// Death notices dispatched
    pub deaths: u32,
    /// Ids of actors removed after dying
    pub despawned: Vec<u64>,
    /// Actors still in the world
    pub survivors: Vec<ActorReport>,
}

/// A swing waiting for its hit frame.
#[derive(Debug, Clone, Copy)]
struct PendingStrike {
    attacker: EntityId,
    remaining: f32,
}

/// Everything the runner tracks per spawned actor.
struct Cast {
    id: EntityId,
    archetype: String,
    log: AnimationLog,
}

/// A world populated from a scenario, plus the runner's bookkeeping.
pub struct Simulation {
    world: World,
    cast: Vec<Cast>,
    player: EntityId,
    fights_back: bool,
    windup: f32,
    dt: f32,
    strikes: Vec<PendingStrike>,
    report: SimReport,
}

impl Simulation {
    /// Spawns the player and every enemy of `config`.
    ///
    /// An invalid scenario is refused before anything is spawned.
    pub fn new(config: &ScenarioConfig) -> ActorResult<Self> {
        config.validate()?;
        let mut world = World::new();
        let mut cast = Vec::with_capacity(config.spawns.len() + 1);

        let animator = RecordingAnimator::new();
        let log = animator.log();
        let mut player = ActorBuilder::player(config.player.position)
            .with_config(config.player.actor.clone())
            .with_animator(Box::new(animator))
            .build()?;
        if let Some(destination) = config.player.walk_to {
            player.context_mut().navigator.set_destination(destination);
        }
        let player = world.spawn(player);
        cast.push(Cast {
            id: player,
            archetype: "player".to_string(),
            log,
        });

        for (index, spawn) in config.spawns.iter().enumerate() {
            let actor_config =
                config
                    .archetypes
                    .get(&spawn.archetype)
                    .ok_or_else(|| ConfigError::UnknownReference {
                        kind: "archetype",
                        name: spawn.archetype.clone(),
                    })?;
            let animator = RecordingAnimator::new();
            let log = animator.log();
            let mut builder = ActorBuilder::enemy(spawn.position)
                .with_config(actor_config.clone())
                .with_animator(Box::new(animator))
                .with_seed(config.seed.wrapping_add(index as u64));
            if !spawn.waypoints.is_empty() {
                builder = builder.with_patrol(spawn.waypoints.clone());
            }
            let id = world.spawn(builder.build()?);
            cast.push(Cast {
                id,
                archetype: spawn.archetype.clone(),
                log,
            });
        }

        debug!(actors = world.len(), "scenario spawned");
        Ok(Self {
            world,
            cast,
            player,
            fights_back: config.player.fights_back,
            windup: config.attack_windup,
            dt: config.dt(),
            strikes: Vec::new(),
            report: SimReport::default(),
        })
    }

    /// Returns the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns the player's id.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Runs one fixed step: world tick, player reaction, animation
    /// playback.
    pub fn step(&mut self) -> WorldResult<()> {
        let stats = self.world.tick(self.dt);
        self.report.deaths += stats.deaths;
        self.report.despawned.extend(
            self.world
                .take_despawned()
                .into_iter()
                .map(EntityId::raw),
        );

        if self.fights_back {
            self.player_swing();
        }
        self.collect_swings();
        self.play_strikes()
    }

    /// Runs `ticks` fixed steps.
    pub fn run_for(&mut self, ticks: u64) -> WorldResult<()> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    /// Builds the report for the current moment.
    #[must_use]
    pub fn report(&self) -> SimReport {
        let mut report = self.report.clone();
        report.ticks = self.world.ticks();
        report.elapsed = self.world.elapsed();
        report.survivors = self
            .cast
            .iter()
            .filter_map(|member| {
                let actor = self.world.actor(member.id)?;
                Some(ActorReport {
                    id: member.id.raw(),
                    archetype: member.archetype.clone(),
                    layer: actor.layer(),
                    state: actor.state(),
                    health: actor.health().current_health(),
                    position: actor.position(),
                })
            })
            .collect();
        report
    }

    /// The player has no state machine; it swings whenever an enemy is in
    /// range and its cooldown allows.
    fn player_swing(&mut self) {
        let Some(player) = self.world.actor_mut(self.player) else {
            return;
        };
        if !player.is_alive() || !player.context().can_attack() {
            return;
        }
        let ctx = player.context_mut();
        ctx.cooldown.restart();
        ctx.animator.set_trigger(AnimParam::Attack);
    }

    fn collect_swings(&mut self) {
        for member in &self.cast {
            let signals: Vec<AnimSignal> = member.log.borrow_mut().drain(..).collect();
            for signal in signals {
                if signal == AnimSignal::Trigger(AnimParam::Attack) {
                    self.report.swings += 1;
                    self.strikes.push(PendingStrike {
                        attacker: member.id,
                        remaining: self.windup,
                    });
                }
            }
        }
    }

    fn play_strikes(&mut self) -> WorldResult<()> {
        let dt = self.dt;
        for strike in &mut self.strikes {
            strike.remaining -= dt;
        }
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.strikes.drain(..).partition(|s| s.remaining <= 0.0);
        self.strikes = waiting;

        for strike in due {
            if !self.world.contains(strike.attacker) {
                continue;
            }
            match self.world.attack_frame_reached(strike.attacker)? {
                Some(DamageOutcome::Ignored(reason)) => {
                    debug!(attacker = %strike.attacker, ?reason, "hit ignored");
                    self.report.hits_ignored += 1;
                }
                Some(_) => self.report.hits_landed += 1,
                None => {}
            }
        }
        Ok(())
    }
}

/// Runs a whole scenario and returns its report.
pub fn run(config: &ScenarioConfig) -> WardenResult<SimReport> {
    let mut sim = Simulation::new(config)?;
    info!(player = %sim.player(), actors = sim.world().len(), "simulation starting");
    sim.run_for(config.total_ticks())?;

    let report = sim.report();
    info!(
        ticks = report.ticks,
        deaths = report.deaths,
        survivors = report.survivors.len(),
        "simulation finished"
    );
    Ok(report)
}
