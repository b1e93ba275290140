//! Scenario configuration.
//!
//! A scenario describes one headless run: tick rate, duration, the player,
//! named enemy archetypes and where to spawn them. It is read from and
//! written to TOML.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use warden_common::{ConfigError, Layer};
use warden_gameplay::ActorConfig;

/// Default scenario file name.
pub const SCENARIO_FILE: &str = "warden.toml";

/// The player analogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSetup {
    /// Spawn position
    pub position: Vec3,
    /// Where the player walks at the start of the run
    pub walk_to: Option<Vec3>,
    /// Whether the player hits back when an enemy is in range
    pub fights_back: bool,
    /// Player tunables
    pub actor: ActorConfig,
}

impl Default for PlayerSetup {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            walk_to: Some(Vec3::new(0.0, 0.0, 12.0)),
            fights_back: true,
            actor: ActorConfig {
                target_mask: Layer::Enemy.into(),
                max_health: 250.0,
                attack_damage: 35.0,
                attack_cooldown: 0.8,
                move_speed: 2.5,
                ..ActorConfig::default()
            },
        }
    }
}

/// One enemy to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSetup {
    /// Name of the archetype in [`ScenarioConfig::archetypes`]
    pub archetype: String,
    /// Spawn position
    pub position: Vec3,
    /// Patrol route; empty means the enemy stands guard
    #[serde(default)]
    pub waypoints: Vec<Vec3>,
}

/// Full description of a headless run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    // === Timing ===
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Simulated seconds to run
    pub duration: f32,
    /// Seconds between an attack swing and its hit frame
    pub attack_windup: f32,

    // === Randomness ===
    /// Seed for patrol dwell times
    pub seed: u64,

    // === Cast ===
    /// The player analogue
    pub player: PlayerSetup,
    /// Enemy archetypes by name
    pub archetypes: BTreeMap<String, ActorConfig>,
    /// Enemies to spawn
    pub spawns: Vec<SpawnSetup>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let mut archetypes = BTreeMap::new();
        archetypes.insert("grunt".to_string(), ActorConfig::default());
        archetypes.insert(
            "sentry".to_string(),
            ActorConfig {
                detection_radius: 6.0,
                move_speed: 2.0,
                ..ActorConfig::default()
            },
        );
        archetypes.insert(
            "shieldbearer".to_string(),
            ActorConfig {
                max_health: 150.0,
                hit_half_angle: 60.0,
                attack_damage: 30.0,
                ..ActorConfig::default()
            },
        );

        Self {
            tick_rate: 60,
            duration: 30.0,
            attack_windup: 0.4,
            seed: 42,
            player: PlayerSetup::default(),
            archetypes,
            spawns: vec![
                SpawnSetup {
                    archetype: "grunt".to_string(),
                    position: Vec3::new(2.0, 0.0, 9.0),
                    waypoints: Vec::new(),
                },
                SpawnSetup {
                    archetype: "sentry".to_string(),
                    position: Vec3::new(-4.0, 0.0, 4.0),
                    waypoints: vec![
                        Vec3::new(-4.0, 0.0, 4.0),
                        Vec3::new(-4.0, 0.0, 10.0),
                        Vec3::new(-1.0, 0.0, 10.0),
                    ],
                },
                SpawnSetup {
                    archetype: "shieldbearer".to_string(),
                    position: Vec3::new(0.0, 0.0, 16.0),
                    waypoints: Vec::new(),
                },
            ],
        }
    }
}

impl ScenarioConfig {
    /// Loads a scenario from `path`.
    ///
    /// A missing file yields the built-in demo scenario. A file that exists
    /// but cannot be read, parsed or validated is an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Scenario file {} not found, using built-in demo", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;

        info!("Loaded scenario from {}", path.display());
        Ok(config)
    }

    /// Saves the scenario to `path`.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, contents)?;

        info!("Saved scenario to {}", path.display());
        Ok(())
    }

    /// Fixed timestep in seconds.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Number of ticks the run lasts.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (self.duration * self.tick_rate as f32).ceil() as u64
    }

    /// Checks the scenario and every actor config it contains.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::OutOfRange {
                field: "tick_rate",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        ConfigError::require_non_negative("duration", self.duration)?;
        ConfigError::require_non_negative("attack_windup", self.attack_windup)?;

        self.player.actor.validate()?;
        for config in self.archetypes.values() {
            config.validate()?;
        }
        for spawn in &self.spawns {
            if !self.archetypes.contains_key(&spawn.archetype) {
                return Err(ConfigError::UnknownReference {
                    kind: "archetype",
                    name: spawn.archetype.clone(),
                });
            }
        }
        Ok(())
    }
}
