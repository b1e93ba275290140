//! Per-actor tunables.

use serde::{Deserialize, Serialize};
use warden_common::{ConfigError, Layer, LayerMask};

/// Tunables for one actor archetype.
///
/// Every field has a default, so partial definitions in a scenario file
/// only need to list what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    // === Detection ===
    /// Radius of the proximity scan
    pub detection_radius: f32,
    /// Seconds between proximity scans
    pub detection_interval: f32,
    /// Layers the scan considers as targets
    pub target_mask: LayerMask,

    // === Combat ===
    /// Distance at which a target can be attacked
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Damage dealt per attack
    pub attack_damage: f32,

    // === Health ===
    /// Maximum health
    pub max_health: f32,
    /// Invulnerability window after a hit, in seconds
    pub invulnerability_time: f32,
    /// Half-angle of the cone hits are accepted from, in degrees (180 = all around)
    pub hit_half_angle: f32,
    /// Rotation applied to the forward vector before the hit-cone test, in degrees
    pub hit_forward_rotation: f32,
    /// Open the invulnerability window when the actor is activated
    pub spawn_invulnerable: bool,
    /// Seconds between death and removal from the world
    pub despawn_delay: f32,

    // === Movement ===
    /// Turn rate used when facing a target
    pub turn_speed: f32,
    /// Navigation speed
    pub move_speed: f32,
    /// Distance at which a patrol waypoint counts as reached
    pub patrol_stopping_distance: f32,
    /// Shortest idle pause between patrol legs, in seconds
    pub patrol_dwell_min: f32,
    /// Longest idle pause between patrol legs, in seconds
    pub patrol_dwell_max: f32,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            // Detection
            detection_radius: 5.0,
            detection_interval: 0.1,
            target_mask: LayerMask::from(Layer::Player),

            // Combat
            attack_range: 2.0,
            attack_cooldown: 2.0,
            attack_damage: 20.0,

            // Health
            max_health: 100.0,
            invulnerability_time: 2.0,
            hit_half_angle: 180.0,
            hit_forward_rotation: 0.0,
            spawn_invulnerable: true,
            despawn_delay: 2.0,

            // Movement
            turn_speed: 5.0,
            move_speed: 3.5,
            patrol_stopping_distance: 0.5,
            patrol_dwell_min: 0.0,
            patrol_dwell_max: 3.0,
        }
    }
}

impl ActorConfig {
    /// Checks every tunable, refusing values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("detection_radius", self.detection_radius)?;
        ConfigError::require_positive("detection_interval", self.detection_interval)?;
        ConfigError::require_non_negative("attack_range", self.attack_range)?;
        ConfigError::require_non_negative("attack_cooldown", self.attack_cooldown)?;
        ConfigError::require_non_negative("attack_damage", self.attack_damage)?;
        ConfigError::require_positive("max_health", self.max_health)?;
        ConfigError::require_non_negative("invulnerability_time", self.invulnerability_time)?;
        ConfigError::require_non_negative("despawn_delay", self.despawn_delay)?;
        ConfigError::require_non_negative("turn_speed", self.turn_speed)?;
        ConfigError::require_non_negative("move_speed", self.move_speed)?;
        ConfigError::require_non_negative("patrol_stopping_distance", self.patrol_stopping_distance)?;
        ConfigError::require_non_negative("patrol_dwell_min", self.patrol_dwell_min)?;

        if !(0.0..=180.0).contains(&self.hit_half_angle) {
            return Err(ConfigError::OutOfRange {
                field: "hit_half_angle",
                value: self.hit_half_angle,
                reason: "must be between 0 and 180 degrees",
            });
        }
        if self.patrol_dwell_max < self.patrol_dwell_min {
            return Err(ConfigError::OutOfRange {
                field: "patrol_dwell_max",
                value: self.patrol_dwell_max,
                reason: "must not be below patrol_dwell_min",
            });
        }
        Ok(())
    }
}
