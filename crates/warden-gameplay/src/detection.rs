//! Periodic proximity detection.
//!
//! A detector scans a sphere around its owner for the nearest candidate on
//! the layers it cares about. Scans run on their own cadence (10 Hz by
//! default) so the cost of spatial queries does not scale with the tick
//! rate; between scans the cached result is served.

use crate::config::ActorConfig;
use crate::timer::IntervalTimer;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;
use warden_common::{EntityId, Layer, LayerMask};

/// Something a detector may pick as its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate entity
    pub entity: EntityId,
    /// Its world position
    pub position: Vec3,
    /// Its classification layer
    pub layer: Layer,
}

/// The cached result of the last scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedTarget {
    /// Target entity
    pub entity: EntityId,
    /// Last known position of the target
    pub position: Vec3,
    /// Distance from the detector's origin at scan time
    pub distance: f32,
}

/// Nearest-target scanner with its own cadence.
#[derive(Debug, Clone)]
pub struct ProximityDetector {
    /// Entity doing the scanning; never picked as its own target
    owner: EntityId,
    /// Scan radius
    radius: f32,
    /// Layers considered
    mask: LayerMask,
    /// Scan cadence
    timer: IntervalTimer,
    /// Nearest candidate from the last scan
    target: Option<DetectedTarget>,
}

impl ProximityDetector {
    /// Creates a detector. The first scan happens on the first advance.
    #[must_use]
    pub fn new(owner: EntityId, radius: f32, interval: f32, mask: LayerMask) -> Self {
        Self {
            owner,
            radius: radius.max(0.0),
            mask,
            timer: IntervalTimer::immediate(interval),
            target: None,
        }
    }

    /// Creates a detector from an actor's tunables.
    #[must_use]
    pub fn from_config(owner: EntityId, config: &ActorConfig) -> Self {
        Self::new(
            owner,
            config.detection_radius,
            config.detection_interval,
            config.target_mask,
        )
    }

    /// Returns the scan radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Returns the scan cadence in seconds.
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.timer.interval()
    }

    /// Returns the number of scans performed.
    #[must_use]
    pub fn scans(&self) -> u64 {
        self.timer.fired()
    }

    /// Returns the current target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&DetectedTarget> {
        self.target.as_ref()
    }

    /// Returns the distance recorded at the last scan, or zero without a target.
    #[must_use]
    pub fn distance_to_target(&self) -> f32 {
        self.target.map_or(0.0, |t| t.distance)
    }

    /// Advances the scan cadence. Returns true when a scan is due.
    ///
    /// Several elapsed intervals in one step still mean a single scan; the
    /// result would be identical.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.timer.advance(dt) > 0
    }

    /// Recomputes the nearest qualifying candidate around `origin`.
    ///
    /// Candidates on other layers, the owner itself, and anything beyond the
    /// radius are skipped. Ties keep the first candidate seen. With nothing
    /// in range the target is cleared.
    pub fn scan(&mut self, origin: Vec3, candidates: &[Candidate]) -> Option<&DetectedTarget> {
        let mut nearest: Option<DetectedTarget> = None;
        let mut shortest = f32::INFINITY;

        for candidate in candidates {
            if candidate.entity == self.owner || !self.mask.contains(candidate.layer) {
                continue;
            }
            let distance = origin.distance(candidate.position);
            if distance < shortest {
                shortest = distance;
                nearest = Some(DetectedTarget {
                    entity: candidate.entity,
                    position: candidate.position,
                    distance,
                });
            }
        }

        self.target = nearest.filter(|t| t.distance <= self.radius);
        trace!(
            owner = %self.owner,
            target = ?self.target.map(|t| t.entity),
            "proximity scan"
        );
        self.target.as_ref()
    }

    /// Updates the cached position of the current target between scans.
    pub fn track(&mut self, position: Vec3) {
        if let Some(target) = &mut self.target {
            target.position = position;
        }
    }

    /// Forgets the current target.
    pub fn clear_target(&mut self) {
        self.target = None;
    }
}
