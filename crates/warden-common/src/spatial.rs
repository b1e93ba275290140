//! Classification layers and horizontal-plane vector helpers.
//!
//! The simulation is y-up: "horizontal" always means the XZ plane.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// World up axis.
pub const UP: Vec3 = Vec3::Y;

/// Classification layer of an actor, used to filter detection candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// The player character
    Player,
    /// Hostile non-player actors
    Enemy,
    /// Friendly non-player actors
    Ally,
    /// Anything else (props, decoys)
    Neutral,
}

impl Layer {
    /// Bit for this layer within a [`LayerMask`].
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Player => 1 << 0,
            Self::Enemy => 1 << 1,
            Self::Ally => 1 << 2,
            Self::Neutral => 1 << 3,
        }
    }
}

/// Set of layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(u32);

impl LayerMask {
    /// Mask matching nothing.
    pub const NONE: Self = Self(0);
    /// Mask matching every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Checks if `layer` is part of this mask.
    #[must_use]
    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }
}

impl From<Layer> for LayerMask {
    fn from(layer: Layer) -> Self {
        Self(layer.bit())
    }
}

impl BitOr<Layer> for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Layer) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Position and facing of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position
    pub position: Vec3,
    /// Unit facing vector
    pub forward: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl Transform {
    /// Creates a transform at `position` facing +Z.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::Z,
        }
    }

    /// Sets the facing vector, normalized on the horizontal plane.
    #[must_use]
    pub fn facing(mut self, forward: Vec3) -> Self {
        self.forward = flatten(forward).try_normalize().unwrap_or(Vec3::Z);
        self
    }

    /// Distance to a point.
    #[must_use]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

/// Removes the vertical component of `v`.
#[must_use]
pub fn flatten(v: Vec3) -> Vec3 {
    v - UP * UP.dot(v)
}

/// Rotates `v` around the up axis by `degrees`.
#[must_use]
pub fn rotate_about_up(v: Vec3, degrees: f32) -> Vec3 {
    Quat::from_axis_angle(UP, degrees.to_radians()) * v
}

/// Unsigned angle in degrees between two vectors after flattening both.
///
/// Returns `None` when either vector has no horizontal extent, since the
/// angle is undefined there.
#[must_use]
pub fn horizontal_angle_deg(a: Vec3, b: Vec3) -> Option<f32> {
    let a = flatten(a).try_normalize()?;
    let b = flatten(b).try_normalize()?;
    Some(a.dot(b).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Turns `forward` toward `direction` on the horizontal plane.
///
/// `t` is the interpolation factor for this step (turn speed times delta
/// time); it is clamped to `[0, 1]`. A degenerate direction leaves
/// `forward` untouched.
#[must_use]
pub fn turn_towards(forward: Vec3, direction: Vec3, t: f32) -> Vec3 {
    let Some(target) = flatten(direction).try_normalize() else {
        return forward;
    };
    let Some(current) = flatten(forward).try_normalize() else {
        return target;
    };
    let rotation = Quat::from_rotation_arc(current, target);
    let step = Quat::IDENTITY.slerp(rotation, t.clamp(0.0, 1.0));
    (step * current).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_flatten_drops_height() {
        let v = flatten(Vec3::new(1.0, 7.0, -2.0));
        assert_eq!(v, Vec3::new(1.0, 0.0, -2.0));
    }

    #[test]
    fn test_rotate_about_up() {
        let v = rotate_about_up(Vec3::Z, 90.0);
        assert!((v - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_horizontal_angle() {
        let angle = horizontal_angle_deg(Vec3::Z, Vec3::new(1.0, 3.0, 0.0));
        assert!((angle.unwrap_or_default() - 90.0).abs() < 1e-3);
        assert!(horizontal_angle_deg(Vec3::Z, Vec3::Y).is_none());
    }

    #[test]
    fn test_turn_towards_full_step() {
        let turned = turn_towards(Vec3::Z, Vec3::X, 1.0);
        assert!((turned - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_turn_towards_partial_step() {
        let turned = turn_towards(Vec3::Z, Vec3::X, 0.5);
        let angle = horizontal_angle_deg(turned, Vec3::Z).unwrap_or_default();
        assert!((angle - 45.0).abs() < 1e-2);
    }

    #[test]
    fn test_layer_mask_all() {
        assert!(LayerMask::ALL.contains(Layer::Neutral));
        assert!(!LayerMask::NONE.contains(Layer::Player));
    }

    fn horizontal() -> impl Strategy<Value = Vec3> {
        (-10.0f32..10.0, -5.0f32..5.0, -10.0f32..10.0)
            .prop_map(|(x, y, z)| Vec3::new(x, y, z))
            .prop_filter("needs horizontal extent", |v| flatten(*v).length() > 0.1)
    }

    proptest! {
        #[test]
        fn test_horizontal_angle_symmetric_and_bounded(a in horizontal(), b in horizontal()) {
            let ab = horizontal_angle_deg(a, b);
            let ba = horizontal_angle_deg(b, a);
            prop_assert!(ab.is_some());
            let (ab, ba) = (ab.unwrap_or_default(), ba.unwrap_or_default());
            prop_assert!((0.0..=180.0).contains(&ab));
            prop_assert!((ab - ba).abs() < 1e-3);
        }

        #[test]
        fn test_turn_towards_full_step_lands_on_direction(
            forward in horizontal(),
            direction in horizontal(),
        ) {
            let turned = turn_towards(forward, direction, 1.0);
            let expected = flatten(direction).normalize();
            prop_assert!((turned - expected).length() < 1e-3, "turned {turned:?} expected {expected:?}");
            prop_assert!(turned.y.abs() < 1e-3);
        }
    }
}
