//! Animation boundary.
//!
//! States publish parameter and trigger signals; playback lives outside the
//! core. The only signal flowing back is the "attack frame reached"
//! callback, which enters through the world.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Animation parameters the behavior core drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimParam {
    /// Locomotion blend speed
    ForwardSpeed,
    /// Start an attack swing
    Attack,
    /// Play the hit reaction
    Hit,
    /// Play the death animation
    Death,
}

/// One signal sent to the animation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimSignal {
    /// A float parameter was set
    Float(AnimParam, f32),
    /// A trigger was fired
    Trigger(AnimParam),
}

/// Animation layer as seen by the behavior core.
pub trait Animator {
    /// Sets a float parameter.
    fn set_float(&mut self, param: AnimParam, value: f32);

    /// Fires a one-shot trigger.
    fn set_trigger(&mut self, param: AnimParam);
}

/// Discards every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnimator;

impl Animator for NullAnimator {
    fn set_float(&mut self, _param: AnimParam, _value: f32) {}

    fn set_trigger(&mut self, _param: AnimParam) {}
}

/// Shared log of animation signals.
pub type AnimationLog = Rc<RefCell<Vec<AnimSignal>>>;

/// Appends every signal to a shared log.
///
/// The log handle is shared so whoever plays the animations (a test, the
/// headless runner) can read the signals while the actor owns the animator.
#[derive(Debug, Clone, Default)]
pub struct RecordingAnimator {
    log: AnimationLog,
}

impl RecordingAnimator {
    /// Creates an animator with a fresh log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the log.
    #[must_use]
    pub fn log(&self) -> AnimationLog {
        Rc::clone(&self.log)
    }
}

impl Animator for RecordingAnimator {
    fn set_float(&mut self, param: AnimParam, value: f32) {
        self.log.borrow_mut().push(AnimSignal::Float(param, value));
    }

    fn set_trigger(&mut self, param: AnimParam) {
        self.log.borrow_mut().push(AnimSignal::Trigger(param));
    }
}
