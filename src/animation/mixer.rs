use std::sync::Arc;

use crate::animation::action::AnimationAction;
use crate::animation::clip::AnimationClip;
use crate::animation::clock::Clock;

/// Per-instance animation driver.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
    clock: Clock,
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mixer already playing `clip` in a loop.
    #[must_use]
    pub fn playing(clip: Arc<AnimationClip>) -> Self {
        let mut mixer = Self::new();
        mixer.add_action(AnimationAction::new(clip));
        mixer
    }

    pub fn add_action(&mut self, action: AnimationAction) {
        self.actions.push(action);
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn update(&mut self, dt: f32) {
        self.clock.tick(dt);
        let dt = self.clock.dt_seconds();
        for action in &mut self.actions {
            action.update(dt);
        }
    }

    pub fn stop_all(&mut self) {
        for action in &mut self.actions {
            action.paused = true;
        }
    }
}
