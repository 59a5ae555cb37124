//! Cooperative animation engine
//!
//! Single-threaded: the frame processor calls [`AnimationEngine::update`]
//! once per frame with the elapsed wall time, then samples values by name
//! while rendering. No animation advances outside `update`.

use crate::easing::Easing;
use std::collections::HashMap;
use tracing::debug;

/// One registered animation
#[derive(Debug, Clone)]
struct Animation {
    duration: f32,
    easing: Easing,
    elapsed: f32,
    looping: bool,
    reverse: bool,
    /// Direction flag for reversing animations
    reversed: bool,
}

impl Animation {
    /// Raw progress in [0, 1] before easing
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        if self.looping {
            (self.elapsed % self.duration) / self.duration
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    fn advance(&mut self, delta: f32) {
        self.elapsed += delta;
        // Reversing animations flip direction each time a cycle completes,
        // giving back-and-forth motion
        while self.reverse && self.duration > 0.0 && self.elapsed >= self.duration {
            self.elapsed -= self.duration;
            self.reversed = !self.reversed;
        }
    }

    fn value(&self) -> f32 {
        let eased = self.easing.apply(self.progress());
        if self.reversed {
            1.0 - eased
        } else {
            eased
        }
    }
}

/// Named time-based progress values with easing
#[derive(Debug, Default)]
pub struct AnimationEngine {
    animations: HashMap<String, Animation>,
    total_time: f32,
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-shot animation; re-registering a name restarts it
    pub fn register(&mut self, name: &str, duration: f32, easing: Easing) {
        self.insert(name, duration, easing, false, false);
    }

    /// Register a looping animation (progress wraps via modulo)
    pub fn register_looping(&mut self, name: &str, duration: f32, easing: Easing) {
        self.insert(name, duration, easing, true, false);
    }

    /// Register a reversing animation (back-and-forth motion)
    pub fn register_reversing(&mut self, name: &str, duration: f32, easing: Easing) {
        self.insert(name, duration, easing, false, true);
    }

    fn insert(&mut self, name: &str, duration: f32, easing: Easing, looping: bool, reverse: bool) {
        debug!(name, duration, ?easing, looping, reverse, "animation registered");
        self.animations.insert(
            name.to_string(),
            Animation {
                duration,
                easing,
                elapsed: 0.0,
                looping,
                reverse,
                reversed: false,
            },
        );
    }

    /// Advance every animation by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        if delta_time <= 0.0 {
            return;
        }
        self.total_time += delta_time;
        for animation in self.animations.values_mut() {
            animation.advance(delta_time);
        }
    }

    /// Current eased value in [0, 1]; unknown names read as 0
    pub fn value(&self, name: &str) -> f32 {
        self.animations.get(name).map_or(0.0, Animation::value)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    /// Remove a single animation
    pub fn remove(&mut self, name: &str) {
        self.animations.remove(name);
    }

    /// Drop all animations and reset the clock
    pub fn reset(&mut self) {
        self.animations.clear();
        self.total_time = 0.0;
    }

    pub fn count(&self) -> usize {
        self.animations.len()
    }

    /// Total time fed through `update` since the last reset
    pub fn total_time(&self) -> f32 {
        self.total_time
    }
}
