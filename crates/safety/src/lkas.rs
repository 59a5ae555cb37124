//! Lane Keeping Assistance System

use serde::{Deserialize, Serialize};

/// Proportional gain: a vehicle at the frame edge maps to 30 degrees
const STEERING_GAIN_DEG: f32 = 30.0;

/// Hard clamp on the advisory angle
const MAX_STEERING_DEG: f32 = 45.0;

/// LKAS status snapshot
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LkasStatus {
    pub active: bool,
    pub steering_angle: f32,
}

/// Continuous steering-angle advisory
///
/// The angle is a pure proportional response to the lane offset; the
/// `assist_active` flag is a separate threshold gate used for display.
pub struct Lkas {
    assist_threshold: f32,
    steering_angle: f32,
    assist_active: bool,
}

impl Lkas {
    pub fn new(assist_threshold: f32) -> Self {
        Self {
            assist_threshold,
            steering_angle: 0.0,
            assist_active: false,
        }
    }

    /// Update the advisory from this frame's lane offset
    ///
    /// Returns the steering angle in degrees; negative steers left. Both
    /// the angle and the active flag reset when the offset is undefined.
    pub fn update(&mut self, offset: Option<f32>, frame_width: u32) -> f32 {
        match offset {
            None => {
                self.steering_angle = 0.0;
                self.assist_active = false;
            }
            Some(offset) => {
                let half_width = (frame_width as f32 / 2.0).max(1.0);
                self.steering_angle = (offset / half_width * STEERING_GAIN_DEG)
                    .clamp(-MAX_STEERING_DEG, MAX_STEERING_DEG);
                self.assist_active = offset.abs() > self.assist_threshold;
            }
        }
        self.steering_angle
    }

    pub fn steering_angle(&self) -> f32 {
        self.steering_angle
    }

    pub fn assist_active(&self) -> bool {
        self.assist_active
    }

    pub fn status(&self) -> LkasStatus {
        LkasStatus {
            active: self.assist_active,
            steering_angle: self.steering_angle,
        }
    }

    pub fn set_threshold(&mut self, assist_threshold: f32) {
        self.assist_threshold = assist_threshold;
    }
}
