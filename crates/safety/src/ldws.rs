//! Lane Departure Warning System

use serde::{Deserialize, Serialize};
use tracing::debug;

/// LDWS warning state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LdwsState {
    #[default]
    Safe,
    LeftWarning,
    RightWarning,
}

/// Lane departure warning state machine
///
/// State is determined solely by the signed lane offset against the
/// departure threshold. The consecutive-departure counter feeds the
/// renderer's pulsing emphasis and never influences transitions.
pub struct Ldws {
    departure_threshold: f32,
    state: LdwsState,
    departure_frames: u32,
}

impl Ldws {
    pub fn new(departure_threshold: f32) -> Self {
        Self {
            departure_threshold,
            state: LdwsState::Safe,
            departure_frames: 0,
        }
    }

    /// Evaluate lane departure for one frame
    ///
    /// `offset` is the signed vehicle offset from the lane center (positive
    /// means right of center); `None` means no lane and resolves to `Safe`
    /// with the departure counter reset.
    pub fn check(&mut self, offset: Option<f32>) -> LdwsState {
        let new_state = match offset {
            None => LdwsState::Safe,
            Some(offset) if offset > self.departure_threshold => LdwsState::RightWarning,
            Some(offset) if offset < -self.departure_threshold => LdwsState::LeftWarning,
            Some(_) => LdwsState::Safe,
        };

        if new_state == LdwsState::Safe {
            self.departure_frames = 0;
        } else {
            self.departure_frames = self.departure_frames.saturating_add(1);
        }

        if new_state != self.state {
            debug!(?new_state, "LDWS state change");
            self.state = new_state;
        }
        self.state
    }

    pub fn state(&self) -> LdwsState {
        self.state
    }

    /// Consecutive frames spent in any departure state
    pub fn departure_frames(&self) -> u32 {
        self.departure_frames
    }

    pub fn set_threshold(&mut self, departure_threshold: f32) {
        self.departure_threshold = departure_threshold;
    }
}
