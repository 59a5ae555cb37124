//! Forward Collision Warning System

use detection::{Detection, DistanceEstimation, DistanceEstimator, DistanceUnit};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// FCWS warning state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FcwsState {
    #[default]
    Safe,
    Warning,
    Critical,
}

/// In-path detection annotated with its distance estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskyDetection {
    pub detection: Detection,
    pub estimate: DistanceEstimation,
}

/// Forward collision warning state machine
///
/// Thresholds are in the estimator's unit: meters when calibrated, the
/// 0-100 normalized scale otherwise.
pub struct Fcws {
    warning_distance: f32,
    critical_distance: f32,
    /// Fraction of the frame width treated as the forward path
    forward_band: f32,
    state: FcwsState,
    frames_in_state: u32,
}

impl Fcws {
    pub fn new(warning_distance: f32, critical_distance: f32, forward_band: f32) -> Self {
        Self {
            warning_distance,
            critical_distance,
            forward_band: forward_band.clamp(0.0, 1.0),
            state: FcwsState::Safe,
            frames_in_state: 0,
        }
    }

    /// Evaluate collision risk for one frame
    ///
    /// Returns the new state plus the in-path detections sorted closest
    /// first (stable, so ties keep insertion order). An empty detection
    /// list or missing distances resolve to `Safe` regardless of the
    /// previous state. Estimates whose unit does not match the
    /// estimator's session mode (a normalized proxy inside a calibrated
    /// session) are discarded rather than compared against thresholds in
    /// the wrong unit.
    pub fn check(
        &mut self,
        detections: &[Detection],
        estimator: &DistanceEstimator,
        frame_width: u32,
        frame_height: u32,
    ) -> (FcwsState, Vec<RiskyDetection>) {
        let band_left = frame_width as f32 * (1.0 - self.forward_band) / 2.0;
        let band_right = frame_width as f32 - band_left;
        let session_unit = if estimator.is_calibrated() {
            DistanceUnit::Meters
        } else {
            DistanceUnit::Normalized
        };

        let mut risky: Vec<RiskyDetection> = detections
            .iter()
            .filter(|det| {
                let (cx, _) = det.bbox.center();
                det.class.is_collision_relevant() && cx > band_left && cx < band_right
            })
            .filter_map(|det| {
                estimator
                    .estimate(&det.bbox, frame_height, det.class, det.confidence)
                    .filter(|estimate| estimate.unit == session_unit)
                    .map(|estimate| RiskyDetection {
                        detection: det.clone(),
                        estimate,
                    })
            })
            .collect();

        risky.sort_by(|a, b| a.estimate.distance.total_cmp(&b.estimate.distance));

        // A distance exactly at a threshold is NOT below it and falls into
        // the less severe state.
        let new_state = match risky.first() {
            None => FcwsState::Safe,
            Some(closest) if closest.estimate.distance < self.critical_distance => {
                FcwsState::Critical
            }
            Some(closest) if closest.estimate.distance < self.warning_distance => {
                FcwsState::Warning
            }
            Some(_) => FcwsState::Safe,
        };

        if new_state == self.state {
            self.frames_in_state = self.frames_in_state.saturating_add(1);
        } else {
            debug!(?new_state, previous = ?self.state, "FCWS state change");
            self.state = new_state;
            self.frames_in_state = 1;
        }

        (self.state, risky)
    }

    pub fn state(&self) -> FcwsState {
        self.state
    }

    pub fn frames_in_state(&self) -> u32 {
        self.frames_in_state
    }

    pub fn warning_distance(&self) -> f32 {
        self.warning_distance
    }

    pub fn critical_distance(&self) -> f32 {
        self.critical_distance
    }

    /// Update thresholds; callers validate `warning > critical` beforehand
    pub fn set_thresholds(&mut self, warning_distance: f32, critical_distance: f32) {
        self.warning_distance = warning_distance;
        self.critical_distance = critical_distance;
    }
}
