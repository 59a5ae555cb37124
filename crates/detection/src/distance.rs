//! Monocular distance estimation
//!
//! With calibration the estimator uses the pinhole model
//! `distance = focal_length * real_height / bbox_pixel_height`. Without it
//! the estimate degrades to a position-based proxy on a 0-100 scale, tagged
//! [`DistanceUnit::Normalized`] so callers never silently mix units.

use crate::calibration::Calibration;
use crate::object::{BoundingBox, ObjectClass};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Calibrated distances outside this window are treated as implausible and
/// discarded in favor of the normalized proxy.
const MIN_PLAUSIBLE_M: f32 = 0.5;
const MAX_PLAUSIBLE_M: f32 = 200.0;

/// Interval spread constants, one per unit scale
const SPREAD_METERS: f32 = 12.0;
const SPREAD_NORMALIZED: f32 = 20.0;

/// Unit of a distance estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    /// Real-world meters (calibrated pinhole model)
    Meters,
    /// Unitless 0-100 proxy, monotonic in distance
    Normalized,
}

/// Distance estimate with confidence interval
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DistanceEstimation {
    /// Primary distance value
    pub distance: f32,
    /// Unit of `distance` and `interval`
    pub unit: DistanceUnit,
    /// Estimate confidence (0.0 to 1.0)
    pub confidence: f32,
    /// Confidence interval (low, high); always brackets `distance`
    pub interval: (f32, f32),
}

/// Summary of the estimator's calibration state, for status reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationInfo {
    pub calibrated: bool,
    pub focal_length: Option<f64>,
}

/// Distance estimator for detected objects
pub struct DistanceEstimator {
    calibration: Option<Calibration>,
}

impl DistanceEstimator {
    /// Create an estimator; pass `None` to run in normalized-proxy mode
    pub fn new(calibration: Option<Calibration>) -> Self {
        info!(calibrated = calibration.is_some(), "distance estimator ready");
        Self { calibration }
    }

    /// Whether calibration data was supplied at construction
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// Calibration state summary for the status snapshot
    pub fn calibration_info(&self) -> CalibrationInfo {
        CalibrationInfo {
            calibrated: self.calibration.is_some(),
            focal_length: self.calibration.as_ref().map(|c| c.focal_length()),
        }
    }

    /// Estimate the distance to one detection
    ///
    /// Returns `None` for degenerate boxes (non-positive height) so callers
    /// can fail open instead of acting on garbage.
    pub fn estimate(
        &self,
        bbox: &BoundingBox,
        frame_height: u32,
        class: ObjectClass,
        detection_confidence: f32,
    ) -> Option<DistanceEstimation> {
        if bbox.height() <= 0.0 || frame_height == 0 {
            return None;
        }

        if let Some(calibration) = &self.calibration {
            if let Some(meters) = self.pixel_to_meters(calibration, bbox, class) {
                let confidence =
                    self.estimate_confidence(bbox, frame_height, detection_confidence, true);
                return Some(DistanceEstimation {
                    distance: meters,
                    unit: DistanceUnit::Meters,
                    confidence,
                    interval: interval_around(meters, confidence, SPREAD_METERS),
                });
            }
            debug!(?class, "pinhole distance implausible, using normalized proxy");
        }

        let normalized = normalized_distance(bbox, frame_height);
        let confidence = self.estimate_confidence(bbox, frame_height, detection_confidence, false);
        Some(DistanceEstimation {
            distance: normalized,
            unit: DistanceUnit::Normalized,
            confidence,
            interval: interval_around(normalized, confidence, SPREAD_NORMALIZED),
        })
    }

    /// Pinhole camera model conversion, with a plausibility window
    fn pixel_to_meters(
        &self,
        calibration: &Calibration,
        bbox: &BoundingBox,
        class: ObjectClass,
    ) -> Option<f32> {
        let real_height = calibration.object_height_m(class);
        let distance = (calibration.focal_length() as f32 * real_height) / bbox.height();

        if (MIN_PLAUSIBLE_M..=MAX_PLAUSIBLE_M).contains(&distance) {
            Some(distance)
        } else {
            None
        }
    }

    /// Combine detector confidence with bbox geometry
    ///
    /// Small boxes make for noisy height measurements, so the size term
    /// shrinks with bbox height; implausible aspect ratios are penalized;
    /// the calibrated path is trusted more than the proxy.
    fn estimate_confidence(
        &self,
        bbox: &BoundingBox,
        frame_height: u32,
        detection_confidence: f32,
        calibrated: bool,
    ) -> f32 {
        let size_confidence = (bbox.height() / (frame_height as f32 * 0.25)).min(1.0);
        let mut confidence = 0.6 * detection_confidence.clamp(0.0, 1.0) + 0.4 * size_confidence;

        let aspect = bbox.width() / bbox.height().max(1.0);
        if !(0.3..=3.0).contains(&aspect) {
            confidence *= 0.8;
        }

        confidence *= if calibrated { 1.2 } else { 0.7 };
        confidence.clamp(0.0, 1.0)
    }
}

/// Position-based proxy: objects lower in the frame are closer.
/// Monotonic in `1 - bbox_bottom / frame_height`, reported on a 0-100 scale.
fn normalized_distance(bbox: &BoundingBox, frame_height: u32) -> f32 {
    let proxy = 1.0 - bbox.bottom() / frame_height as f32;
    (proxy * 100.0).clamp(0.0, 100.0)
}

fn interval_around(distance: f32, confidence: f32, spread: f32) -> (f32, f32) {
    let margin = spread * (1.0 - confidence);
    ((distance - margin).max(0.0), distance + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_calibrated_pinhole_distance() {
        let calibration = Calibration::from_focal_length(1000.0, 640.0, 360.0);
        let estimator = DistanceEstimator::new(Some(calibration));

        // Car (1.5m) spanning 100px at focal length 1000px => 15m
        let bbox = BoundingBox::new(500.0, 400.0, 700.0, 500.0);
        let est = estimator
            .estimate(&bbox, 720, ObjectClass::Car, 0.9)
            .unwrap();

        assert_eq!(est.unit, DistanceUnit::Meters);
        assert!((est.distance - 15.0).abs() < 1e-3);
        assert!(est.interval.0 <= est.distance && est.distance <= est.interval.1);
    }

    #[test]
    fn test_uncalibrated_is_normalized() {
        let estimator = DistanceEstimator::new(None);
        let bbox = BoundingBox::new(100.0, 500.0, 200.0, 600.0);
        let est = estimator
            .estimate(&bbox, 1080, ObjectClass::Car, 0.9)
            .unwrap();

        assert_eq!(est.unit, DistanceUnit::Normalized);
        assert!(est.confidence > 0.0 && est.confidence <= 1.0);
        assert!(est.interval.0 <= est.distance && est.distance <= est.interval.1);
    }

    #[test]
    fn test_implausible_pinhole_falls_back() {
        // 2px-tall box at focal 1000px => 750m, outside plausibility window
        let calibration = Calibration::from_focal_length(1000.0, 640.0, 360.0);
        let estimator = DistanceEstimator::new(Some(calibration));
        let bbox = BoundingBox::new(10.0, 10.0, 14.0, 12.0);

        let est = estimator
            .estimate(&bbox, 720, ObjectClass::Car, 0.9)
            .unwrap();
        assert_eq!(est.unit, DistanceUnit::Normalized);
    }

    #[test]
    fn test_degenerate_bbox_yields_none() {
        let estimator = DistanceEstimator::new(None);
        let bbox = BoundingBox::new(10.0, 50.0, 20.0, 50.0);
        assert!(estimator.estimate(&bbox, 720, ObjectClass::Car, 0.9).is_none());
    }

    #[test]
    fn test_closer_objects_get_smaller_proxy() {
        let estimator = DistanceEstimator::new(None);
        let near = BoundingBox::new(0.0, 500.0, 100.0, 700.0);
        let far = BoundingBox::new(0.0, 300.0, 100.0, 400.0);

        let near_est = estimator.estimate(&near, 720, ObjectClass::Car, 0.9).unwrap();
        let far_est = estimator.estimate(&far, 720, ObjectClass::Car, 0.9).unwrap();
        assert!(near_est.distance < far_est.distance);
    }

    proptest! {
        #[test]
        fn prop_interval_brackets_distance(
            x1 in 0.0f32..500.0,
            y1 in 0.0f32..500.0,
            w in 1.0f32..300.0,
            h in 1.0f32..300.0,
            conf in 0.0f32..1.0,
        ) {
            let estimator = DistanceEstimator::new(None);
            let bbox = BoundingBox::new(x1, y1, x1 + w, y1 + h);
            let est = estimator.estimate(&bbox, 1080, ObjectClass::Car, conf).unwrap();

            prop_assert!(est.interval.0 <= est.distance);
            prop_assert!(est.distance <= est.interval.1);
            prop_assert!((0.0..=1.0).contains(&est.confidence));
        }
    }
}
