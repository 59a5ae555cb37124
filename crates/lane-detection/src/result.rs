//! Lane detection result types

use serde::{Deserialize, Serialize};

/// Which detector produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneModel {
    /// Pretrained neural model
    Neural,
    /// Edge/Hough fallback
    Deterministic,
}

/// Result of one lane detection pass
///
/// Invariant: when `success` is `false` both lane fields are `None` and
/// downstream consumers treat the frame as "no lane".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneDetectionResult {
    /// Left lane line, ordered bottom (near) to top (far)
    pub left_lane: Option<Vec<(f32, f32)>>,
    /// Right lane line, ordered bottom (near) to top (far)
    pub right_lane: Option<Vec<(f32, f32)>>,
    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,
    /// Whether any lane geometry was found
    pub success: bool,
    /// Detector that produced this result
    pub model_used: LaneModel,
}

impl LaneDetectionResult {
    /// A "no lane" result
    pub fn none(model_used: LaneModel) -> Self {
        Self {
            left_lane: None,
            right_lane: None,
            confidence: 0.0,
            success: false,
            model_used,
        }
    }

    /// A successful result; at least one lane must be present
    pub fn detected(
        left_lane: Option<Vec<(f32, f32)>>,
        right_lane: Option<Vec<(f32, f32)>>,
        confidence: f32,
        model_used: LaneModel,
    ) -> Self {
        let success = left_lane.is_some() || right_lane.is_some();
        Self {
            left_lane: if success { left_lane } else { None },
            right_lane: if success { right_lane } else { None },
            confidence: confidence.clamp(0.0, 1.0),
            success,
            model_used,
        }
    }

    /// Both lane sides present
    pub fn has_both_lanes(&self) -> bool {
        self.left_lane.is_some() && self.right_lane.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_none_result_has_no_lanes() {
        let result = LaneDetectionResult::none(LaneModel::Deterministic);
        assert!(!result.success);
        assert!(result.left_lane.is_none());
        assert!(result.right_lane.is_none());
    }

    #[test]
    fn test_detected_without_lanes_is_failure() {
        let result = LaneDetectionResult::detected(None, None, 0.9, LaneModel::Neural);
        assert!(!result.success);
    }

    #[test]
    fn test_detected_single_lane_succeeds() {
        let result = LaneDetectionResult::detected(
            Some(vec![(100.0, 720.0), (300.0, 432.0)]),
            None,
            0.8,
            LaneModel::Neural,
        );
        assert!(result.success);
        assert!(!result.has_both_lanes());
    }

    proptest! {
        // The result invariant holds for any detector output: confidence
        // clamped, success iff any lane, and no lanes on failure
        #[test]
        fn prop_detected_upholds_result_invariant(
            confidence in -2.0f32..3.0,
            has_left in any::<bool>(),
            has_right in any::<bool>(),
        ) {
            let left = has_left.then(|| vec![(100.0, 720.0), (140.0, 432.0)]);
            let right = has_right.then(|| vec![(180.0, 720.0), (160.0, 432.0)]);
            let result = LaneDetectionResult::detected(left, right, confidence, LaneModel::Neural);

            prop_assert_eq!(result.success, has_left || has_right);
            prop_assert!((0.0..=1.0).contains(&result.confidence));
            if !result.success {
                prop_assert!(result.left_lane.is_none() && result.right_lane.is_none());
            }
        }
    }
}
