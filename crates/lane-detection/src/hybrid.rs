//! Hybrid detector: neural model with deterministic fallback

use crate::edge::EdgeLaneDetector;
use crate::result::{LaneDetectionResult, LaneModel};
use crate::NeuralLaneDetector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use video_frame::VideoFrame;

/// Cumulative detection statistics, read-only to callers
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DetectorStats {
    /// Frames processed
    pub total: u64,
    /// Frames answered by the neural model
    pub dl_used: u64,
    /// Frames answered by the deterministic fallback
    pub cv_used: u64,
    /// Neural attempts that failed or fell below the confidence threshold
    pub dl_failures: u64,
}

/// Lane detector that prefers the neural model and falls back to the
/// deterministic detector under a confidence policy
///
/// Once `max_consecutive_failures` neural attempts in a row fail, the
/// neural path is disabled for the remainder of the session. This is a
/// one-way transition: per-frame flapping between models would produce
/// inconsistent driver-facing output, and a sticky "DL unavailable" state
/// is something the renderer can surface honestly.
pub struct HybridLaneDetector {
    neural: Option<Box<dyn NeuralLaneDetector>>,
    edge: EdgeLaneDetector,
    conf_threshold: f32,
    max_consecutive_failures: u32,
    consecutive_failures: u32,
    dl_enabled: bool,
    stats: DetectorStats,
}

impl HybridLaneDetector {
    /// Create a hybrid detector; `neural = None` starts directly in
    /// deterministic-only mode with the failure logic inert
    pub fn new(
        neural: Option<Box<dyn NeuralLaneDetector>>,
        conf_threshold: f32,
        max_consecutive_failures: u32,
    ) -> Self {
        let dl_enabled = neural.is_some();
        info!(
            dl_enabled,
            conf_threshold, "hybrid lane detector initialized"
        );
        Self {
            neural,
            edge: EdgeLaneDetector::new(),
            conf_threshold,
            max_consecutive_failures,
            consecutive_failures: 0,
            dl_enabled,
            stats: DetectorStats::default(),
        }
    }

    /// Detect lanes, applying the confidence fallback policy
    pub fn detect(&mut self, frame: &VideoFrame) -> LaneDetectionResult {
        self.stats.total += 1;

        if self.dl_enabled {
            if let Some(neural) = self.neural.as_mut() {
                match neural.detect(frame) {
                    Ok(result) if result.success && result.confidence >= self.conf_threshold => {
                        self.consecutive_failures = 0;
                        self.stats.dl_used += 1;
                        return result;
                    }
                    Ok(result) => {
                        debug!(
                            confidence = result.confidence,
                            threshold = self.conf_threshold,
                            "neural result rejected"
                        );
                        self.note_neural_failure();
                    }
                    Err(error) => {
                        warn!(%error, "neural lane detection failed");
                        self.note_neural_failure();
                    }
                }
            }
        }

        self.deterministic_pass(frame)
    }

    /// Run only the deterministic detector (used in safe mode)
    pub fn detect_deterministic(&mut self, frame: &VideoFrame) -> LaneDetectionResult {
        self.stats.total += 1;
        self.deterministic_pass(frame)
    }

    fn deterministic_pass(&mut self, frame: &VideoFrame) -> LaneDetectionResult {
        self.stats.cv_used += 1;
        match self.edge.detect(frame) {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "deterministic lane detection failed");
                LaneDetectionResult::none(LaneModel::Deterministic)
            }
        }
    }

    fn note_neural_failure(&mut self) {
        self.stats.dl_failures += 1;
        self.consecutive_failures += 1;
        if self.dl_enabled && self.consecutive_failures >= self.max_consecutive_failures {
            warn!(
                failures = self.consecutive_failures,
                "disabling neural lane detection for the rest of the session"
            );
            self.dl_enabled = false;
        }
    }

    /// Whether the neural path is still available this session
    pub fn dl_enabled(&self) -> bool {
        self.dl_enabled
    }

    /// Cumulative statistics
    pub fn stats(&self) -> DetectorStats {
        self.stats
    }

    /// Update the neural confidence threshold
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        self.conf_threshold = threshold.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LaneError;
    use std::collections::VecDeque;

    /// Scripted neural detector: pops one canned response per frame
    struct ScriptedNeural {
        script: VecDeque<Result<LaneDetectionResult, LaneError>>,
    }

    impl ScriptedNeural {
        fn new(script: Vec<Result<LaneDetectionResult, LaneError>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl NeuralLaneDetector for ScriptedNeural {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<LaneDetectionResult, LaneError> {
            self.script
                .pop_front()
                .unwrap_or(Err(LaneError::Inference("script exhausted".into())))
        }
    }

    fn confident_result() -> LaneDetectionResult {
        LaneDetectionResult::detected(
            Some(vec![(100.0, 200.0), (140.0, 120.0)]),
            Some(vec![(180.0, 200.0), (150.0, 120.0)]),
            0.9,
            LaneModel::Neural,
        )
    }

    fn weak_result() -> LaneDetectionResult {
        LaneDetectionResult::detected(
            Some(vec![(100.0, 200.0), (140.0, 120.0)]),
            None,
            0.2,
            LaneModel::Neural,
        )
    }

    fn frame() -> VideoFrame {
        VideoFrame::blank(200, 200)
    }

    #[test]
    fn test_confident_neural_result_is_used() {
        let neural = ScriptedNeural::new(vec![Ok(confident_result())]);
        let mut detector = HybridLaneDetector::new(Some(Box::new(neural)), 0.6, 5);

        let result = detector.detect(&frame());
        assert_eq!(result.model_used, LaneModel::Neural);
        assert_eq!(detector.stats().dl_used, 1);
        assert_eq!(detector.stats().cv_used, 0);
    }

    #[test]
    fn test_low_confidence_falls_back() {
        let neural = ScriptedNeural::new(vec![Ok(weak_result())]);
        let mut detector = HybridLaneDetector::new(Some(Box::new(neural)), 0.6, 5);

        let result = detector.detect(&frame());
        assert_eq!(result.model_used, LaneModel::Deterministic);
        assert_eq!(detector.stats().cv_used, 1);
        assert_eq!(detector.stats().dl_failures, 1);
        assert!(detector.dl_enabled());
    }

    #[test]
    fn test_neural_disabled_after_max_failures_and_stays_off() {
        let mut script: Vec<_> = (0..5)
            .map(|_| Err(LaneError::Inference("boom".into())))
            .collect();
        // A would-be success after disablement must never be consulted
        script.push(Ok(confident_result()));
        let neural = ScriptedNeural::new(script);
        let mut detector = HybridLaneDetector::new(Some(Box::new(neural)), 0.6, 5);

        for i in 0..5 {
            detector.detect(&frame());
            let expect_enabled = i < 4;
            assert_eq!(detector.dl_enabled(), expect_enabled, "frame {i}");
        }

        // Disablement is permanent for the session
        for _ in 0..3 {
            let result = detector.detect(&frame());
            assert_eq!(result.model_used, LaneModel::Deterministic);
            assert!(!detector.dl_enabled());
        }
        assert_eq!(detector.stats().dl_failures, 5);
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let neural = ScriptedNeural::new(vec![
            Err(LaneError::Inference("a".into())),
            Err(LaneError::Inference("b".into())),
            Ok(confident_result()),
            Err(LaneError::Inference("c".into())),
            Err(LaneError::Inference("d".into())),
            Err(LaneError::Inference("e".into())),
            Err(LaneError::Inference("f".into())),
        ]);
        let mut detector = HybridLaneDetector::new(Some(Box::new(neural)), 0.6, 5);

        for _ in 0..7 {
            detector.detect(&frame());
        }
        // 2 failures, reset, then only 4 more: still below the limit
        assert!(detector.dl_enabled());
    }

    #[test]
    fn test_no_neural_detector_starts_deterministic_only() {
        let mut detector = HybridLaneDetector::new(None, 0.6, 5);
        assert!(!detector.dl_enabled());

        let result = detector.detect(&frame());
        assert_eq!(result.model_used, LaneModel::Deterministic);
        assert_eq!(detector.stats().cv_used, 1);
        assert_eq!(detector.stats().dl_failures, 0);
    }
}
