//! Frame processor: one call per frame, one annotated frame back
//!
//! Stage order is fixed: object detection, lane detection, safety state
//! machines, overlay rendering. Stage wall times feed the governor after
//! every successful frame; a failed detection stage returns the last
//! good output so the display never goes dark.

use crate::config::{ConfigError, ConfigPatch, PipelineConfig};
use crate::governor::{Governor, PerfTier, StageTimings};
use crate::status::{PipelineMetrics, StatusSnapshot};
use bev::{BevTransformer, PipCorner};
use detection::{Calibration, Detection, DistanceEstimator, ObjectDetector};
use image::RgbImage;
use lane_detection::{
    metrics, HybridLaneDetector, LaneDetectionResult, LaneModel, NeuralLaneDetector,
};
use overlay::{
    AnimationEngine, ArrowDirection, Easing, OverlayConfig, OverlayRenderer, PanelState,
    WarningSeverity,
};
use safety::{Fcws, FcwsState, Ldws, LdwsState, Lkas, RiskyDetection};
use std::time::Instant;
use tracing::{debug, info, warn};
use video_frame::VideoFrame;

const PULSE_WARNING: &str = "warning_pulse";
const PULSE_ARROW: &str = "arrow_pulse";

/// Owns every subsystem and runs the per-frame decision loop
pub struct FrameProcessor {
    config: PipelineConfig,

    detector: Box<dyn ObjectDetector>,
    lanes: HybridLaneDetector,
    estimator: DistanceEstimator,

    fcws: Fcws,
    ldws: Ldws,
    lkas: Lkas,

    renderer: OverlayRenderer,
    animations: AnimationEngine,
    bev: BevTransformer,

    governor: Governor,

    last_good: Option<RgbImage>,
    last_frame_at: Option<Instant>,
    lane_model: LaneModel,
    frames_processed: u64,
    frame_errors: u64,
    last_error: Option<String>,
}

impl FrameProcessor {
    /// Assemble a pipeline
    ///
    /// The object detector is required; the neural lane detector and the
    /// camera calibration are optional and their absence selects the
    /// deterministic lane path and the normalized distance proxy.
    pub fn new(
        config: PipelineConfig,
        detector: Box<dyn ObjectDetector>,
        neural_lanes: Option<Box<dyn NeuralLaneDetector>>,
        calibration: Option<Calibration>,
    ) -> Self {
        let lanes = HybridLaneDetector::new(
            neural_lanes,
            config.lane.confidence_threshold,
            config.lane.max_consecutive_failures,
        );
        let estimator = DistanceEstimator::new(calibration);
        let fcws = Fcws::new(
            config.fcws.warning_distance,
            config.fcws.critical_distance,
            config.fcws.forward_band,
        );
        let ldws = Ldws::new(config.ldws.departure_threshold);
        let lkas = Lkas::new(config.lkas.assist_threshold);

        let renderer = OverlayRenderer::new(OverlayConfig {
            lane_polygon_alpha: config.overlays.lane_polygon_alpha,
            ..OverlayConfig::default()
        });
        let mut animations = AnimationEngine::new();
        animations.register_reversing(PULSE_WARNING, 0.8, Easing::EaseInOut);
        animations.register_reversing(PULSE_ARROW, 0.5, Easing::EaseInOut);

        let bev = BevTransformer::new(config.overlays.bev_width, config.overlays.bev_height);
        let governor = Governor::new(&config.performance);

        info!(
            bev = config.overlays.bev_enabled,
            budget_ms = config.performance.latency_budget_ms,
            "frame processor ready"
        );
        Self {
            config,
            detector,
            lanes,
            estimator,
            fcws,
            ldws,
            lkas,
            renderer,
            animations,
            bev,
            governor,
            last_good: None,
            last_frame_at: None,
            lane_model: LaneModel::Deterministic,
            frames_processed: 0,
            frame_errors: 0,
            last_error: None,
        }
    }

    /// Process one frame and return the annotated output
    ///
    /// Never fails from the caller's view: a detection-stage error is
    /// absorbed by returning the previous good frame (or the plain input
    /// before any frame has succeeded).
    pub fn process(&mut self, frame: &VideoFrame) -> RgbImage {
        let frame_start = Instant::now();
        let delta = self
            .last_frame_at
            .map_or(0.0, |t| t.elapsed().as_secs_f32());
        self.last_frame_at = Some(frame_start);

        let tier = self.governor.tier();
        if self.animations_on(tier) {
            self.animations.update(delta);
        }

        let detect_start = Instant::now();
        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(error) => {
                warn!(%error, "object detection failed, holding last frame");
                self.frame_errors += 1;
                self.last_error = Some(error.to_string());
                self.governor.record_error();
                return self
                    .last_good
                    .clone()
                    .unwrap_or_else(|| frame.to_rgb_image());
            }
        };
        let detection_ms = ms_since(detect_start);

        let lane_start = Instant::now();
        let lane_result = if tier.neural_allowed() {
            self.lanes.detect(frame)
        } else {
            self.lanes.detect_deterministic(frame)
        };
        let lane_ms = ms_since(lane_start);
        self.lane_model = lane_result.model_used;

        let offset = metrics::vehicle_offset(&lane_result, frame.width);
        let (fcws_state, risky) =
            self.fcws
                .check(&detections, &self.estimator, frame.width, frame.height);
        let ldws_state = self.ldws.check(offset);
        self.lkas.update(offset, frame.width);

        let overlay_start = Instant::now();
        let mut image = frame.to_rgb_image();
        self.render(
            &mut image,
            tier,
            &lane_result,
            &detections,
            &risky,
            fcws_state,
            ldws_state,
            frame.width,
            frame.height,
        );
        let overlay_ms = ms_since(overlay_start);

        self.governor.observe(StageTimings {
            detection_ms,
            lane_ms,
            overlay_ms,
            total_ms: ms_since(frame_start),
        });
        self.governor.record_success();
        self.frames_processed += 1;
        self.last_good = Some(image.clone());
        image
    }

    /// Fixed layer order: lane geometry, detections, distance markers,
    /// warning banner, departure arrow, steering dial, BEV inset, status
    /// panel. Warnings and the status panel survive every tier.
    #[allow(clippy::too_many_arguments)]
    fn render(
        &mut self,
        image: &mut RgbImage,
        tier: PerfTier,
        lane_result: &LaneDetectionResult,
        detections: &[Detection],
        risky: &[RiskyDetection],
        fcws_state: FcwsState,
        ldws_state: LdwsState,
        frame_width: u32,
        frame_height: u32,
    ) {
        let warn_pulse = self.pulse(tier, PULSE_WARNING);
        let arrow_pulse = self.pulse(tier, PULSE_ARROW);

        if tier.decorations_enabled() {
            match (&lane_result.left_lane, &lane_result.right_lane) {
                (Some(left), Some(right)) => {
                    self.renderer.draw_lane_polygon(image, left, right);
                }
                (Some(points), None) | (None, Some(points)) => {
                    self.renderer.draw_lane_line(image, points);
                }
                (None, None) => {}
            }
            self.renderer.draw_detections(image, detections);
            self.renderer.draw_distance_markers(image, risky);
        }

        match fcws_state {
            FcwsState::Safe => {}
            FcwsState::Warning => {
                self.renderer
                    .draw_warning_banner(image, WarningSeverity::Warning, 0.0);
            }
            FcwsState::Critical => {
                self.renderer
                    .draw_warning_banner(image, WarningSeverity::Critical, warn_pulse);
            }
        }
        match ldws_state {
            LdwsState::Safe => {}
            LdwsState::LeftWarning => {
                self.renderer
                    .draw_directional_arrow(image, ArrowDirection::Left, arrow_pulse);
            }
            LdwsState::RightWarning => {
                self.renderer
                    .draw_directional_arrow(image, ArrowDirection::Right, arrow_pulse);
            }
        }

        if tier.decorations_enabled() {
            self.renderer.draw_steering_indicator(
                image,
                self.lkas.steering_angle(),
                self.lkas.assist_active(),
            );
        }

        if tier.bev_enabled() && self.config.overlays.bev_enabled {
            self.render_bev(image, lane_result, frame_width, frame_height);
        }

        self.renderer.draw_status_panel(
            image,
            &PanelState {
                fcws: fcws_state,
                ldws: ldws_state,
                lkas_active: self.lkas.assist_active(),
                dl_enabled: self.lanes.dl_enabled(),
                safe_mode: tier == PerfTier::SafeMode,
            },
        );
    }

    /// Warp the annotated frame into the BEV inset; any failure is
    /// logged and the inset skipped for this frame
    fn render_bev(
        &mut self,
        image: &mut RgbImage,
        lane_result: &LaneDetectionResult,
        frame_width: u32,
        frame_height: u32,
    ) {
        let mut bev_img = match self.bev.transform_frame(&*image) {
            Ok(bev_img) => bev_img,
            Err(error) => {
                debug!(%error, "BEV transform skipped");
                return;
            }
        };

        let left = lane_result
            .left_lane
            .as_deref()
            .and_then(|pts| self.bev.transform_lanes(pts, frame_width, frame_height).ok());
        let right = lane_result
            .right_lane
            .as_deref()
            .and_then(|pts| self.bev.transform_lanes(pts, frame_width, frame_height).ok());

        self.bev
            .draw_bev_overlay(&mut bev_img, left.as_deref(), right.as_deref());
        self.bev.composite_pip(
            image,
            &bev_img,
            PipCorner::TopRight,
            self.config.overlays.bev_alpha,
        );
    }

    fn animations_on(&self, tier: PerfTier) -> bool {
        tier.animations_enabled() && self.config.overlays.animations_enabled
    }

    /// Pulse value for a named animation, or a steady 1.0 with
    /// animations shed
    fn pulse(&self, tier: PerfTier, name: &str) -> f32 {
        if self.animations_on(tier) {
            self.animations.value(name)
        } else {
            1.0
        }
    }

    /// Apply a validated runtime configuration patch
    ///
    /// All-or-nothing: on any invalid value the previous configuration
    /// stays in force and the error is returned.
    pub fn update_config(&mut self, patch: &ConfigPatch) -> Result<(), ConfigError> {
        let next = patch.apply(&self.config)?;

        self.fcws
            .set_thresholds(next.fcws.warning_distance, next.fcws.critical_distance);
        self.ldws.set_threshold(next.ldws.departure_threshold);
        self.lkas.set_threshold(next.lkas.assist_threshold);
        self.lanes
            .set_confidence_threshold(next.lane.confidence_threshold);

        let mut overlay_config = self.renderer.config().clone();
        overlay_config.lane_polygon_alpha = next.overlays.lane_polygon_alpha;
        self.renderer.set_config(overlay_config);

        info!("configuration updated");
        self.config = next;
        Ok(())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current warning and subsystem state
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            fcws: self.fcws.state(),
            ldws: self.ldws.state(),
            lkas: self.lkas.status(),
            lane_model: self.lane_model,
            dl_enabled: self.lanes.dl_enabled(),
            tier: self.governor.tier(),
            calibration: self.estimator.calibration_info(),
        }
    }

    /// Cumulative counters and trailing latency averages
    pub fn metrics(&self) -> PipelineMetrics {
        let avg_total = self.governor.averages().total_ms;
        let fps = if avg_total > 0.0 { 1000.0 / avg_total } else { 0.0 };
        PipelineMetrics {
            frames_processed: self.frames_processed,
            frame_errors: self.frame_errors,
            last_error: self.last_error.clone(),
            fps,
            tier: self.governor.tier(),
            demotions: self.governor.demotions(),
            promotions: self.governor.promotions(),
            lane_detector: self.lanes.stats(),
            latency: self.governor.averages(),
        }
    }
}

fn ms_since(start: Instant) -> f32 {
    start.elapsed().as_secs_f32() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::{BoundingBox, DetectionError, ObjectClass};
    use std::collections::VecDeque;

    /// Scripted detector: pops one canned response per frame, then
    /// returns empty results forever
    struct ScriptedDetector {
        script: VecDeque<Result<Vec<Detection>, DetectionError>>,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Result<Vec<Detection>, DetectionError>>) -> Self {
            Self {
                script: script.into(),
            }
        }

        fn always_empty() -> Self {
            Self::new(vec![])
        }
    }

    impl ObjectDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError> {
            self.script.pop_front().unwrap_or(Ok(vec![]))
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::blank(640, 480)
    }

    fn processor(detector: ScriptedDetector) -> FrameProcessor {
        FrameProcessor::new(
            PipelineConfig::default(),
            Box::new(detector),
            None,
            Some(Calibration::from_focal_length(1000.0, 320.0, 240.0)),
        )
    }

    fn inference_error() -> Result<Vec<Detection>, DetectionError> {
        Err(DetectionError::Inference("scripted".into()))
    }

    /// Centered car whose bbox height puts it at the given distance
    fn car_at(meters: f32) -> Detection {
        let height = 1500.0 / meters;
        Detection::new(
            ObjectClass::Car,
            BoundingBox::new(280.0, 400.0 - height, 360.0, 400.0),
            0.9,
        )
    }

    #[test]
    fn test_output_matches_input_dimensions() {
        let mut processor = processor(ScriptedDetector::always_empty());
        let out = processor.process(&frame());
        assert_eq!((out.width(), out.height()), (640, 480));
        assert_eq!(processor.metrics().frames_processed, 1);
    }

    #[test]
    fn test_empty_road_reports_all_safe() {
        let mut processor = processor(ScriptedDetector::always_empty());
        processor.process(&frame());

        let status = processor.status();
        assert_eq!(status.fcws, FcwsState::Safe);
        assert_eq!(status.ldws, LdwsState::Safe);
        assert!(!status.lkas.active);
        assert_eq!(status.tier, PerfTier::Full);
    }

    #[test]
    fn test_close_vehicle_goes_critical() {
        let mut processor = processor(ScriptedDetector::new(vec![Ok(vec![car_at(5.0)])]));
        processor.process(&frame());
        assert_eq!(processor.status().fcws, FcwsState::Critical);

        // Vehicle gone next frame: back to safe
        processor.process(&frame());
        assert_eq!(processor.status().fcws, FcwsState::Safe);
    }

    #[test]
    fn test_detection_error_holds_last_good_frame() {
        let mut processor = processor(ScriptedDetector::new(vec![
            Ok(vec![car_at(40.0)]),
            inference_error(),
        ]));

        let good = processor.process(&frame());
        let held = processor.process(&frame());
        assert_eq!(good, held);
        assert_eq!(processor.metrics().frame_errors, 1);
        assert!(processor.metrics().last_error.is_some());
    }

    #[test]
    fn test_error_before_any_success_returns_plain_frame() {
        let mut processor = processor(ScriptedDetector::new(vec![inference_error()]));
        let input = frame();
        let out = processor.process(&input);
        assert_eq!(out, input.to_rgb_image());
    }

    #[test]
    fn test_safe_mode_after_consecutive_errors() {
        let script = (0..5).map(|_| inference_error()).collect();
        let mut processor = processor(ScriptedDetector::new(script));

        for _ in 0..4 {
            processor.process(&frame());
            assert_ne!(processor.status().tier, PerfTier::SafeMode);
        }
        processor.process(&frame());
        assert_eq!(processor.status().tier, PerfTier::SafeMode);

        // First clean frame steps out into the minimal tier
        processor.process(&frame());
        assert_eq!(processor.status().tier, PerfTier::Minimal);
    }

    #[test]
    fn test_success_between_errors_resets_the_streak() {
        let mut script: Vec<_> = (0..4).map(|_| inference_error()).collect();
        script.push(Ok(vec![]));
        script.extend((0..4).map(|_| inference_error()));
        let mut processor = processor(ScriptedDetector::new(script));

        for _ in 0..9 {
            processor.process(&frame());
        }
        assert_ne!(processor.status().tier, PerfTier::SafeMode);
        assert_eq!(processor.metrics().frame_errors, 8);
    }

    #[test]
    fn test_config_patch_applies_to_running_systems() {
        let mut processor = processor(ScriptedDetector::new(vec![Ok(vec![car_at(20.0)])]));
        let patch = ConfigPatch {
            fcws_critical_distance: Some(25.0),
            ..ConfigPatch::default()
        };
        processor.update_config(&patch).unwrap();

        // 20m is critical under the raised threshold
        processor.process(&frame());
        assert_eq!(processor.status().fcws, FcwsState::Critical);
    }

    #[test]
    fn test_rejected_patch_keeps_previous_config() {
        let mut processor = processor(ScriptedDetector::always_empty());
        let patch = ConfigPatch {
            fcws_warning_distance: Some(10.0),
            ..ConfigPatch::default()
        };

        assert!(processor.update_config(&patch).is_err());
        assert_eq!(processor.config().fcws.warning_distance, 30.0);
        assert_eq!(processor.config().fcws.critical_distance, 15.0);
    }

    #[test]
    fn test_uncalibrated_pipeline_still_runs() {
        let mut processor = FrameProcessor::new(
            PipelineConfig::default(),
            Box::new(ScriptedDetector::new(vec![Ok(vec![car_at(10.0)])])),
            None,
            None,
        );
        processor.process(&frame());

        let status = processor.status();
        assert!(!status.calibration.calibrated);
        assert!(!status.dl_enabled);
    }
}
