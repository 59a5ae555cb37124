//! Performance governor
//!
//! Keeps the pipeline inside its per-frame latency budget by shedding
//! decorative work tier by tier, and latches a safe mode when stages
//! fail repeatedly. The governor only consumes timings and error events
//! fed to it; it never reads the clock itself, so its decisions are
//! fully reproducible.

use crate::config::PerformanceConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{info, warn};

/// Degradation tier, ordered most to least capable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerfTier {
    Full,
    Degraded,
    Minimal,
    SafeMode,
}

impl PerfTier {
    pub fn bev_enabled(self) -> bool {
        matches!(self, PerfTier::Full)
    }

    pub fn animations_enabled(self) -> bool {
        matches!(self, PerfTier::Full | PerfTier::Degraded)
    }

    /// Non-warning annotation layers: detections, markers, lane polygon,
    /// steering dial
    pub fn decorations_enabled(self) -> bool {
        matches!(self, PerfTier::Full | PerfTier::Degraded)
    }

    pub fn neural_allowed(self) -> bool {
        !matches!(self, PerfTier::SafeMode)
    }

    /// Next tier down; load shedding stops at `Minimal` (safe mode is
    /// reserved for errors, not latency)
    fn demoted(self) -> PerfTier {
        match self {
            PerfTier::Full => PerfTier::Degraded,
            PerfTier::Degraded | PerfTier::Minimal => PerfTier::Minimal,
            PerfTier::SafeMode => PerfTier::SafeMode,
        }
    }

    fn promoted(self) -> PerfTier {
        match self {
            PerfTier::Full | PerfTier::Degraded => PerfTier::Full,
            PerfTier::Minimal => PerfTier::Degraded,
            PerfTier::SafeMode => PerfTier::SafeMode,
        }
    }
}

/// Per-stage wall time for one frame, in milliseconds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub detection_ms: f32,
    pub lane_ms: f32,
    pub overlay_ms: f32,
    pub total_ms: f32,
}

/// Average stage timings over the trailing window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StageAverages {
    pub detection_ms: f32,
    pub lane_ms: f32,
    pub overlay_ms: f32,
    pub total_ms: f32,
}

/// Latency- and error-driven tier controller
///
/// Demotion: when the trailing-window average exceeds the budget, drop
/// one tier and clear the window, so a sustained overrun demotes once
/// per full window rather than once per frame. Promotion: a full run of
/// consecutive under-budget frames raises one tier. Safe mode: latched
/// by consecutive errors, cleared only by a successful frame, and exits
/// into `Minimal` so recovery to full capability is gradual.
pub struct Governor {
    budget_ms: f32,
    window: usize,
    recovery_frames: u32,
    max_consecutive_errors: u32,

    tier: PerfTier,
    samples: VecDeque<StageTimings>,
    frames_under_budget: u32,
    consecutive_errors: u32,
    demotions: u64,
    promotions: u64,
}

impl Governor {
    pub fn new(config: &PerformanceConfig) -> Self {
        Self {
            budget_ms: config.latency_budget_ms,
            window: config.window.max(1),
            recovery_frames: config.recovery_frames.max(1),
            max_consecutive_errors: config.max_consecutive_errors.max(1),
            tier: PerfTier::Full,
            samples: VecDeque::new(),
            frames_under_budget: 0,
            consecutive_errors: 0,
            demotions: 0,
            promotions: 0,
        }
    }

    pub fn tier(&self) -> PerfTier {
        self.tier
    }

    pub fn demotions(&self) -> u64 {
        self.demotions
    }

    pub fn promotions(&self) -> u64 {
        self.promotions
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Feed one frame's timings
    pub fn observe(&mut self, timings: StageTimings) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(timings);

        if self.tier == PerfTier::SafeMode {
            return;
        }

        if self.samples.len() == self.window {
            let avg = self.averages().total_ms;
            if avg > self.budget_ms {
                let next = self.tier.demoted();
                if next != self.tier {
                    warn!(
                        avg_ms = avg,
                        budget_ms = self.budget_ms,
                        from = ?self.tier,
                        to = ?next,
                        "latency over budget, shedding load"
                    );
                    self.tier = next;
                    self.demotions += 1;
                }
                // Start a fresh window either way so the same overrun is
                // not charged twice
                self.samples.clear();
                self.frames_under_budget = 0;
                return;
            }
        }

        if timings.total_ms < self.budget_ms {
            self.frames_under_budget += 1;
            if self.frames_under_budget >= self.recovery_frames {
                let next = self.tier.promoted();
                if next != self.tier {
                    info!(from = ?self.tier, to = ?next, "latency recovered, restoring capability");
                    self.tier = next;
                    self.promotions += 1;
                }
                self.frames_under_budget = 0;
            }
        } else {
            self.frames_under_budget = 0;
        }
    }

    /// Record a failed frame; enough in a row latch safe mode
    pub fn record_error(&mut self) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        if self.consecutive_errors >= self.max_consecutive_errors && self.tier != PerfTier::SafeMode
        {
            warn!(
                errors = self.consecutive_errors,
                "consecutive stage failures, entering safe mode"
            );
            self.tier = PerfTier::SafeMode;
            self.samples.clear();
            self.frames_under_budget = 0;
        }
    }

    /// Record a successful frame; clears the error streak and steps out
    /// of safe mode
    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
        if self.tier == PerfTier::SafeMode {
            info!("stage errors cleared, leaving safe mode");
            self.tier = PerfTier::Minimal;
        }
    }

    /// Trailing-window stage averages
    pub fn averages(&self) -> StageAverages {
        if self.samples.is_empty() {
            return StageAverages::default();
        }
        let n = self.samples.len() as f32;
        let mut avg = StageAverages::default();
        for t in &self.samples {
            avg.detection_ms += t.detection_ms;
            avg.lane_ms += t.lane_ms;
            avg.overlay_ms += t.overlay_ms;
            avg.total_ms += t.total_ms;
        }
        avg.detection_ms /= n;
        avg.lane_ms /= n;
        avg.overlay_ms /= n;
        avg.total_ms /= n;
        avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn governor() -> Governor {
        Governor::new(&PerformanceConfig::default())
    }

    fn frame(total_ms: f32) -> StageTimings {
        StageTimings {
            detection_ms: total_ms * 0.5,
            lane_ms: total_ms * 0.3,
            overlay_ms: total_ms * 0.2,
            total_ms,
        }
    }

    #[test]
    fn test_sustained_overrun_demotes_once_per_window() {
        let mut gov = governor();
        for _ in 0..10 {
            gov.observe(frame(80.0));
        }
        assert_eq!(gov.tier(), PerfTier::Degraded);
        assert_eq!(gov.demotions(), 1);

        // The next demotion needs a whole fresh window
        for _ in 0..9 {
            gov.observe(frame(80.0));
        }
        assert_eq!(gov.tier(), PerfTier::Degraded);
        gov.observe(frame(80.0));
        assert_eq!(gov.tier(), PerfTier::Minimal);
        assert_eq!(gov.demotions(), 2);
    }

    #[test]
    fn test_latency_demotion_floors_at_minimal() {
        let mut gov = governor();
        for _ in 0..100 {
            gov.observe(frame(200.0));
        }
        assert_eq!(gov.tier(), PerfTier::Minimal);
    }

    #[test]
    fn test_recovery_promotes_after_consecutive_good_frames() {
        let mut gov = governor();
        for _ in 0..10 {
            gov.observe(frame(80.0));
        }
        assert_eq!(gov.tier(), PerfTier::Degraded);

        for _ in 0..10 {
            gov.observe(frame(30.0));
        }
        assert_eq!(gov.tier(), PerfTier::Full);
    }

    #[test]
    fn test_one_slow_frame_resets_recovery_streak() {
        let mut gov = governor();
        for _ in 0..10 {
            gov.observe(frame(80.0));
        }
        assert_eq!(gov.tier(), PerfTier::Degraded);

        for _ in 0..9 {
            gov.observe(frame(30.0));
        }
        gov.observe(frame(90.0));
        for _ in 0..9 {
            gov.observe(frame(30.0));
        }
        assert_eq!(gov.tier(), PerfTier::Degraded);
    }

    #[test]
    fn test_safe_mode_latches_on_consecutive_errors() {
        let mut gov = governor();
        for _ in 0..4 {
            gov.record_error();
        }
        assert_eq!(gov.tier(), PerfTier::Full);
        gov.record_error();
        assert_eq!(gov.tier(), PerfTier::SafeMode);

        // Timings do not move the tier while latched
        for _ in 0..20 {
            gov.observe(frame(10.0));
        }
        assert_eq!(gov.tier(), PerfTier::SafeMode);
    }

    #[test]
    fn test_success_resets_error_streak() {
        let mut gov = governor();
        for _ in 0..4 {
            gov.record_error();
        }
        gov.record_success();
        for _ in 0..4 {
            gov.record_error();
        }
        assert_eq!(gov.tier(), PerfTier::Full);
    }

    #[test]
    fn test_safe_mode_exits_into_minimal() {
        let mut gov = governor();
        for _ in 0..5 {
            gov.record_error();
        }
        assert_eq!(gov.tier(), PerfTier::SafeMode);

        gov.record_success();
        assert_eq!(gov.tier(), PerfTier::Minimal);
        assert!(gov.tier().neural_allowed());
    }

    #[test]
    fn test_tier_capabilities() {
        assert!(PerfTier::Full.bev_enabled());
        assert!(!PerfTier::Degraded.bev_enabled());
        assert!(PerfTier::Degraded.animations_enabled());
        assert!(!PerfTier::Minimal.animations_enabled());
        assert!(!PerfTier::Minimal.decorations_enabled());
        assert!(PerfTier::Minimal.neural_allowed());
        assert!(!PerfTier::SafeMode.neural_allowed());
    }

    proptest! {
        // Safe mode is reserved for errors; no timing sequence reaches it
        #[test]
        fn prop_timings_alone_never_latch_safe_mode(
            totals in proptest::collection::vec(0.0f32..500.0, 0..200),
        ) {
            let mut gov = governor();
            for total in totals {
                gov.observe(frame(total));
            }
            prop_assert_ne!(gov.tier(), PerfTier::SafeMode);
        }
    }

    #[test]
    fn test_averages_track_stage_breakdown() {
        let mut gov = governor();
        gov.observe(frame(40.0));
        gov.observe(frame(60.0));

        let avg = gov.averages();
        assert!((avg.total_ms - 50.0).abs() < 1e-3);
        assert!((avg.detection_ms - 25.0).abs() < 1e-3);
    }
}
