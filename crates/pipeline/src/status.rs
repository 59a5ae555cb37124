//! Status and metrics snapshots
//!
//! Plain serializable values handed to the host application for display
//! or logging; nothing here holds a reference into the pipeline.

use crate::governor::{PerfTier, StageAverages};
use detection::CalibrationInfo;
use lane_detection::{DetectorStats, LaneModel};
use safety::{FcwsState, LdwsState, LkasStatus};
use serde::Serialize;

/// Current warning and subsystem state, one per frame
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub fcws: FcwsState,

    pub ldws: LdwsState,

    pub lkas: LkasStatus,

    /// Model that produced the current lane result
    pub lane_model: LaneModel,

    /// Whether the neural lane path is still available this session
    pub dl_enabled: bool,

    pub tier: PerfTier,

    pub calibration: CalibrationInfo,
}

/// Cumulative counters and trailing latency averages
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetrics {
    pub frames_processed: u64,

    pub frame_errors: u64,

    /// Description of the most recent frame error, if any
    pub last_error: Option<String>,

    /// Throughput implied by the trailing average frame time
    pub fps: f32,

    pub tier: PerfTier,

    pub demotions: u64,

    pub promotions: u64,

    pub lane_detector: DetectorStats,

    pub latency: StageAverages,
}
