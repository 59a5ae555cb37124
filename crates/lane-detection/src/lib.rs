//! Hybrid lane detection
//!
//! Two detectors behind one front door:
//! - a neural lane detector (external collaborator, consumed as a black box
//!   through the [`NeuralLaneDetector`] trait)
//! - a deterministic edge/Hough detector ([`EdgeLaneDetector`]) that needs
//!   no model at all
//!
//! [`HybridLaneDetector`] selects between them per frame using a confidence
//! policy with a rolling failure count; too many consecutive neural
//! failures permanently disable the neural path for the session.

pub mod edge;
pub mod hybrid;
pub mod metrics;
pub mod result;

pub use edge::EdgeLaneDetector;
pub use hybrid::{DetectorStats, HybridLaneDetector};
pub use metrics::{lane_anchor_x, lane_center, vehicle_offset};
pub use result::{LaneDetectionResult, LaneModel};

use thiserror::Error;
use video_frame::VideoFrame;

/// Lane detection error types
#[derive(Error, Debug)]
pub enum LaneError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid frame format")]
    InvalidFrame,
}

/// Neural lane detector (pretrained model consumed as a black box)
///
/// May fail on a frame or return `success = false`; the hybrid detector
/// converts both into a fallback decision within the same frame.
pub trait NeuralLaneDetector: Send {
    /// Detect lane geometry in the frame
    fn detect(&mut self, frame: &VideoFrame) -> Result<LaneDetectionResult, LaneError>;
}
