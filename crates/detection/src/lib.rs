//! Object detection types and distance estimation
//!
//! The object detector itself is an external collaborator (a pretrained
//! model consumed as a black box); this crate defines the seam it plugs
//! into plus everything downstream of its output:
//! - Detection / bounding box / object class types
//! - Camera calibration data (consumed, never derived)
//! - Monocular distance estimation with confidence intervals

pub mod calibration;
pub mod distance;
pub mod object;

pub use calibration::Calibration;
pub use distance::{CalibrationInfo, DistanceEstimation, DistanceEstimator, DistanceUnit};
pub use object::{BoundingBox, Detection, ObjectClass};

use thiserror::Error;
use video_frame::VideoFrame;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid frame format")]
    InvalidFrame,
}

/// Per-frame object detector (vehicles, pedestrians, cyclists)
///
/// Implementations wrap a pretrained model; a failure on one frame must be
/// reported as an error, never as an empty detection list.
pub trait ObjectDetector: Send {
    /// Detect objects in the frame
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectionError>;
}
