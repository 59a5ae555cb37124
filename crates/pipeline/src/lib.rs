//! Per-frame decision pipeline
//!
//! [`FrameProcessor`] owns every subsystem and runs them in a fixed
//! order each frame: object detection, lane detection, safety state
//! machines, overlay rendering. A performance governor watches stage
//! timings and sheds decorative work tier by tier; repeated stage
//! errors latch a safe mode that keeps only the deterministic core
//! running. One frame's failure never takes the pipeline down: the
//! caller always gets a frame back.

pub mod config;
pub mod governor;
pub mod processor;
pub mod status;

pub use config::{ConfigError, ConfigPatch, PipelineConfig};
pub use governor::{Governor, PerfTier, StageTimings};
pub use processor::FrameProcessor;
pub use status::{PipelineMetrics, StatusSnapshot};
