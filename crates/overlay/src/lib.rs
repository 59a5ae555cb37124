//! Overlay rendering for annotated driver-facing frames
//!
//! Layers are drawn in a fixed priority order so safety-critical content
//! is never occluded by decoration:
//! lane polygon -> distance markers -> warnings -> directional arrows ->
//! BEV picture-in-picture (composited by the caller) -> status panel.
//!
//! The [`AnimationEngine`] owns all time-based progress values; draw
//! operations take pre-sampled pulse values so they stay pure functions
//! of their inputs.

pub mod animation;
pub mod blend;
pub mod easing;
pub mod renderer;

pub use animation::AnimationEngine;
pub use blend::{blend_pixel, blend_rect};
pub use easing::Easing;
pub use renderer::{ArrowDirection, OverlayConfig, OverlayRenderer, PanelState, WarningSeverity};
