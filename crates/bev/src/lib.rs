//! Bird's-eye-view rendering
//!
//! Warps the forward camera's road trapezoid into a top-down strip,
//! re-projects lane polylines into the same space, decorates the result,
//! and composites it as a picture-in-picture inset. Decorative by
//! design: a failed transform is skipped for the frame, never surfaced
//! as a pipeline error.

pub mod transformer;

pub use transformer::{BevError, BevTransformer, PipCorner};
