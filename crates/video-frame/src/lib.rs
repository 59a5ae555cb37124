//! Video frame types shared by the ADAS vision pipeline
//!
//! A [`VideoFrame`] is the unit of work for the whole pipeline: an RGB
//! pixel matrix plus capture metadata. Frames are immutable inputs; stages
//! that annotate a frame convert it to an [`image::RgbImage`] first and
//! draw on the copy.

pub mod frame;

pub use frame::VideoFrame;
