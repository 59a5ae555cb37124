//! Deterministic lane detection via edge extraction and Hough voting
//!
//! No model, no weights: grayscale -> blur -> Canny -> road-region mask ->
//! Hough line transform -> slope-based left/right separation. This is the
//! fallback path and must keep working when everything neural is gone.

use crate::result::{LaneDetectionResult, LaneModel};
use crate::LaneError;
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::debug;
use video_frame::VideoFrame;

/// Lane lines are drawn between these two heights (fractions of frame
/// height); the road region mask uses the same far edge.
const FAR_EDGE_RATIO: f32 = 0.6;

/// Lines flatter than this slope are lane-irrelevant (shadows, horizon)
const MIN_SLOPE: f32 = 0.3;

/// Edge/Hough lane detector
pub struct EdgeLaneDetector {
    canny_low: f32,
    canny_high: f32,
    blur_sigma: f32,
    vote_threshold: u32,
}

impl Default for EdgeLaneDetector {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            blur_sigma: 1.4,
            vote_threshold: 30,
        }
    }
}

impl EdgeLaneDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector with custom edge and voting parameters
    pub fn with_options(canny_low: f32, canny_high: f32, blur_sigma: f32, vote_threshold: u32) -> Self {
        Self {
            canny_low,
            canny_high,
            blur_sigma,
            vote_threshold,
        }
    }

    /// Detect lane lines in the frame
    pub fn detect(&self, frame: &VideoFrame) -> Result<LaneDetectionResult, LaneError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(LaneError::InvalidFrame);
        }

        let gray = frame.to_luma_image();
        let blurred = gaussian_blur_f32(&gray, self.blur_sigma);
        let mut edges = canny(&blurred, self.canny_low, self.canny_high);
        mask_road_region(&mut edges);

        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: self.vote_threshold,
                suppression_radius: 8,
            },
        );

        let (width, height) = (frame.width as f32, frame.height as f32);
        let near_y = height;
        let far_y = height * FAR_EDGE_RATIO;

        let mut left_x: Vec<(f32, f32)> = Vec::new();
        let mut right_x: Vec<(f32, f32)> = Vec::new();

        for line in &lines {
            let Some((x_near, x_far)) = line_anchors(line, near_y, far_y) else {
                continue;
            };
            if x_near < -width || x_near > 2.0 * width {
                continue;
            }
            let dx = x_far - x_near;
            if dx.abs() < f32::EPSILON {
                continue;
            }
            let slope = (far_y - near_y) / dx;
            if slope.abs() < MIN_SLOPE {
                continue;
            }
            // Image y grows downward: left lanes slope negative
            if slope < 0.0 {
                left_x.push((x_near, x_far));
            } else {
                right_x.push((x_near, x_far));
            }
        }

        let left_lane = average_lane(&left_x, near_y, far_y);
        let right_lane = average_lane(&right_x, near_y, far_y);

        if left_lane.is_none() && right_lane.is_none() {
            debug!("no lane candidates after slope filtering");
            return Ok(LaneDetectionResult::none(LaneModel::Deterministic));
        }

        let supporting = (left_x.len() + right_x.len()) as f32;
        let confidence = (supporting / 8.0).min(1.0);
        Ok(LaneDetectionResult::detected(
            left_lane,
            right_lane,
            confidence,
            LaneModel::Deterministic,
        ))
    }
}

/// Zero out edge pixels outside the expected road trapezoid
fn mask_road_region(edges: &mut GrayImage) {
    let (width, height) = (edges.width() as f32, edges.height() as f32);
    let far_y = height * FAR_EDGE_RATIO;

    for y in 0..edges.height() {
        let yf = y as f32;
        if yf < far_y {
            for x in 0..edges.width() {
                edges.put_pixel(x, y, image::Luma([0]));
            }
            continue;
        }
        // Linear widening from (0.45w..0.55w) at the far edge
        // to (0.1w..0.9w) at the bottom
        let t = (yf - far_y) / (height - far_y).max(1.0);
        let left = width * (0.45 - 0.35 * t);
        let right = width * (0.55 + 0.35 * t);
        for x in 0..edges.width() {
            let xf = x as f32;
            if xf < left || xf > right {
                edges.put_pixel(x, y, image::Luma([0]));
            }
        }
    }
}

/// Intersect a polar Hough line with the near and far anchor rows
fn line_anchors(line: &PolarLine, near_y: f32, far_y: f32) -> Option<(f32, f32)> {
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    if cos.abs() < 1e-3 {
        // Horizontal line, never a lane
        return None;
    }
    let x_near = (line.r - near_y * sin) / cos;
    let x_far = (line.r - far_y * sin) / cos;
    Some((x_near, x_far))
}

/// Average candidate anchors into a single two-point lane line
fn average_lane(candidates: &[(f32, f32)], near_y: f32, far_y: f32) -> Option<Vec<(f32, f32)>> {
    if candidates.is_empty() {
        return None;
    }
    let n = candidates.len() as f32;
    let x_near = candidates.iter().map(|c| c.0).sum::<f32>() / n;
    let x_far = candidates.iter().map(|c| c.1).sum::<f32>() / n;
    Some(vec![(x_near, near_y), (x_far, far_y)])
}
