//! Lane geometry metrics consumed by the warning state machines
//!
//! All three safety systems read the same vehicle offset, computed once per
//! frame from the detection result.

use crate::result::LaneDetectionResult;

/// X position of a lane line at its nearest (bottom-most) point
pub fn lane_anchor_x(points: &[(f32, f32)]) -> Option<f32> {
    points
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|p| p.0)
}

/// X coordinate of the lane center at the bottom of the frame; requires
/// both lane sides
pub fn lane_center(result: &LaneDetectionResult) -> Option<f32> {
    let left = lane_anchor_x(result.left_lane.as_deref()?)?;
    let right = lane_anchor_x(result.right_lane.as_deref()?)?;
    Some((left + right) / 2.0)
}

/// Signed offset of the vehicle from the lane center, in pixels
///
/// Positive means the vehicle sits right of the lane center (assuming a
/// centered camera); `None` means "no lane" and downstream systems must
/// treat the offset as undefined.
pub fn vehicle_offset(result: &LaneDetectionResult, frame_width: u32) -> Option<f32> {
    let center = lane_center(result)?;
    Some(frame_width as f32 / 2.0 - center)
}
