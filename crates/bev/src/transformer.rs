//! Perspective transform with a cached projection matrix

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::point::Point;
use imageproc::rect::Rect;
use overlay::blend_rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const COLOR_ROAD: Rgb<u8> = Rgb([35, 35, 40]);
const COLOR_LANE: Rgb<u8> = Rgb([240, 240, 240]);
const COLOR_DRIVABLE: Rgb<u8> = Rgb([0, 160, 70]);
const COLOR_VEHICLE: Rgb<u8> = Rgb([70, 160, 255]);
const COLOR_GRID: Rgb<u8> = Rgb([60, 60, 70]);
const COLOR_BORDER: Rgb<u8> = Rgb([255, 255, 255]);

const PIP_MARGIN: i64 = 20;

/// BEV errors
#[derive(Error, Debug)]
pub enum BevError {
    #[error("control points are degenerate, no projection exists")]
    DegenerateControlPoints,

    #[error("frame dimensions unusable: {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },
}

/// Corner of the main frame the inset is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

struct CachedProjection {
    frame_width: u32,
    frame_height: u32,
    forward: Projection,
}

/// Road-plane to top-down transformer
///
/// The projection matrix depends only on the frame dimensions, so it is
/// computed once and reused until the dimensions change.
pub struct BevTransformer {
    output_width: u32,
    output_height: u32,
    cached: Option<CachedProjection>,
    recompute_count: u64,
}

impl BevTransformer {
    pub fn new(output_width: u32, output_height: u32) -> Self {
        Self {
            output_width,
            output_height,
            cached: None,
            recompute_count: 0,
        }
    }

    pub fn output_size(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }

    /// Times the projection matrix has been (re)computed
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    /// Road trapezoid in source-frame coordinates, near corners first
    fn source_trapezoid(width: u32, height: u32) -> [(f32, f32); 4] {
        let w = width as f32;
        let h = height as f32;
        [
            (0.2 * w, h),
            (0.8 * w, h),
            (0.55 * w, 0.6 * h),
            (0.45 * w, 0.6 * h),
        ]
    }

    /// Matching rectangle in BEV coordinates
    fn target_rect(&self) -> [(f32, f32); 4] {
        let w = self.output_width as f32;
        let h = self.output_height as f32;
        [
            (0.2 * w, h),
            (0.8 * w, h),
            (0.8 * w, 0.0),
            (0.2 * w, 0.0),
        ]
    }

    fn ensure_projection(
        &mut self,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<&CachedProjection, BevError> {
        if frame_width == 0 || frame_height == 0 {
            return Err(BevError::InvalidFrameSize {
                width: frame_width,
                height: frame_height,
            });
        }

        let stale = match &self.cached {
            Some(c) => c.frame_width != frame_width || c.frame_height != frame_height,
            None => true,
        };
        if stale {
            let forward = Projection::from_control_points(
                Self::source_trapezoid(frame_width, frame_height),
                self.target_rect(),
            )
            .ok_or(BevError::DegenerateControlPoints)?;

            self.recompute_count += 1;
            debug!(frame_width, frame_height, count = self.recompute_count, "BEV projection computed");
            self.cached = Some(CachedProjection {
                frame_width,
                frame_height,
                forward,
            });
        }

        // Just populated above when stale
        self.cached.as_ref().ok_or(BevError::DegenerateControlPoints)
    }

    /// Warp a frame into top-down view
    pub fn transform_frame(&mut self, frame: &RgbImage) -> Result<RgbImage, BevError> {
        let (w, h) = (self.output_width, self.output_height);
        let projection = &self.ensure_projection(frame.width(), frame.height())?.forward;

        let mut bev = RgbImage::from_pixel(w, h, COLOR_ROAD);
        warp_into(frame, projection, Interpolation::Bilinear, COLOR_ROAD, &mut bev);
        Ok(bev)
    }

    /// Re-project lane polyline points into BEV coordinates
    pub fn transform_lanes(
        &mut self,
        points: &[(f32, f32)],
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Vec<(f32, f32)>, BevError> {
        let projection = self.ensure_projection(frame_width, frame_height)?.forward;
        Ok(points.iter().map(|&p| projection * p).collect())
    }

    /// Draw lane lines, drivable area, the ego-vehicle marker, and a
    /// distance grid onto a BEV image
    ///
    /// The drivable-area fill needs both lane sides; with one side only
    /// the lane line is still drawn.
    pub fn draw_bev_overlay(
        &self,
        bev: &mut RgbImage,
        left: Option<&[(f32, f32)]>,
        right: Option<&[(f32, f32)]>,
    ) {
        self.draw_grid(bev);

        if let (Some(left), Some(right)) = (left, right) {
            self.fill_drivable_area(bev, left, right);
        }
        if let Some(points) = left {
            draw_polyline(bev, points, COLOR_LANE);
        }
        if let Some(points) = right {
            draw_polyline(bev, points, COLOR_LANE);
        }

        self.draw_vehicle_marker(bev);
    }

    fn draw_grid(&self, bev: &mut RgbImage) {
        let w = bev.width() as f32;
        let h = bev.height();
        // Horizontal rules every 1/8 of the strip
        for i in 1..8 {
            let y = (h as f32 * i as f32 / 8.0).floor();
            draw_line_segment_mut(bev, (0.0, y), (w, y), COLOR_GRID);
        }
    }

    fn fill_drivable_area(&self, bev: &mut RgbImage, left: &[(f32, f32)], right: &[(f32, f32)]) {
        if left.len() < 2 || right.len() < 2 {
            return;
        }
        let mut corners: Vec<Point<i32>> = Vec::with_capacity(left.len() + right.len());
        for &(x, y) in left {
            corners.push(Point::new(x as i32, y as i32));
        }
        for &(x, y) in right.iter().rev() {
            corners.push(Point::new(x as i32, y as i32));
        }
        corners.dedup();
        if corners.len() >= 3 && corners.first() != corners.last() {
            draw_polygon_mut(bev, &corners, COLOR_DRIVABLE);
        }
    }

    fn draw_vehicle_marker(&self, bev: &mut RgbImage) {
        let w = bev.width() as i32;
        let h = bev.height() as i32;
        let body_w = (w / 10).max(4) as u32;
        let body_h = (h / 12).max(6) as u32;
        let x = w / 2 - body_w as i32 / 2;
        let y = h - body_h as i32 - 4;

        draw_filled_rect_mut(bev, Rect::at(x, y).of_size(body_w, body_h), COLOR_VEHICLE);
        // Nose triangle on top of the body
        let nose = [
            Point::new(w / 2, y - body_h as i32 / 2),
            Point::new(x, y),
            Point::new(x + body_w as i32, y),
        ];
        draw_polygon_mut(bev, &nose, COLOR_VEHICLE);
    }

    /// Composite a BEV image into a corner of the main frame
    ///
    /// The inset is alpha-blended with a 1px border; it is clamped inside
    /// the frame and skipped entirely if the frame is smaller than the
    /// inset plus margins.
    pub fn composite_pip(
        &self,
        frame: &mut RgbImage,
        bev: &RgbImage,
        corner: PipCorner,
        alpha: f32,
    ) {
        let (fw, fh) = (frame.width() as i64, frame.height() as i64);
        let (bw, bh) = (bev.width() as i64, bev.height() as i64);
        if bw + 2 * PIP_MARGIN > fw || bh + 2 * PIP_MARGIN > fh {
            debug!("frame too small for BEV inset, skipping");
            return;
        }

        let (x0, y0) = match corner {
            PipCorner::TopLeft => (PIP_MARGIN, PIP_MARGIN),
            PipCorner::TopRight => (fw - bw - PIP_MARGIN, PIP_MARGIN),
            PipCorner::BottomLeft => (PIP_MARGIN, fh - bh - PIP_MARGIN),
            PipCorner::BottomRight => (fw - bw - PIP_MARGIN, fh - bh - PIP_MARGIN),
        };

        let alpha = alpha.clamp(0.0, 1.0);
        for y in 0..bh {
            for x in 0..bw {
                let fx = (x0 + x) as u32;
                let fy = (y0 + y) as u32;
                let base = *frame.get_pixel(fx, fy);
                let over = *bev.get_pixel(x as u32, y as u32);
                frame.put_pixel(fx, fy, overlay::blend_pixel(base, over, alpha));
            }
        }

        // Border, fully opaque so the inset reads as a separate panel
        blend_rect(frame, x0 as i32 - 1, y0 as i32 - 1, bw as u32 + 2, 1, COLOR_BORDER, 1.0);
        blend_rect(frame, x0 as i32 - 1, (y0 + bh) as i32, bw as u32 + 2, 1, COLOR_BORDER, 1.0);
        blend_rect(frame, x0 as i32 - 1, y0 as i32, 1, bh as u32, COLOR_BORDER, 1.0);
        blend_rect(frame, (x0 + bw) as i32, y0 as i32, 1, bh as u32, COLOR_BORDER, 1.0);
    }
}

fn draw_polyline(image: &mut RgbImage, points: &[(f32, f32)], color: Rgb<u8>) {
    for pair in points.windows(2) {
        draw_line_segment_mut(image, pair[0], pair[1], color);
    }
}
