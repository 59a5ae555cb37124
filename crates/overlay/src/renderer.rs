//! Frame annotation
//!
//! All draw operations mutate an `RgbImage` in place and are pure
//! functions of their inputs; animation pulses are sampled by the caller
//! and passed in as plain values.

use crate::blend::{blend_pixel, blend_rect};
use detection::{Detection, ObjectClass};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use safety::{FcwsState, LdwsState, RiskyDetection};
use serde::{Deserialize, Serialize};

const COLOR_LANE: Rgb<u8> = Rgb([0, 200, 80]);
const COLOR_LANE_LINE: Rgb<u8> = Rgb([240, 240, 240]);
const COLOR_INFO: Rgb<u8> = Rgb([70, 160, 255]);
const COLOR_WARNING: Rgb<u8> = Rgb([255, 170, 0]);
const COLOR_CRITICAL: Rgb<u8> = Rgb([225, 30, 30]);
const COLOR_OK: Rgb<u8> = Rgb([40, 200, 90]);
const COLOR_INACTIVE: Rgb<u8> = Rgb([90, 90, 90]);
const COLOR_PANEL_BG: Rgb<u8> = Rgb([15, 15, 20]);

/// Alpha floor at the far edge of the lane polygon gradient
const MIN_POLYGON_ALPHA: f32 = 0.1;

const BANNER_HEIGHT: u32 = 48;

/// Severity of the warning banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningSeverity {
    Info,
    Warning,
    Critical,
}

impl WarningSeverity {
    fn color(self) -> Rgb<u8> {
        match self {
            WarningSeverity::Info => COLOR_INFO,
            WarningSeverity::Warning => COLOR_WARNING,
            WarningSeverity::Critical => COLOR_CRITICAL,
        }
    }
}

/// Direction of a lane-departure arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Left,
    Right,
}

/// Renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Peak alpha of the lane polygon fill, at the near edge
    pub lane_polygon_alpha: f32,

    pub show_lane_polygon: bool,

    pub show_distance_markers: bool,

    pub show_detections: bool,

    pub show_warnings: bool,

    pub show_status_panel: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            lane_polygon_alpha: 0.35,
            show_lane_polygon: true,
            show_distance_markers: true,
            show_detections: true,
            show_warnings: true,
            show_status_panel: true,
        }
    }
}

/// Indicator-lamp inputs for the status panel
#[derive(Debug, Clone, Copy)]
pub struct PanelState {
    pub fcws: FcwsState,
    pub ldws: LdwsState,
    pub lkas_active: bool,
    pub dl_enabled: bool,
    pub safe_mode: bool,
}

/// Draws annotation layers onto a frame
///
/// Callers invoke the layer operations in priority order: lane polygon,
/// distance markers, detections, warnings, arrows, steering indicator,
/// status panel. The renderer itself keeps no cross-frame state.
pub struct OverlayRenderer {
    config: OverlayConfig,
}

impl OverlayRenderer {
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OverlayConfig) {
        self.config = config;
    }

    /// Fill the drivable area between the two lane polylines
    ///
    /// Alpha fades linearly from the configured peak at the near (bottom)
    /// edge down to a floor at the far edge, so distant road shows
    /// through. Polylines are ordered near to far; fewer than two points
    /// on either side draws nothing.
    pub fn draw_lane_polygon(
        &self,
        image: &mut RgbImage,
        left: &[(f32, f32)],
        right: &[(f32, f32)],
    ) {
        if !self.config.show_lane_polygon || left.len() < 2 || right.len() < 2 {
            return;
        }

        let y_top = polyline_min_y(left).max(polyline_min_y(right));
        let y_bottom = polyline_max_y(left).min(polyline_max_y(right));
        if y_bottom <= y_top {
            return;
        }

        let row_start = y_top.max(0.0) as u32;
        let row_end = (y_bottom.min(image.height() as f32 - 1.0)) as u32;

        for y in row_start..=row_end {
            let yf = y as f32;
            let (Some(xl), Some(xr)) = (polyline_x_at(left, yf), polyline_x_at(right, yf)) else {
                continue;
            };
            let (x_min, x_max) = if xl <= xr { (xl, xr) } else { (xr, xl) };

            let depth = (y_bottom - yf) / (y_bottom - y_top);
            let alpha =
                (self.config.lane_polygon_alpha * (1.0 - depth)).max(MIN_POLYGON_ALPHA);

            let px_start = x_min.max(0.0) as u32;
            let px_end = (x_max.min(image.width() as f32 - 1.0)) as u32;
            for x in px_start..=px_end {
                let base = *image.get_pixel(x, y);
                image.put_pixel(x, y, blend_pixel(base, COLOR_LANE, alpha));
            }
        }

        self.draw_lane_line(image, left);
        self.draw_lane_line(image, right);
    }

    /// Draw one lane boundary as connected segments
    pub fn draw_lane_line(&self, image: &mut RgbImage, points: &[(f32, f32)]) {
        for pair in points.windows(2) {
            draw_line_segment_mut(image, pair[0], pair[1], COLOR_LANE_LINE);
        }
    }

    /// Highlight the closest in-path objects with their distance estimate
    ///
    /// At most three markers are drawn, closest first; each gets a box in
    /// rank color plus a confidence bar along the bottom edge.
    pub fn draw_distance_markers(&self, image: &mut RgbImage, risky: &[RiskyDetection]) {
        if !self.config.show_distance_markers {
            return;
        }
        const RANK_COLORS: [Rgb<u8>; 3] = [COLOR_CRITICAL, COLOR_WARNING, Rgb([250, 220, 60])];

        for (rank, item) in risky.iter().take(3).enumerate() {
            let bbox = &item.detection.bbox;
            let color = RANK_COLORS[rank];

            if let Some(rect) = bbox_rect(bbox.x1, bbox.y1, bbox.x2, bbox.y2) {
                draw_hollow_rect_mut(image, rect, color);
            }

            // Confidence bar hugging the bottom edge of the box
            let bar_width = (bbox.width() * item.estimate.confidence).max(1.0) as u32;
            blend_rect(
                image,
                bbox.x1 as i32,
                bbox.y2 as i32 + 2,
                bar_width,
                4,
                color,
                0.9,
            );

            // Ground-contact dot at the bbox bottom center
            let (cx, _) = bbox.center();
            draw_filled_circle_mut(image, (cx as i32, bbox.y2 as i32), 3, color);
        }
    }

    /// Outline every detection in its class color
    pub fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]) {
        if !self.config.show_detections {
            return;
        }
        for det in detections {
            if let Some(rect) = bbox_rect(det.bbox.x1, det.bbox.y1, det.bbox.x2, det.bbox.y2) {
                draw_hollow_rect_mut(image, rect, class_color(det.class));
            }
        }
    }

    /// Full-width banner across the top of the frame
    ///
    /// `pulse` in [0, 1] modulates the banner alpha for critical
    /// severity only; lower severities render at a steady alpha.
    pub fn draw_warning_banner(
        &self,
        image: &mut RgbImage,
        severity: WarningSeverity,
        pulse: f32,
    ) {
        if !self.config.show_warnings {
            return;
        }
        let alpha = match severity {
            WarningSeverity::Critical => 0.45 + 0.4 * pulse.clamp(0.0, 1.0),
            _ => 0.45,
        };
        blend_rect(
            image,
            0,
            0,
            image.width(),
            BANNER_HEIGHT,
            severity.color(),
            alpha,
        );
        // Hard edge under the translucent band
        let y = BANNER_HEIGHT as f32;
        draw_line_segment_mut(image, (0.0, y), (image.width() as f32, y), severity.color());
    }

    /// Chevron arrow pointing back toward the lane center
    ///
    /// `pulse` scales the arrow between 80% and 120% of its base size.
    pub fn draw_directional_arrow(
        &self,
        image: &mut RgbImage,
        direction: ArrowDirection,
        pulse: f32,
    ) {
        if !self.config.show_warnings {
            return;
        }
        let scale = 0.8 + 0.4 * pulse.clamp(0.0, 1.0);
        let size = (36.0 * scale) as i32;
        let cx = image.width() as i32 / 2;
        let cy = (image.height() as i32) / 3;

        // The arrow points away from the departure side
        let tip_dx = match direction {
            ArrowDirection::Left => size,
            ArrowDirection::Right => -size,
        };
        let points = [
            Point::new(cx + tip_dx, cy),
            Point::new(cx - tip_dx / 2, cy - size / 2),
            Point::new(cx - tip_dx / 2, cy + size / 2),
        ];
        if points[0] != points[2] {
            draw_polygon_mut(image, &points, COLOR_WARNING);
        }
    }

    /// Dial with a needle showing the advisory steering angle
    ///
    /// Zero degrees points straight up; positive angles lean right.
    pub fn draw_steering_indicator(
        &self,
        image: &mut RgbImage,
        steering_angle_deg: f32,
        active: bool,
    ) {
        let radius = 28i32;
        let cx = image.width() as i32 - radius - 16;
        let cy = image.height() as i32 - radius - 16;
        let color = if active { COLOR_INFO } else { COLOR_INACTIVE };

        draw_hollow_circle_mut(image, (cx, cy), radius, color);

        let angle_rad = steering_angle_deg.to_radians();
        let needle_len = radius as f32 - 4.0;
        let end = (
            cx as f32 + needle_len * angle_rad.sin(),
            cy as f32 - needle_len * angle_rad.cos(),
        );
        draw_line_segment_mut(image, (cx as f32, cy as f32), end, color);
        draw_filled_circle_mut(image, (cx, cy), 2, color);
    }

    /// Indicator-lamp panel in the bottom-left corner
    ///
    /// Lamps, left to right: FCWS, LDWS, LKAS, lane model, safe mode.
    pub fn draw_status_panel(&self, image: &mut RgbImage, panel: &PanelState) {
        if !self.config.show_status_panel {
            return;
        }
        const LAMP: u32 = 14;
        const GAP: i32 = 8;
        const LAMPS: i32 = 5;

        let panel_w = (LAMPS * (LAMP as i32 + GAP) + GAP) as u32;
        let panel_h = LAMP + 2 * GAP as u32;
        let x0 = 12;
        let y0 = image.height() as i32 - panel_h as i32 - 12;

        blend_rect(image, x0, y0, panel_w, panel_h, COLOR_PANEL_BG, 0.65);

        let lamps = [
            match panel.fcws {
                FcwsState::Safe => COLOR_OK,
                FcwsState::Warning => COLOR_WARNING,
                FcwsState::Critical => COLOR_CRITICAL,
            },
            match panel.ldws {
                LdwsState::Safe => COLOR_OK,
                LdwsState::LeftWarning | LdwsState::RightWarning => COLOR_WARNING,
            },
            if panel.lkas_active { COLOR_INFO } else { COLOR_INACTIVE },
            if panel.dl_enabled { COLOR_OK } else { COLOR_INACTIVE },
            if panel.safe_mode { COLOR_CRITICAL } else { COLOR_INACTIVE },
        ];

        for (i, color) in lamps.iter().enumerate() {
            let lx = x0 + GAP + i as i32 * (LAMP as i32 + GAP);
            let ly = y0 + GAP;
            if let Some(rect) = rect_at(lx, ly, LAMP, LAMP) {
                draw_filled_rect_mut(image, rect, *color);
            }
        }
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

fn class_color(class: ObjectClass) -> Rgb<u8> {
    match class {
        ObjectClass::Car => Rgb([80, 200, 255]),
        ObjectClass::Truck | ObjectClass::Bus => Rgb([255, 140, 60]),
        ObjectClass::Motorcycle | ObjectClass::Bicycle => Rgb([200, 120, 255]),
        ObjectClass::Person => Rgb([255, 80, 120]),
        ObjectClass::Unknown => COLOR_INACTIVE,
    }
}

fn rect_at(x: i32, y: i32, width: u32, height: u32) -> Option<Rect> {
    if width == 0 || height == 0 {
        None
    } else {
        Some(Rect::at(x, y).of_size(width, height))
    }
}

fn bbox_rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Rect> {
    let width = (x2 - x1).max(0.0) as u32;
    let height = (y2 - y1).max(0.0) as u32;
    rect_at(x1 as i32, y1 as i32, width, height)
}

fn polyline_min_y(points: &[(f32, f32)]) -> f32 {
    points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min)
}

fn polyline_max_y(points: &[(f32, f32)]) -> f32 {
    points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max)
}

/// Interpolated x of the polyline at the given scanline, if covered
fn polyline_x_at(points: &[(f32, f32)], y: f32) -> Option<f32> {
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let (lo, hi) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        if y < lo || y > hi {
            continue;
        }
        if (y1 - y0).abs() < 1e-6 {
            return Some((x0 + x1) / 2.0);
        }
        let t = (y - y0) / (y1 - y0);
        return Some(x0 + t * (x1 - x0));
    }
    None
}
