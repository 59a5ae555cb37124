//! Pipeline configuration and validated runtime updates
//!
//! Updates arrive as a flat patch of dotted keys (the shape the host
//! application's settings store emits). A patch is validated against the
//! merged result before anything is applied; a rejected patch leaves the
//! running configuration untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.into(),
    }
}

/// Lane detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneConfig {
    /// Minimum neural confidence to accept a result
    pub confidence_threshold: f32,

    /// Consecutive neural failures before the model is retired
    pub max_consecutive_failures: u32,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            max_consecutive_failures: 5,
        }
    }
}

/// Forward collision warning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcwsConfig {
    pub warning_distance: f32,

    pub critical_distance: f32,

    /// Fraction of the frame width treated as the forward path
    pub forward_band: f32,
}

impl Default for FcwsConfig {
    fn default() -> Self {
        Self {
            warning_distance: 30.0,
            critical_distance: 15.0,
            forward_band: 0.6,
        }
    }
}

/// Lane departure warning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdwsConfig {
    /// Offset in pixels beyond which a departure is flagged
    pub departure_threshold: f32,
}

impl Default for LdwsConfig {
    fn default() -> Self {
        Self {
            departure_threshold: 30.0,
        }
    }
}

/// Lane keeping assist settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LkasConfig {
    /// Offset in pixels beyond which assist is shown as active
    pub assist_threshold: f32,
}

impl Default for LkasConfig {
    fn default() -> Self {
        Self {
            assist_threshold: 20.0,
        }
    }
}

/// Overlay and inset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlaysConfig {
    pub bev_enabled: bool,

    pub animations_enabled: bool,

    pub lane_polygon_alpha: f32,

    pub bev_width: u32,

    pub bev_height: u32,

    pub bev_alpha: f32,
}

impl Default for OverlaysConfig {
    fn default() -> Self {
        Self {
            bev_enabled: true,
            animations_enabled: true,
            lane_polygon_alpha: 0.35,
            bev_width: 300,
            bev_height: 400,
            bev_alpha: 0.8,
        }
    }
}

/// Performance governor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Per-frame latency budget (15 fps floor)
    pub latency_budget_ms: f32,

    /// Trailing frames averaged for demotion decisions
    pub window: usize,

    /// Consecutive under-budget frames required before promotion
    pub recovery_frames: u32,

    /// Consecutive stage errors before safe mode latches
    pub max_consecutive_errors: u32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            latency_budget_ms: 67.0,
            window: 10,
            recovery_frames: 10,
            max_consecutive_errors: 5,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub lane: LaneConfig,
    pub fcws: FcwsConfig,
    pub ldws: LdwsConfig,
    pub lkas: LkasConfig,
    pub overlays: OverlaysConfig,
    pub performance: PerformanceConfig,
}

/// Runtime configuration patch, keyed the way the settings store sends it
///
/// Absent fields leave the current value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    #[serde(rename = "lane_detection.confidence_threshold")]
    pub lane_confidence_threshold: Option<f32>,

    #[serde(rename = "fcws.warning_distance")]
    pub fcws_warning_distance: Option<f32>,

    #[serde(rename = "fcws.critical_distance")]
    pub fcws_critical_distance: Option<f32>,

    #[serde(rename = "ldws.departure_threshold")]
    pub ldws_departure_threshold: Option<f32>,

    #[serde(rename = "lkas.assist_threshold")]
    pub lkas_assist_threshold: Option<f32>,

    #[serde(rename = "overlays.bev.enabled")]
    pub bev_enabled: Option<bool>,

    #[serde(rename = "overlays.animations.enabled")]
    pub animations_enabled: Option<bool>,

    #[serde(rename = "overlays.lane_polygon.alpha")]
    pub lane_polygon_alpha: Option<f32>,
}

impl ConfigPatch {
    /// Parse a patch from the settings store's JSON payload
    pub fn from_json(payload: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(payload)
            .map_err(|e| invalid("payload", e.to_string()))
    }

    /// Merge the patch over a base configuration
    ///
    /// All-or-nothing: any invalid value rejects the whole patch and the
    /// base configuration remains in force. Cross-field rules are checked
    /// against the merged result, so a patch may fix one threshold and
    /// break the pair.
    pub fn apply(&self, base: &PipelineConfig) -> Result<PipelineConfig, ConfigError> {
        let mut next = base.clone();

        if let Some(v) = self.lane_confidence_threshold {
            if !(0.0..=1.0).contains(&v) {
                return Err(invalid(
                    "lane_detection.confidence_threshold",
                    format!("{v} outside [0, 1]"),
                ));
            }
            next.lane.confidence_threshold = v;
        }
        if let Some(v) = self.fcws_warning_distance {
            if v <= 0.0 || !v.is_finite() {
                return Err(invalid("fcws.warning_distance", format!("{v} not positive")));
            }
            next.fcws.warning_distance = v;
        }
        if let Some(v) = self.fcws_critical_distance {
            if v <= 0.0 || !v.is_finite() {
                return Err(invalid("fcws.critical_distance", format!("{v} not positive")));
            }
            next.fcws.critical_distance = v;
        }
        if let Some(v) = self.ldws_departure_threshold {
            if v <= 0.0 || !v.is_finite() {
                return Err(invalid(
                    "ldws.departure_threshold",
                    format!("{v} not positive"),
                ));
            }
            next.ldws.departure_threshold = v;
        }
        if let Some(v) = self.lkas_assist_threshold {
            if v < 0.0 || !v.is_finite() {
                return Err(invalid("lkas.assist_threshold", format!("{v} negative")));
            }
            next.lkas.assist_threshold = v;
        }
        if let Some(v) = self.lane_polygon_alpha {
            if !(0.0..=1.0).contains(&v) {
                return Err(invalid(
                    "overlays.lane_polygon.alpha",
                    format!("{v} outside [0, 1]"),
                ));
            }
            next.overlays.lane_polygon_alpha = v;
        }
        if let Some(v) = self.bev_enabled {
            next.overlays.bev_enabled = v;
        }
        if let Some(v) = self.animations_enabled {
            next.overlays.animations_enabled = v;
        }

        if next.fcws.warning_distance <= next.fcws.critical_distance {
            return Err(invalid(
                "fcws.warning_distance",
                format!(
                    "warning distance {} must exceed critical distance {}",
                    next.fcws.warning_distance, next.fcws.critical_distance
                ),
            ));
        }

        Ok(next)
    }
}
