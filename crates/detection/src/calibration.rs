//! Camera calibration data
//!
//! Calibration is consumed, never derived: the host loads it from wherever
//! it lives (file, EEPROM) and hands it to the pipeline at construction.

use crate::object::ObjectClass;
use ndarray::Array2;
use std::collections::HashMap;

/// Camera calibration: intrinsic matrix, distortion coefficients, and
/// per-class real-world object heights
#[derive(Debug, Clone)]
pub struct Calibration {
    /// 3x3 camera intrinsic matrix
    pub camera_matrix: Array2<f64>,
    /// Lens distortion coefficients (stored for reporting, not applied here)
    pub dist_coeffs: Vec<f64>,
    /// Real-world object heights in meters, overriding the class defaults
    pub object_heights: HashMap<ObjectClass, f32>,
}

impl Calibration {
    pub fn new(
        camera_matrix: Array2<f64>,
        dist_coeffs: Vec<f64>,
        object_heights: HashMap<ObjectClass, f32>,
    ) -> Self {
        Self {
            camera_matrix,
            dist_coeffs,
            object_heights,
        }
    }

    /// Build a calibration from a single focal length (square pixels, no
    /// distortion), enough for the pinhole distance model
    pub fn from_focal_length(focal_px: f64, cx: f64, cy: f64) -> Self {
        let camera_matrix = ndarray::arr2(&[
            [focal_px, 0.0, cx],
            [0.0, focal_px, cy],
            [0.0, 0.0, 1.0],
        ]);
        Self {
            camera_matrix,
            dist_coeffs: Vec::new(),
            object_heights: HashMap::new(),
        }
    }

    /// Focal length in pixels (average of fx and fy)
    pub fn focal_length(&self) -> f64 {
        (self.camera_matrix[[0, 0]] + self.camera_matrix[[1, 1]]) / 2.0
    }

    /// Real-world height for a class, falling back to the built-in defaults
    pub fn object_height_m(&self, class: ObjectClass) -> f32 {
        self.object_heights
            .get(&class)
            .copied()
            .unwrap_or_else(|| class.default_height_m())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focal_length_averages_fx_fy() {
        let matrix = ndarray::arr2(&[[800.0, 0.0, 320.0], [0.0, 900.0, 240.0], [0.0, 0.0, 1.0]]);
        let calibration = Calibration::new(matrix, vec![], HashMap::new());
        assert_eq!(calibration.focal_length(), 850.0);
    }

    #[test]
    fn test_object_height_override() {
        let mut heights = HashMap::new();
        heights.insert(ObjectClass::Truck, 3.5);
        let calibration =
            Calibration::new(Array2::eye(3), vec![], heights);

        assert_eq!(calibration.object_height_m(ObjectClass::Truck), 3.5);
        assert_eq!(
            calibration.object_height_m(ObjectClass::Car),
            ObjectClass::Car.default_height_m()
        );
    }
}
