//! Detection and bounding box types

use serde::{Deserialize, Serialize};

/// Object class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Car,
    Truck,
    Bus,
    Motorcycle,
    Bicycle,
    Person,
    Unknown,
}

impl ObjectClass {
    /// Whether the class participates in forward collision checks
    pub fn is_collision_relevant(&self) -> bool {
        !matches!(self, ObjectClass::Unknown)
    }

    /// Typical real-world height in meters, used by calibrated distance
    /// estimation when the calibration data carries no per-class override
    pub fn default_height_m(&self) -> f32 {
        match self {
            ObjectClass::Car => 1.5,
            ObjectClass::Truck => 3.0,
            ObjectClass::Bus => 3.2,
            ObjectClass::Motorcycle => 1.2,
            ObjectClass::Bicycle => 1.7,
            ObjectClass::Person => 1.7,
            ObjectClass::Unknown => 1.5,
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Box center (x, y)
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Bottom edge y coordinate (the point closest to the ego vehicle)
    pub fn bottom(&self) -> f32 {
        self.y2
    }
}

/// Single object detection, produced fresh each frame (no tracking identity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Object class
    pub class: ObjectClass,

    /// Bounding box in frame coordinates
    pub bbox: BoundingBox,

    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,
}

impl Detection {
    pub fn new(class: ObjectClass, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            class,
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_geometry() {
        let bbox = BoundingBox::new(100.0, 500.0, 200.0, 600.0);
        assert_eq!(bbox.width(), 100.0);
        assert_eq!(bbox.height(), 100.0);
        assert_eq!(bbox.center(), (150.0, 550.0));
        assert_eq!(bbox.bottom(), 600.0);
    }

    #[test]
    fn test_detection_confidence_clamped() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let detection = Detection::new(ObjectClass::Car, bbox, 1.4);
        assert_eq!(detection.confidence, 1.0);
    }
}
