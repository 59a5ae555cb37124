//! Easing functions for overlay animation
//!
//! Each easing is a pure function of `t` in [0, 1]. Bounce and elastic may
//! briefly leave [0, 1] for overshoot; all of them map 0 to 0 and 1 to 1.

use serde::{Deserialize, Serialize};

/// Easing kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Bounce,
    Elastic,
}

impl Easing {
    /// Apply the easing to a progress value; input is clamped to [0, 1]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::Bounce => bounce_out(t),
            Easing::Elastic => elastic_out(t),
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    if t < 1.0 / 2.75 {
        N * t * t
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        N * t * t + 0.75
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / 2.75;
        N * t * t + 0.984375
    }
}

fn elastic_out(t: f32) -> f32 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let p = 0.3;
    let s = p / 4.0;
    2.0f32.powf(-10.0 * t) * ((t - s) * std::f32::consts::TAU / p).sin() + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::Bounce,
        Easing::Elastic,
    ];

    #[test]
    fn test_endpoints_fixed() {
        for easing in ALL {
            assert!((easing.apply(0.0)).abs() < 1e-5, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_input_clamped() {
        for easing in ALL {
            assert_eq!(easing.apply(-0.5), easing.apply(0.0));
            assert_eq!(easing.apply(1.5), easing.apply(1.0));
        }
    }

    proptest! {
        #[test]
        fn prop_quadratic_easings_stay_in_unit_range(t in 0.0f32..=1.0) {
            for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
                let v = easing.apply(t);
                prop_assert!((0.0..=1.0).contains(&v), "{:?}({}) = {}", easing, t, v);
            }
        }

        #[test]
        fn prop_overshoot_easings_stay_bounded(t in 0.0f32..=1.0) {
            // Bounce/elastic overshoot by design, but only a little
            for easing in [Easing::Bounce, Easing::Elastic] {
                let v = easing.apply(t);
                prop_assert!((-0.5..=1.5).contains(&v), "{:?}({}) = {}", easing, t, v);
            }
        }
    }
}
