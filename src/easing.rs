//! Easing functions for timed actions.
//!
//! An easing function maps linear normalized time (`raw` in `[0, 1]`) to the
//! eased progress a [`TimedRunner`](crate::runner::TimedRunner) feeds into its
//! interpolation. All functions are deterministic, fix the endpoints
//! (`apply(0) == 0`, `apply(1) == 1`), and are encoded by name in stored
//! records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic mapping from linear normalized time to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Identity: progress advances at constant speed.
    #[default]
    Linear,
    /// Quadratic ease-in: slow start, fast finish.
    EaseIn,
    /// Quadratic ease-out: fast start, slow finish.
    EaseOut,
    /// Quadratic ease-in-out: slow at both ends.
    EaseInOut,
    /// Cubic ease-in.
    CubicIn,
    /// Cubic ease-out.
    CubicOut,
}

impl Easing {
    /// Apply the easing curve to a clamped normalized time value.
    ///
    /// Inputs outside `[0, 1]` are clamped before evaluation so a late clock
    /// tick can never overshoot the target value.
    #[must_use]
    pub fn apply(self, raw: f32) -> f32 {
        let t = raw.clamp(0.0, 1.0);
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
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
        }
    }

    /// All easing variants, in stored-name order. Handy for editor pickers.
    #[must_use]
    pub const fn all() -> [Easing; 6] {
        [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::CubicIn,
            Easing::CubicOut,
        ]
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease-in",
            Easing::EaseOut => "ease-out",
            Easing::EaseInOut => "ease-in-out",
            Easing::CubicIn => "cubic-in",
            Easing::CubicOut => "cubic-out",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_fixed_for_every_curve() {
        for easing in Easing::all() {
            assert_eq!(easing.apply(0.0), 0.0, "{easing} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing} at 1");
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        for easing in Easing::all() {
            assert_eq!(easing.apply(-3.0), 0.0);
            assert_eq!(easing.apply(1.25), 1.0);
        }
    }

    #[test]
    fn curves_are_monotonic_on_a_coarse_grid() {
        for easing in Easing::all() {
            let mut last = 0.0_f32;
            for step in 0..=20 {
                let value = easing.apply(step as f32 / 20.0);
                assert!(value >= last, "{easing} not monotonic at step {step}");
                last = value;
            }
        }
    }

    #[test]
    fn serde_names_round_trip() {
        for easing in Easing::all() {
            let json = serde_json::to_string(&easing).unwrap();
            let back: Easing = serde_json::from_str(&json).unwrap();
            assert_eq!(easing, back);
        }
        assert_eq!(serde_json::to_string(&Easing::EaseInOut).unwrap(), "\"ease-in-out\"");
    }
}
