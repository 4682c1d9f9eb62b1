//! Ramp curves for envelope attack and release
//!
//! An envelope ramp maps normalized progress through the ramp (0.0 at the
//! ramp start, 1.0 at its end) to a gain multiplier. Attack ramps rise
//! from 0.0 toward the sustain level; release ramps fall from whatever
//! level the gain held when the release began.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

/// Shape of an envelope ramp
///
/// `Linear` is the default and matches a plain linear ramp between two
/// scheduled gain values. The remaining shapes trade predictability for
/// a smoother perceived onset:
/// - Exponential: slow start, fast finish
/// - Logarithmic: fast start, slow finish
/// - SCurve: smooth acceleration and deceleration
/// - EqualPower: quarter sine, constant perceived loudness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    #[default]
    Linear,
    /// v(t) = t²
    Exponential,
    /// v(t) = √t rising, (1-t)² falling
    Logarithmic,
    /// v(t) = 0.5 × (1 - cos(π × t))
    SCurve,
    /// v(t) = sin(t × π/2)
    EqualPower,
}

impl FadeCurve {
    /// Rising multiplier at `progress` through an attack ramp
    ///
    /// # Arguments
    /// * `progress` - Normalized position through the ramp, clamped to 0.0..=1.0
    ///
    /// # Returns
    /// Multiplier from 0.0 (ramp start) to 1.0 (ramp end)
    pub fn calculate_fade_in(&self, progress: f32) -> f32 {
        let t = progress.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            FadeCurve::Logarithmic => t.sqrt(),
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Falling multiplier at `progress` through a release ramp
    ///
    /// Returns 1.0 at the ramp start and 0.0 at its end.
    pub fn calculate_fade_out(&self, progress: f32) -> f32 {
        let t = progress.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential => 1.0 - t * t,
            FadeCurve::Logarithmic => (1.0 - t) * (1.0 - t),
            FadeCurve::SCurve => 0.5 * (1.0 + (PI * t).cos()),
            FadeCurve::EqualPower => ((1.0 - t) * FRAC_PI_2).sin(),
        }
    }

    /// Canonical lowercase name, as written in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Exponential => "exponential",
            FadeCurve::Logarithmic => "logarithmic",
            FadeCurve::SCurve => "s_curve",
            FadeCurve::EqualPower => "equal_power",
        }
    }

    /// All curve variants, in declaration order
    pub fn all() -> [FadeCurve; 5] {
        [
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::SCurve,
            FadeCurve::EqualPower,
        ]
    }
}

impl FromStr for FadeCurve {
    type Err = crate::Error;

    /// Case-insensitive; accepts `s_curve`, `s-curve` and `scurve` alike
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "linear" => Ok(FadeCurve::Linear),
            "exponential" => Ok(FadeCurve::Exponential),
            "logarithmic" => Ok(FadeCurve::Logarithmic),
            "scurve" | "cosine" => Ok(FadeCurve::SCurve),
            "equalpower" => Ok(FadeCurve::EqualPower),
            _ => Err(crate::Error::InvalidInput(format!("unknown fade curve: {}", s))),
        }
    }
}

impl fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_endpoints() {
        for curve in FadeCurve::all() {
            assert!(approx(curve.calculate_fade_in(0.0), 0.0), "{} in@0", curve);
            assert!(approx(curve.calculate_fade_in(1.0), 1.0), "{} in@1", curve);
            assert!(approx(curve.calculate_fade_out(0.0), 1.0), "{} out@0", curve);
            assert!(approx(curve.calculate_fade_out(1.0), 0.0), "{} out@1", curve);
        }
    }

    #[test]
    fn test_linear_midpoint() {
        assert!(approx(FadeCurve::Linear.calculate_fade_in(0.25), 0.25));
        assert!(approx(FadeCurve::Linear.calculate_fade_out(0.25), 0.75));
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(FadeCurve::Linear.calculate_fade_in(-3.0), 0.0);
        assert_eq!(FadeCurve::Linear.calculate_fade_in(7.5), 1.0);
        assert_eq!(FadeCurve::SCurve.calculate_fade_out(2.0), 0.0);
    }

    #[test]
    fn test_curves_are_monotonic() {
        for curve in FadeCurve::all() {
            let mut prev_in = -1.0;
            let mut prev_out = 2.0;
            for i in 0..=100 {
                let t = i as f32 / 100.0;
                let up = curve.calculate_fade_in(t);
                let down = curve.calculate_fade_out(t);
                assert!(up >= prev_in - EPSILON, "{} rising at {}", curve, t);
                assert!(down <= prev_out + EPSILON, "{} falling at {}", curve, t);
                prev_in = up;
                prev_out = down;
            }
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("linear".parse::<FadeCurve>().unwrap(), FadeCurve::Linear);
        assert_eq!("S-Curve".parse::<FadeCurve>().unwrap(), FadeCurve::SCurve);
        assert_eq!("equal_power".parse::<FadeCurve>().unwrap(), FadeCurve::EqualPower);
        assert!("wobble".parse::<FadeCurve>().is_err());

        for curve in FadeCurve::all() {
            assert_eq!(curve.to_string().parse::<FadeCurve>().unwrap(), curve);
        }
    }

    #[test]
    fn test_default_is_linear() {
        assert_eq!(FadeCurve::default(), FadeCurve::Linear);
    }
}
