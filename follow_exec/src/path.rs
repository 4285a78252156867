//! # Reference paths
//!
//! A reference path is a closed-form curve `y(x)` in the plane. The controller tracks it live,
//! while the analyser samples it into a [`RefCurve`] to score the recorded trajectory. Both must
//! use the same definition, so it lives here.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use util::maths;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of samples in a reference curve
pub const NUM_REF_SAMPLES: usize = 400;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The shape of the reference path.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    /// `y = 0`
    Straight,

    /// `y = 2 sin(0.5 x)`
    Sine,

    /// `y = 0.5 x + 2 sin(0.2 x)`
    Curved,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown path type \"{0}\", expected one of straight, sine or curved")]
pub struct PathTypeParseError(String);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A reference path sampled at evenly spaced `x` values.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RefCurve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PathType {
    /// Evaluate the path at `x`, returning `(y, dy/dx)`.
    pub fn eval(&self, x: f64) -> (f64, f64) {
        match self {
            PathType::Straight => (0.0, 0.0),
            PathType::Sine => (2.0 * (0.5 * x).sin(), 2.0 * 0.5 * (0.5 * x).cos()),
            PathType::Curved => (
                0.5 * x + 2.0 * (0.2 * x).sin(),
                0.5 + 2.0 * 0.2 * (0.2 * x).cos(),
            ),
        }
    }

    /// The path's `y` at `x`.
    pub fn y(&self, x: f64) -> f64 {
        self.eval(x).0
    }

    /// The path's slope at `x`.
    pub fn slope(&self, x: f64) -> f64 {
        self.eval(x).1
    }
}

impl Default for PathType {
    fn default() -> Self {
        PathType::Curved
    }
}

impl FromStr for PathType {
    type Err = PathTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "straight" => Ok(PathType::Straight),
            "sine" => Ok(PathType::Sine),
            "curved" => Ok(PathType::Curved),
            _ => Err(PathTypeParseError(s.into())),
        }
    }
}

impl std::fmt::Display for PathType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PathType::Straight => "straight",
            PathType::Sine => "sine",
            PathType::Curved => "curved",
        };
        write!(f, "{}", name)
    }
}

impl RefCurve {
    /// Sample `path` at `num` evenly spaced points over `[0, length]`.
    pub fn sample(path: PathType, length: f64, num: usize) -> Self {
        let xs = maths::linspace(0.0, length, num);
        let ys = xs.iter().map(|x| path.y(*x)).collect();

        Self { xs, ys }
    }

    /// Linearly interpolate the curve at `x`, clamping outside of the sampled range.
    ///
    /// `None` if the curve has no samples.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        maths::interp(&self.xs, &self.ys, x)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PATHS: [PathType; 3] = [PathType::Straight, PathType::Sine, PathType::Curved];

    #[test]
    fn test_slope_is_derivative() {
        let h = 1e-6;

        for path in PATHS.iter() {
            for i in -50..150 {
                let x = i as f64 * 0.173;
                let numeric = (path.y(x + h) - path.y(x - h)) / (2.0 * h);

                assert!(
                    (path.slope(x) - numeric).abs() < 1e-6,
                    "{} path slope at x = {}: {} vs {}",
                    path,
                    x,
                    path.slope(x),
                    numeric
                );
            }
        }
    }

    #[test]
    fn test_known_values() {
        assert_eq!(PathType::Straight.eval(12.0), (0.0, 0.0));
        assert_eq!(PathType::Sine.eval(0.0), (0.0, 1.0));

        let (y, slope) = PathType::Curved.eval(0.0);
        assert_eq!(y, 0.0);
        assert!((slope - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_parse() {
        assert_eq!("sine".parse::<PathType>().unwrap(), PathType::Sine);
        assert_eq!("Curved".parse::<PathType>().unwrap(), PathType::Curved);
        assert!("zigzag".parse::<PathType>().is_err());

        for path in PATHS.iter() {
            assert_eq!(path.to_string().parse::<PathType>().unwrap(), *path);
        }
    }

    #[test]
    fn test_ref_curve() {
        let curve = RefCurve::sample(PathType::Sine, 20.0, NUM_REF_SAMPLES);

        assert_eq!(curve.xs.len(), NUM_REF_SAMPLES);
        assert_eq!(curve.ys.len(), NUM_REF_SAMPLES);

        // On sample points the interpolation is exact
        assert_eq!(curve.y_at(curve.xs[100]), Some(curve.ys[100]));

        // Between them it's close to the analytic curve
        assert!((curve.y_at(7.3).unwrap() - PathType::Sine.y(7.3)).abs() < 1e-2);

        // And clamped outside
        assert_eq!(curve.y_at(-3.0), Some(curve.ys[0]));
        assert_eq!(curve.y_at(25.0), Some(curve.ys[NUM_REF_SAMPLES - 1]));
    }
}
