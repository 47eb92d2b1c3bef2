//! Interpolation laws for tapered structures.

use std::f64::consts::PI;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// How a dimension varies from its initial to its final value along a taper.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaperLaw {
    /// Raised-cosine profile with zero slope at both ends.
    #[default]
    Cosine,
    Linear,
}

impl TaperLaw {
    /// Evaluates the law at position `x` of a taper of length `length`.
    ///
    /// Returns `start` at `x == 0` and `end` at `x == length` exactly.
    /// Positions outside `[0, length]` are not clamped: the linear law
    /// extrapolates and the cosine law keeps oscillating.
    pub fn eval(&self, x: f64, start: f64, end: f64, length: f64) -> f64 {
        let t = x / length;
        let w = match *self {
            Self::Cosine => (1.0 - (PI * t).cos()) / 2.0,
            Self::Linear => t,
        };
        start * (1.0 - w) + end * w
    }
}

impl Display for TaperLaw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Cosine => write!(f, "cosine"),
            Self::Linear => write!(f, "linear"),
        }
    }
}

/// Adiabatic (raised-cosine) taper value at `x`.
#[inline]
pub fn adiabatic_taper(x: f64, start: f64, end: f64, length: f64) -> f64 {
    TaperLaw::Cosine.eval(x, start, end, length)
}

/// Linear taper value at `x`.
#[inline]
pub fn linear_taper(x: f64, start: f64, end: f64, length: f64) -> f64 {
    TaperLaw::Linear.eval(x, start, end, length)
}
