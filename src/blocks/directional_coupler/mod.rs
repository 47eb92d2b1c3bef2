//! 2x2 directional coupler.
//!
//! Two straight waveguides separated by `gap` form the coupling region. Each
//! end of each waveguide is fanned out with an S-bend.

use anyhow::bail;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::geometry::LayerSpec;
use crate::Result;

pub mod layout;

pub use layout::draw_directional_coupler;

/// Extent of an S-bend: `length` along x, `offset` along y.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BendSize {
    pub length: f64,
    pub offset: f64,
}

impl BendSize {
    pub const fn new(length: f64, offset: f64) -> Self {
        Self { length, offset }
    }
}

impl Default for BendSize {
    fn default() -> Self {
        Self::new(10.0, 5.0)
    }
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Debug))]
#[serde(default)]
pub struct DirectionalCouplerParams {
    #[builder(setter(into), default = "String::from(\"directional_coupler_2x2\")")]
    pub name: String,
    #[builder(default)]
    pub layer: LayerSpec,
    #[builder(default)]
    pub input_bend1: BendSize,
    #[builder(default)]
    pub input_bend2: BendSize,
    #[builder(default)]
    pub output_bend1: BendSize,
    #[builder(default)]
    pub output_bend2: BendSize,
    #[builder(default)]
    pub coupling_length: f64,
    #[builder(default = "0.5")]
    pub wg_width: f64,
    #[builder(default = "0.2")]
    pub gap: f64,
    /// Number of points along each S-bend centerline.
    #[builder(default = "200")]
    pub npoints: usize,
}

impl Default for DirectionalCouplerParams {
    fn default() -> Self {
        Self {
            name: String::from("directional_coupler_2x2"),
            layer: LayerSpec::WG,
            input_bend1: BendSize::default(),
            input_bend2: BendSize::default(),
            output_bend1: BendSize::default(),
            output_bend2: BendSize::default(),
            coupling_length: 0.0,
            wg_width: 0.5,
            gap: 0.2,
            npoints: 200,
        }
    }
}

impl DirectionalCouplerParams {
    #[inline]
    pub fn builder() -> DirectionalCouplerParamsBuilder {
        DirectionalCouplerParamsBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.wg_width > 0.0) {
            bail!("Waveguide width must be positive, got {}", self.wg_width);
        }
        if !(self.gap >= 0.0) {
            bail!("Coupling gap must be non-negative, got {}", self.gap);
        }
        if !(self.coupling_length >= 0.0) {
            bail!(
                "Coupling length must be non-negative, got {}",
                self.coupling_length
            );
        }
        if self.npoints < 2 {
            bail!("S-bends need at least 2 points, got {}", self.npoints);
        }
        let bends = [
            ("input bend 1", self.input_bend1),
            ("input bend 2", self.input_bend2),
            ("output bend 1", self.output_bend1),
            ("output bend 2", self.output_bend2),
        ];
        for (name, bend) in bends {
            if !(bend.length > 0.0 && bend.offset.is_finite()) {
                bail!("The {name} must have a positive length, got {}", bend.length);
            }
        }
        Ok(())
    }

    /// Center-to-center distance of the coupled waveguides, halved.
    #[inline]
    pub fn coupler_y(&self) -> f64 {
        (self.wg_width + self.gap) / 2.0
    }
}

/// A cubic Bezier S-bend from `(0, 0)` to `(length, offset)` with horizontal
/// tangents at both ends. Points are `(x, y)` pairs in microns.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SBend {
    pub size: BendSize,
}

impl SBend {
    pub fn new(size: BendSize) -> Self {
        Self { size }
    }

    fn control_points(&self) -> [(f64, f64); 4] {
        let BendSize { length, offset } = self.size;
        [
            (0.0, 0.0),
            (length / 2.0, 0.0),
            (length / 2.0, offset),
            (length, offset),
        ]
    }

    /// Point on the curve at parameter `t` in `[0, 1]`.
    pub fn point(&self, t: f64) -> (f64, f64) {
        let [p0, p1, p2, p3] = self.control_points();
        let s = 1.0 - t;
        let (b0, b1, b2, b3) = (s * s * s, 3.0 * s * s * t, 3.0 * s * t * t, t * t * t);
        (
            b0 * p0.0 + b1 * p1.0 + b2 * p2.0 + b3 * p3.0,
            b0 * p0.1 + b1 * p1.1 + b2 * p2.1 + b3 * p3.1,
        )
    }

    /// Unnormalized tangent at parameter `t`.
    pub fn tangent(&self, t: f64) -> (f64, f64) {
        let [p0, p1, p2, p3] = self.control_points();
        let s = 1.0 - t;
        let (d0, d1, d2) = (3.0 * s * s, 6.0 * s * t, 3.0 * t * t);
        (
            d0 * (p1.0 - p0.0) + d1 * (p2.0 - p1.0) + d2 * (p3.0 - p2.0),
            d0 * (p1.1 - p0.1) + d1 * (p2.1 - p1.1) + d2 * (p3.1 - p2.1),
        )
    }

    fn params(npoints: usize) -> impl Iterator<Item = f64> {
        let last = (npoints - 1) as f64;
        (0..npoints).map(move |i| i as f64 / last)
    }

    pub fn centerline(&self, npoints: usize) -> Vec<(f64, f64)> {
        Self::params(npoints).map(|t| self.point(t)).collect()
    }

    /// Outline of the bend as a waveguide of constant `width`.
    pub fn outline(&self, width: f64, npoints: usize) -> Vec<(f64, f64)> {
        let samples = Self::params(npoints)
            .map(|t| (self.point(t), self.tangent(t)))
            .collect::<Vec<_>>();
        extrude(&samples, width)
    }
}

/// Sweeps a constant-width cross section along a sampled centerline.
///
/// Each sample is a point with its (not necessarily unit) tangent. The
/// outline runs along the right-hand edge, then back along the left.
pub fn extrude(samples: &[((f64, f64), (f64, f64))], width: f64) -> Vec<(f64, f64)> {
    let half = width / 2.0;
    let offsets = samples
        .iter()
        .map(|&((x, y), (dx, dy))| {
            let norm = dx.hypot(dy);
            let (nx, ny) = if norm > 0.0 {
                (-dy / norm * half, dx / norm * half)
            } else {
                (0.0, half)
            };
            ((x + nx, y + ny), (x - nx, y - ny))
        })
        .collect::<Vec<_>>();

    let mut points = Vec::with_capacity(2 * offsets.len());
    points.extend(offsets.iter().map(|(_, right)| *right));
    points.extend(offsets.iter().rev().map(|(left, _)| *left));
    points
}
