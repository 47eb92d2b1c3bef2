//! Subwavelength grating (SWG) edge coupler.
//!
//! The coupler has three sections, placed left to right along the x axis:
//!
//! 1. A tip of grating segments whose period, duty cycle and transverse span
//!    follow an adiabatic (raised-cosine) law.
//! 2. A taper of grating segments following a linear law, overlaid with a
//!    continuous linear waveguide taper.
//! 3. A straight output waveguide.

use anyhow::bail;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::taper::TaperLaw;
use subgeom::Rect;

use crate::geometry::{rect_from_center_um, LayerSpec};
use crate::layout::LayoutResult;
use crate::Result;

pub mod layout;

pub use layout::{draw_edge_coupler, EdgeCoupler};

/// Upper bound on the number of grating segments in a single section.
pub const MAX_GRATING_ELEMENTS: usize = 1_000_000;

/// Parameters of the cosine-law tip section. Lengths are in microns.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Debug))]
#[serde(default)]
pub struct TipParams {
    pub initial_period: f64,
    pub final_period: f64,
    pub initial_duty_cycle: f64,
    pub final_duty_cycle: f64,
    pub initial_y_span: f64,
    pub final_y_span: f64,
    /// Length over which the cosine law runs from initial to final values.
    pub tapering_length: f64,
    /// Extent of the tip section; segments are placed while they fit.
    pub span: f64,
}

impl Default for TipParams {
    fn default() -> Self {
        Self {
            initial_period: 0.4,
            final_period: 0.35,
            initial_duty_cycle: 0.8,
            final_duty_cycle: 0.46,
            initial_y_span: 0.22,
            final_y_span: 0.4,
            tapering_length: 1.55,
            span: 40.0,
        }
    }
}

impl TipParams {
    /// Checks that periods, spans and the tapering length are positive and
    /// that duty cycles lie in `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        check_lengths(&[
            ("tip initial period", self.initial_period),
            ("tip final period", self.final_period),
            ("tip initial y span", self.initial_y_span),
            ("tip final y span", self.final_y_span),
            ("tip tapering length", self.tapering_length),
        ])?;
        check_extents(&[("tip span", self.span)])?;
        check_duty_cycles(&[
            ("tip initial duty cycle", self.initial_duty_cycle),
            ("tip final duty cycle", self.final_duty_cycle),
        ])?;
        check_element_limit(
            "tip",
            self.span,
            self.initial_period.min(self.final_period),
        )
    }
}

/// Parameters of the linear-law taper section. Lengths are in microns.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Debug))]
#[serde(default)]
pub struct TaperParams {
    pub initial_period: f64,
    pub final_period: f64,
    pub initial_duty_cycle: f64,
    pub final_duty_cycle: f64,
    pub initial_y_span: f64,
    pub final_y_span: f64,
    /// Total length of the taper section.
    pub span: f64,
    /// Width of the overlaid linear taper at its input.
    pub initial_width: f64,
    /// Width of the overlaid linear taper at its output; also the output waveguide width.
    pub final_width: f64,
}

impl Default for TaperParams {
    fn default() -> Self {
        Self {
            initial_period: 0.35,
            final_period: 0.2,
            initial_duty_cycle: 0.5631,
            final_duty_cycle: 0.8,
            initial_y_span: 0.36,
            final_y_span: 0.5,
            span: 20.0,
            initial_width: 0.1,
            final_width: 0.5,
        }
    }
}

impl TaperParams {
    /// Checks that periods, spans and widths are positive and that duty
    /// cycles lie in `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        check_lengths(&[
            ("taper initial period", self.initial_period),
            ("taper final period", self.final_period),
            ("taper initial y span", self.initial_y_span),
            ("taper final y span", self.final_y_span),
            ("taper span", self.span),
            ("taper initial width", self.initial_width),
            ("taper final width", self.final_width),
        ])?;
        check_duty_cycles(&[
            ("taper initial duty cycle", self.initial_duty_cycle),
            ("taper final duty cycle", self.final_duty_cycle),
        ])?;
        check_element_limit(
            "taper",
            self.span,
            self.initial_period.min(self.final_period),
        )
    }
}

fn check_lengths(values: &[(&str, f64)]) -> Result<()> {
    for &(name, value) in values {
        if !(value > 0.0 && value.is_finite()) {
            bail!("The {name} must be a positive length, got {value}");
        }
    }
    Ok(())
}

fn check_extents(values: &[(&str, f64)]) -> Result<()> {
    for &(name, value) in values {
        if !(value >= 0.0 && value.is_finite()) {
            bail!("The {name} must be a non-negative length, got {value}");
        }
    }
    Ok(())
}

fn check_duty_cycles(values: &[(&str, f64)]) -> Result<()> {
    for &(name, value) in values {
        if !(value > 0.0 && value <= 1.0) {
            bail!("The {name} must be in (0, 1], got {value}");
        }
    }
    Ok(())
}

fn check_element_limit(section: &str, span: f64, min_period: f64) -> Result<()> {
    if span / min_period > MAX_GRATING_ELEMENTS as f64 {
        bail!("The {section} section would need more than {MAX_GRATING_ELEMENTS} grating elements");
    }
    Ok(())
}

/// How the number of segments in the taper section is chosen.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountPolicy {
    /// `floor(span / average_period)`.
    #[default]
    Average,
    /// Advance segment by segment until the next one would leave the span,
    /// as the tip section does.
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Debug))]
#[serde(default)]
pub struct EdgeCouplerParams {
    #[builder(setter(into), default = "String::from(\"EC_SWG\")")]
    pub name: String,
    #[builder(default)]
    pub layer: LayerSpec,
    /// Segments narrower than this are reported as manufacturability warnings.
    #[builder(default = "0.04")]
    pub min_feature_size: f64,
    #[builder(default = "10.0")]
    pub output_wg_length: f64,
    #[builder(default)]
    pub tip: TipParams,
    #[builder(default)]
    pub taper: TaperParams,
    #[builder(default)]
    pub count_policy: CountPolicy,
}

impl Default for EdgeCouplerParams {
    fn default() -> Self {
        Self {
            name: String::from("EC_SWG"),
            layer: LayerSpec::WG,
            min_feature_size: 0.04,
            output_wg_length: 10.0,
            tip: TipParams::default(),
            taper: TaperParams::default(),
            count_policy: CountPolicy::default(),
        }
    }
}

impl EdgeCouplerParams {
    #[inline]
    pub fn builder() -> EdgeCouplerParamsBuilder {
        EdgeCouplerParamsBuilder::default()
    }

    /// Checks both sections and the output waveguide.
    pub fn validate(&self) -> Result<()> {
        self.tip.validate()?;
        self.taper.validate()?;
        check_extents(&[
            ("output waveguide length", self.output_wg_length),
            ("minimum feature size", self.min_feature_size),
        ])
    }
}

/// A single rectangular grating segment centered at `(x, 0)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GratingElement {
    pub x: f64,
    pub width: f64,
    pub y_span: f64,
}

impl GratingElement {
    pub fn rect(&self) -> LayoutResult<Rect> {
        rect_from_center_um(self.x, 0.0, self.width, self.y_span)
    }
}

/// Segments of a generated section and the position the next section starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub elements: Vec<GratingElement>,
    pub end: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaperSection {
    pub grating: Section,
    /// Outline of the continuous linear taper overlaid on the grating, in microns.
    pub taper: Vec<(f64, f64)>,
}

/// Counts segments by advancing one local period at a time from position 0
/// until the next segment plus one final period would pass `span`.
///
/// Fails if a period is not positive or the count exceeds
/// [`MAX_GRATING_ELEMENTS`].
fn simulate_count(span: f64, final_period: f64, period_at: impl Fn(f64) -> f64) -> Result<usize> {
    let mut u = 0.0;
    let mut n = 0;
    while u + final_period <= span {
        let period = period_at(u);
        if !(period > 0.0) {
            bail!("Grating period at {u} um must be positive, got {period}");
        }
        if n == MAX_GRATING_ELEMENTS {
            bail!("Section would need more than {MAX_GRATING_ELEMENTS} grating elements");
        }
        u += period;
        n += 1;
    }
    Ok(n)
}

/// Number of tip segments, found by simulating the advance.
pub fn tip_element_count(params: &TipParams) -> Result<usize> {
    params.validate()?;
    simulate_count(params.span, params.final_period, |u| {
        TaperLaw::Cosine.eval(
            u,
            params.initial_period,
            params.final_period,
            params.tapering_length,
        )
    })
}

/// Generates the tip section starting at `x0`.
pub fn tip_section(params: &TipParams, x0: f64) -> Result<Section> {
    let law = TaperLaw::Cosine;
    let len = params.tapering_length;
    let n = tip_element_count(params)?;

    let mut elements = Vec::with_capacity(n);
    let mut u = 0.0;
    for _ in 0..n {
        let period = law.eval(u, params.initial_period, params.final_period, len);
        let duty_cycle = law.eval(u, params.initial_duty_cycle, params.final_duty_cycle, len);
        let y_span = law.eval(u, params.initial_y_span, params.final_y_span, len);
        elements.push(GratingElement {
            x: x0 + u,
            width: duty_cycle * period,
            y_span,
        });
        u += period;
    }

    Ok(Section {
        elements,
        end: x0 + u,
    })
}

pub fn taper_element_count(params: &TaperParams, policy: CountPolicy) -> Result<usize> {
    params.validate()?;
    match policy {
        CountPolicy::Average => {
            let average_period = (params.initial_period + params.final_period) / 2.0;
            Ok((params.span / average_period).floor() as usize)
        }
        CountPolicy::Simulated => simulate_count(params.span, params.final_period, |u| {
            TaperLaw::Linear.eval(u, params.initial_period, params.final_period, params.span)
        }),
    }
}

/// Width of the first taper segment, which offsets the overlaid linear taper.
#[inline]
fn initial_segment_width(params: &TaperParams) -> f64 {
    params.initial_duty_cycle * params.initial_period
}

/// Generates the taper section starting at `x0`.
///
/// The returned end position is where the overlaid linear taper ends:
/// `x0 + span - w0 / 2`, with `w0` the width of the first segment.
pub fn taper_section(params: &TaperParams, policy: CountPolicy, x0: f64) -> Result<TaperSection> {
    let law = TaperLaw::Linear;
    let span = params.span;
    let n = taper_element_count(params, policy)?;

    let mut elements = Vec::with_capacity(n);
    let mut u = 0.0;
    for _ in 0..n {
        let period = law.eval(u, params.initial_period, params.final_period, span);
        let duty_cycle = law.eval(u, params.initial_duty_cycle, params.final_duty_cycle, span);
        let y_span = law.eval(u, params.initial_y_span, params.final_y_span, span);
        elements.push(GratingElement {
            x: x0 + u,
            width: duty_cycle * period,
            y_span,
        });
        u += period;
    }

    let start = x0 - initial_segment_width(params) / 2.0;
    let stop = start + span;
    let (w1, w2) = (params.initial_width / 2.0, params.final_width / 2.0);
    let taper = vec![(start, -w1), (stop, -w2), (stop, w2), (start, w1)];

    Ok(TaperSection {
        grating: Section { elements, end: stop },
        taper,
    })
}
