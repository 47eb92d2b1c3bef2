use serde::Serialize;
use subgeom::{Rect, Side};

use super::{
    taper_section, tip_section, EdgeCouplerParams, GratingElement, Section, TaperSection,
};
use crate::geometry::{point_um, polygon_um, rect_from_origin_um, to_db, to_um};
use crate::layout::{Cell, Port};
use crate::Result;

/// A drawn edge coupler along with the sections it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeCoupler {
    pub cell: Cell,
    pub tip: Section,
    pub taper: TaperSection,
    pub output_wg: Rect,
}

impl EdgeCoupler {
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.tip.elements.len() + self.taper.grating.elements.len()
    }

    /// Distance in microns from the input port to the output port, if both exist.
    pub fn length(&self) -> Option<f64> {
        let o1 = self.cell.port("o1")?;
        let o2 = self.cell.port("o2")?;
        Some(to_um(o2.center.x - o1.center.x))
    }
}

/// Draws the tip, taper and output waveguide into a new cell.
pub fn draw_edge_coupler(params: &EdgeCouplerParams) -> Result<EdgeCoupler> {
    params.validate()?;

    let layer = params.layer;
    let mut cell = Cell::new(params.name.as_str());

    let tip = tip_section(&params.tip, 0.0)?;
    if tip.elements.is_empty() {
        log::warn!(
            "tip span {} um is shorter than one period; tip section is empty",
            params.tip.span
        );
    }
    log::debug!(
        "tip section: {} elements ending at x = {:.4}",
        tip.elements.len(),
        tip.end
    );

    let taper = taper_section(&params.taper, params.count_policy, tip.end)?;
    if taper.grating.elements.is_empty() {
        log::warn!(
            "taper span {} um is shorter than one period; taper grating is empty",
            params.taper.span
        );
    }
    log::debug!(
        "taper section ({:?} count): {} elements ending at x = {:.4}",
        params.count_policy,
        taper.grating.elements.len(),
        taper.grating.end
    );

    for elem in tip.elements.iter().chain(taper.grating.elements.iter()) {
        check_feature_size(elem, params.min_feature_size);
        cell.add_rect(layer, elem.rect()?);
    }
    cell.add_polygon(layer, polygon_um(taper.taper.iter().copied())?);

    let xpos = taper.grating.end;
    let wg_width = params.taper.final_width;
    let output_wg =
        rect_from_origin_um(xpos, -wg_width / 2.0, params.output_wg_length, wg_width)?;
    cell.add_rect(layer, output_wg);

    // The input port sits at the outer edge of the first tip segment.
    let o1 = point_um(
        -(params.tip.initial_period * params.tip.initial_duty_cycle) / 2.0,
        0.0,
    )?;
    cell.add_port(Port::new(
        "o1",
        o1,
        to_db(params.tip.initial_y_span)?,
        Side::Left,
        layer,
    ))?;
    cell.add_port(Port::new(
        "o2",
        point_um(xpos + params.output_wg_length, 0.0)?,
        to_db(wg_width)?,
        Side::Right,
        layer,
    ))?;

    Ok(EdgeCoupler {
        cell,
        tip,
        taper,
        output_wg,
    })
}

fn check_feature_size(elem: &GratingElement, min_feature_size: f64) {
    if elem.width < min_feature_size {
        log::warn!(
            "grating element at x = {:.4} is {:.4} um wide, below the minimum feature size of {} um",
            elem.x,
            elem.width,
            min_feature_size
        );
    }
}
