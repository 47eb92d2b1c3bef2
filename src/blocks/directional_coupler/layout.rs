use subgeom::transform::{Transform, Transformation, Translate};
use subgeom::{Polygon, Side};

use super::{BendSize, DirectionalCouplerParams, SBend};
use crate::geometry::{point_um, polygon_um, rect_from_origin_um, to_db};
use crate::layout::{Cell, LayoutResult, Port};
use crate::Result;

/// Builds a bend on the database grid, optionally mirrored about the x axis,
/// with its start moved to `(x, y)`.
fn place_bend(
    size: BendSize,
    width: f64,
    npoints: usize,
    mirror: bool,
    x: f64,
    y: f64,
) -> LayoutResult<Polygon> {
    let mut poly = polygon_um(SBend::new(size).outline(width, npoints))?;
    if mirror {
        poly = poly.transform(Transformation::reflect_vert());
    }
    poly.translate(point_um(x, y)?);
    Ok(poly)
}

/// Draws the coupler with its coupling region starting at `x = input_bend1.length`.
///
/// Ports: `top_in`, `bot_in` (facing left) and `top_out`, `bot_out` (facing right).
pub fn draw_directional_coupler(params: &DirectionalCouplerParams) -> Result<Cell> {
    params.validate()?;

    let layer = params.layer;
    let w = params.wg_width;
    let cy = params.coupler_y();
    let x0 = params.input_bend1.length;
    let x1 = x0 + params.coupling_length;
    let n = params.npoints;

    let mut cell = Cell::new(params.name.as_str());

    // Input bends descend (top) or ascend (bottom) into the coupling region.
    let BendSize {
        length: l1,
        offset: o1,
    } = params.input_bend1;
    cell.add_polygon(
        layer,
        place_bend(params.input_bend1, w, n, true, x0 - l1, o1 + cy)?,
    );

    let BendSize {
        length: l2,
        offset: o2,
    } = params.input_bend2;
    cell.add_polygon(
        layer,
        place_bend(params.input_bend2, w, n, false, x0 - l2, -o2 - cy)?,
    );

    if params.coupling_length > 0.0 {
        for y in [cy, -cy] {
            cell.add_rect(
                layer,
                rect_from_origin_um(x0, y - w / 2.0, params.coupling_length, w)?,
            );
        }
    }

    cell.add_polygon(
        layer,
        place_bend(params.output_bend1, w, n, false, x1, cy)?,
    );
    cell.add_polygon(
        layer,
        place_bend(params.output_bend2, w, n, true, x1, -cy)?,
    );

    let ports = [
        ("top_in", (x0 - l1, o1 + cy), Side::Left),
        ("bot_in", (x0 - l2, -o2 - cy), Side::Left),
        (
            "top_out",
            (
                x1 + params.output_bend1.length,
                cy + params.output_bend1.offset,
            ),
            Side::Right,
        ),
        (
            "bot_out",
            (
                x1 + params.output_bend2.length,
                -cy - params.output_bend2.offset,
            ),
            Side::Right,
        ),
    ];
    let width = to_db(w)?;
    for (name, (x, y), side) in ports {
        cell.add_port(Port::new(name, point_um(x, y)?, width, side, layer))?;
    }

    Ok(cell)
}

#[cfg(test)]
mod tests {
    use subgeom::bbox::BoundBox;
    use subgeom::Point;

    use super::*;
    use crate::layout::Library;
    use crate::paths::out_gds;
    use crate::tests::test_work_dir;

    #[test]
    fn test_directional_coupler_default() {
        let work_dir = test_work_dir("test_directional_coupler_default");
        std::fs::create_dir_all(&work_dir).unwrap();
        let params = DirectionalCouplerParams::default();

        let cell = draw_directional_coupler(&params).expect("failed to draw coupler");
        // Zero-length coupling region: only the four bends.
        assert_eq!(cell.elements.len(), 4);

        let top_in = cell.port("top_in").unwrap();
        assert_eq!(top_in.center, Point::new(0, 5_350));
        assert_eq!(top_in.width, 500);
        assert_eq!(top_in.side, Side::Left);
        let bot_out = cell.port("bot_out").unwrap();
        assert_eq!(bot_out.center, Point::new(20_000, -5_350));
        assert_eq!(bot_out.side, Side::Right);

        let bbox = cell.brect();
        assert_eq!(bbox.p0.x, 0);
        assert_eq!(bbox.p1.x, 20_000);
        assert_eq!(bbox.p1.y, 5_600);
        assert_eq!(bbox.p0.y, -5_600);

        Library::with_cell("dc", cell)
            .save(out_gds(work_dir, "layout"))
            .expect("failed to write layout");
    }

    #[test]
    fn mirrored_bend_ends_at_its_port() {
        let poly = place_bend(BendSize::new(10.0, 5.0), 0.5, 20, true, 0.0, 5.35).unwrap();
        // The start cap is centered on the port and the end cap on the coupler arm.
        assert_eq!(poly.points[0], Point::new(0, 5_600));
        assert_eq!(poly.points[39], Point::new(0, 5_100));
        assert_eq!(poly.points[19], Point::new(10_000, 600));
        assert_eq!(poly.points[20], Point::new(10_000, 100));
    }

    #[test]
    fn test_directional_coupler_asymmetric_inputs() {
        let params = DirectionalCouplerParams::builder()
            .input_bend1(BendSize::new(12.0, 4.0))
            .input_bend2(BendSize::new(8.0, 6.0))
            .coupling_length(15.0)
            .gap(0.3)
            .build()
            .unwrap();
        let cell = draw_directional_coupler(&params).unwrap();
        assert_eq!(cell.elements.len(), 6);

        // Both input bends end where the coupling region starts.
        let bot_in = cell.port("bot_in").unwrap();
        assert_eq!(bot_in.center, Point::new(4_000, -6_400));

        let top_out = cell.port("top_out").unwrap();
        assert_eq!(top_out.center, Point::new(37_000, 5_400));

        let coupling = cell
            .elements
            .iter()
            .filter_map(|e| e.shape.as_rect())
            .collect::<Vec<_>>();
        assert_eq!(coupling.len(), 2);
        assert_eq!(coupling[0].p0, Point::new(12_000, 150));
        assert_eq!(coupling[0].p1, Point::new(27_000, 650));
    }
}
