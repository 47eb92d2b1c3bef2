//! GDSII export.
//!
//! The library uses a 1 um user unit and a 1 nm database unit, matching the
//! integer grid of the layout shapes. Ports become SiEPIC-style pins: a short
//! path on [`LayerSpec::PIN`] straddling the port edge plus a text label on
//! [`LayerSpec::TEXT`].

use std::path::Path;

use arcstr::ArcStr;
use subgeom::{Point, Shape, ShapeTrait};

use super::{Cell, Element, LayoutError, LayoutResult, Port};
use crate::geometry::{outward, LayerSpec, DB_PER_UM};

/// Length of the pin marker path, in database units.
pub const PIN_LENGTH: i64 = 100;

#[derive(Debug, Clone, Default)]
pub struct Library {
    pub name: ArcStr,
    pub cells: Vec<Cell>,
}

impl Library {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn with_cell(name: impl Into<ArcStr>, cell: Cell) -> Self {
        let mut lib = Self::new(name);
        lib.cells.push(cell);
        lib
    }

    pub fn to_gds(&self) -> LayoutResult<gds21::GdsLibrary> {
        let mut gdslib = gds21::GdsLibrary::new(self.name.to_string());
        gdslib.units = gds21::GdsUnits::new(1.0 / DB_PER_UM, 1e-6 / DB_PER_UM);
        for cell in self.cells.iter() {
            gdslib.structs.push(export_cell(cell)?);
        }
        Ok(gdslib)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> LayoutResult<()> {
        let path = path.as_ref();
        log::debug!("writing {} cell(s) to {:?}", self.cells.len(), path);
        self.to_gds()?.save(path)?;
        Ok(())
    }
}

fn export_cell(cell: &Cell) -> LayoutResult<gds21::GdsStruct> {
    let mut elems = Vec::with_capacity(cell.elements.len() + 2 * cell.ports.len());
    for elem in cell.elements.iter() {
        elems.push(export_element(elem)?);
    }
    for port in cell.ports.iter() {
        elems.extend(export_port(port)?);
    }

    let mut strukt = gds21::GdsStruct::new(cell.name.to_string());
    strukt.elems = elems;
    Ok(strukt)
}

fn export_element(elem: &Element) -> LayoutResult<gds21::GdsElement> {
    let poly = match elem.shape {
        Shape::Rect(ref r) => r.to_poly(),
        Shape::Polygon(ref p) => p.clone(),
        Shape::Path(_) | Shape::Point(_) => return Err(LayoutError::UnsupportedShape(elem.layer)),
    };
    let mut xy = poly
        .points
        .iter()
        .map(export_point)
        .collect::<LayoutResult<Vec<_>>>()?;
    // GDS boundaries are explicitly closed.
    if let Some(first) = xy.first().cloned() {
        xy.push(first);
    }
    Ok(gds21::GdsBoundary {
        layer: elem.layer.layer(),
        datatype: elem.layer.datatype(),
        xy,
        ..Default::default()
    }
    .into())
}

fn export_port(port: &Port) -> LayoutResult<[gds21::GdsElement; 2]> {
    let dir = outward(port.side);
    let half = PIN_LENGTH / 2;
    let start = port.center.translated(Point::new(-dir.x * half, -dir.y * half));
    let stop = port.center.translated(Point::new(dir.x * half, dir.y * half));

    let pin = gds21::GdsPath {
        layer: LayerSpec::PIN.layer(),
        datatype: LayerSpec::PIN.datatype(),
        width: Some(i32::try_from(port.width)?),
        xy: vec![export_point(&start)?, export_point(&stop)?],
        ..Default::default()
    };
    let label = gds21::GdsTextElem {
        string: port.name.to_string().into(),
        layer: LayerSpec::TEXT.layer(),
        texttype: LayerSpec::TEXT.datatype(),
        xy: export_point(&port.center)?,
        ..Default::default()
    };
    Ok([pin.into(), label.into()])
}

fn export_point(p: &Point) -> LayoutResult<gds21::GdsPoint> {
    Ok(gds21::GdsPoint::new(
        i32::try_from(p.x)?,
        i32::try_from(p.y)?,
    ))
}

#[cfg(test)]
mod tests {
    use subgeom::{Path, Rect, Side};

    use super::*;
    use crate::geometry::rect_from_origin_um;
    use crate::paths::out_gds;
    use crate::tests::test_work_dir;

    fn simple_cell() -> Cell {
        let mut cell = Cell::new("wg");
        cell.add_rect(
            LayerSpec::WG,
            rect_from_origin_um(0.0, -0.25, 10.0, 0.5).unwrap(),
        );
        cell.add_port(Port::new(
            "o2",
            Point::new(10_000, 0),
            500,
            Side::Right,
            LayerSpec::WG,
        ))
        .unwrap();
        cell
    }

    #[test]
    fn exports_boundaries_and_pins() {
        let lib = Library::with_cell("test_lib", simple_cell());
        let gds = lib.to_gds().unwrap();
        assert_eq!(gds.structs.len(), 1);

        let elems = &gds.structs[0].elems;
        // One boundary, one pin path, one label.
        assert_eq!(elems.len(), 3);
        match &elems[0] {
            gds21::GdsElement::GdsBoundary(b) => {
                assert_eq!(b.layer, 1);
                assert_eq!(b.xy.len(), 5);
                assert_eq!(b.xy[0], b.xy[4]);
                assert_eq!(b.xy[2], gds21::GdsPoint::new(10_000, 250));
            }
            other => panic!("expected boundary, got {other:?}"),
        }
        match &elems[1] {
            gds21::GdsElement::GdsPath(p) => {
                assert_eq!(p.layer, LayerSpec::PIN.layer());
                assert_eq!(p.width, Some(500));
                assert_eq!(
                    p.xy,
                    vec![
                        gds21::GdsPoint::new(9_950, 0),
                        gds21::GdsPoint::new(10_050, 0)
                    ]
                );
            }
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn left_facing_pin_points_west() {
        let mut cell = Cell::new("wg");
        cell.add_port(Port::new(
            "o1",
            Point::new(-160, 0),
            220,
            Side::Left,
            LayerSpec::WG,
        ))
        .unwrap();
        let gds = Library::with_cell("test_lib", cell).to_gds().unwrap();
        match &gds.structs[0].elems[0] {
            gds21::GdsElement::GdsPath(p) => assert_eq!(
                p.xy,
                vec![
                    gds21::GdsPoint::new(-110, 0),
                    gds21::GdsPoint::new(-210, 0)
                ]
            ),
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unexportable_geometry() {
        let mut cell = Cell::new("bad");
        cell.elements.push(Element {
            layer: LayerSpec::WG,
            shape: Shape::Path(Path {
                points: vec![Point::zero(), Point::new(1_000, 0)],
                width: 100,
            }),
        });
        assert!(matches!(
            Library::with_cell("test_lib", cell).to_gds(),
            Err(LayoutError::UnsupportedShape(_))
        ));

        let mut cell = Cell::new("far");
        cell.add_rect(
            LayerSpec::WG,
            Rect::new(Point::zero(), Point::new(i64::from(i32::MAX) + 1, 10)),
        );
        assert!(matches!(
            Library::with_cell("test_lib", cell).to_gds(),
            Err(LayoutError::TryFromInt(_))
        ));
    }

    #[test]
    fn saves_gds_file() {
        let work_dir = test_work_dir("test_save_gds");
        std::fs::create_dir_all(&work_dir).unwrap();
        let path = out_gds(&work_dir, "wg");
        Library::with_cell("test_lib", simple_cell())
            .save(&path)
            .expect("failed to write layout");

        let read = gds21::GdsLibrary::load(&path).expect("failed to read layout");
        assert_eq!(read.structs.len(), 1);
        assert_eq!(read.structs[0].elems.len(), 3);
    }
}
