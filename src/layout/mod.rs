//! Flat layout cells.
//!
//! Generators write shapes and ports into a [`Cell`]; a [`Library`] of cells
//! is then exported to GDSII (see [`gds`]). All coordinates are integer
//! database units (1 nm).

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use subgeom::bbox::{Bbox, BoundBox};
use subgeom::{Point, Polygon, Rect, Shape, Side};
use thiserror::Error;

use crate::geometry::LayerSpec;

pub mod gds;

pub use gds::Library;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("port `{port}` already exists on cell `{cell}`")]
    DuplicatePort { cell: ArcStr, port: ArcStr },

    #[error("coordinate {0} um does not fit on the database grid")]
    Coordinate(f64),

    #[error("shape on layer {0} cannot be written as a GDS boundary")]
    UnsupportedShape(LayerSpec),

    #[error("error writing GDS: {0:?}")]
    Gds(#[from] gds21::GdsError),

    #[error("integer conversion failed: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),
}

pub type LayoutResult<T> = std::result::Result<T, LayoutError>;

/// A shape on a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub layer: LayerSpec,
    pub shape: Shape,
}

/// A named optical connection point on one side of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: ArcStr,
    pub center: Point,
    pub width: i64,
    /// The side of the cell the port faces out of.
    pub side: Side,
    pub layer: LayerSpec,
}

impl Port {
    pub fn new(
        name: impl Into<ArcStr>,
        center: Point,
        width: i64,
        side: Side,
        layer: LayerSpec,
    ) -> Self {
        Self {
            name: name.into(),
            center,
            width,
            side,
            layer,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub name: ArcStr,
    pub elements: Vec<Element>,
    pub ports: Vec<Port>,
}

impl Cell {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_rect(&mut self, layer: LayerSpec, rect: Rect) -> &mut Self {
        self.add_shape(layer, Shape::Rect(rect))
    }

    pub fn add_polygon(&mut self, layer: LayerSpec, poly: Polygon) -> &mut Self {
        self.add_shape(layer, Shape::Polygon(poly))
    }

    fn add_shape(&mut self, layer: LayerSpec, shape: Shape) -> &mut Self {
        self.elements.push(Element { layer, shape });
        self
    }

    pub fn add_port(&mut self, port: Port) -> LayoutResult<&mut Self> {
        if self.port(&port.name).is_some() {
            return Err(LayoutError::DuplicatePort {
                cell: self.name.clone(),
                port: port.name,
            });
        }
        self.ports.push(port);
        Ok(self)
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn elements_on(&self, layer: LayerSpec) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.layer == layer)
    }
}

impl BoundBox for Cell {
    fn bbox(&self) -> Bbox {
        self.elements
            .iter()
            .fold(Bbox::empty(), |acc, e| acc.union(e.shape.bbox()))
    }
}
