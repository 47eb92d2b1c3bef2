//! Layout units and layers.
//!
//! Generators compute in microns as `f64`. Shapes are built on the
//! [`subgeom`] integer grid, where one database unit is 1 nm.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use subgeom::{Point, Polygon, Rect, Side};

use crate::layout::{LayoutError, LayoutResult};

/// Database units per micron.
pub const DB_PER_UM: f64 = 1_000.0;

/// Converts microns to database units, rounding to the nearest unit.
///
/// Values that do not fit a 32-bit GDSII coordinate are rejected.
pub fn to_db(um: f64) -> LayoutResult<i64> {
    let scaled = (um * DB_PER_UM).round();
    if !scaled.is_finite() || scaled > i32::MAX as f64 || scaled < i32::MIN as f64 {
        return Err(LayoutError::Coordinate(um));
    }
    Ok(scaled as i64)
}

#[inline]
pub fn to_um(db: i64) -> f64 {
    db as f64 / DB_PER_UM
}

pub fn point_um(x: f64, y: f64) -> LayoutResult<Point> {
    Ok(Point::new(to_db(x)?, to_db(y)?))
}

/// A rectangle of the given size centered on `(x, y)`, all in microns.
pub fn rect_from_center_um(x: f64, y: f64, width: f64, height: f64) -> LayoutResult<Rect> {
    Ok(Rect::new(
        point_um(x - width / 2.0, y - height / 2.0)?,
        point_um(x + width / 2.0, y + height / 2.0)?,
    ))
}

/// A rectangle with lower-left corner `(x, y)` and the given size, all in microns.
pub fn rect_from_origin_um(x: f64, y: f64, width: f64, height: f64) -> LayoutResult<Rect> {
    Ok(Rect::new(point_um(x, y)?, point_um(x + width, y + height)?))
}

pub fn polygon_um(points: impl IntoIterator<Item = (f64, f64)>) -> LayoutResult<Polygon> {
    let points = points
        .into_iter()
        .map(|(x, y)| point_um(x, y))
        .collect::<LayoutResult<Vec<_>>>()?;
    Ok(Polygon { points })
}

/// Unit vector pointing out of a port on the given side of a cell.
pub fn outward(side: Side) -> Point {
    match side {
        Side::Right => Point::new(1, 0),
        Side::Top => Point::new(0, 1),
        Side::Left => Point::new(-1, 0),
        Side::Bot => Point::new(0, -1),
    }
}

/// A GDS layer/datatype pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LayerSpec(pub i16, pub i16);

impl LayerSpec {
    /// Silicon waveguide core.
    pub const WG: LayerSpec = LayerSpec(1, 0);
    /// Optical pin markers.
    pub const PIN: LayerSpec = LayerSpec(1, 10);
    /// Port name labels.
    pub const TEXT: LayerSpec = LayerSpec(10, 0);

    #[inline]
    pub fn layer(&self) -> i16 {
        self.0
    }

    #[inline]
    pub fn datatype(&self) -> i16 {
        self.1
    }
}

impl Default for LayerSpec {
    fn default() -> Self {
        Self::WG
    }
}

impl Display for LayerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}
