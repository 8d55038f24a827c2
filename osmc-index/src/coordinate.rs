//! Fixed-point map coordinates, points, boxes and zoom levels.

use serde::{Deserialize, Serialize};

/// Scale between decimal degrees and the stored integer coordinate.
pub const COORDINATE_MULTIPLIER: f64 = 10_000_000.0;

/// Lowest zoom level an object can be visible at.
pub const MIN_ZOOM_LEVEL: ZoomLevel = 0;

/// Highest zoom level an object can be visible at.
pub const MAX_ZOOM_LEVEL: ZoomLevel = 18;

/// Display-scale tier.
pub type ZoomLevel = u16;

/// Byte offset of an object's full record in an externally owned data file.
pub type PayloadOffset = u32;

/// A coordinate in decimal degrees scaled by [`COORDINATE_MULTIPLIER`].
///
/// # Examples
///
/// ```rust,ignore
/// use osmc_index::Coordinate;
///
/// let lon = Coordinate::from_degrees(27.5615244);
/// assert_eq!(lon.raw(), 275_615_244);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Coordinate(pub i32);

impl Coordinate {
    /// Converts decimal degrees, rounding to the nearest representable step.
    pub fn from_degrees(degrees: f64) -> Coordinate {
        Coordinate((degrees * COORDINATE_MULTIPLIER).round() as i32)
    }

    pub fn to_degrees(self) -> f64 {
        f64::from(self.0) / COORDINATE_MULTIPLIER
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.7}", self.to_degrees())
    }
}

/// A point of a map feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: i32,
    pub y: i32,
}

impl MapPoint {
    pub fn new(x: i32, y: i32) -> MapPoint {
        MapPoint { x, y }
    }

    /// Builds a point from longitude / latitude in decimal degrees.
    pub fn from_degrees(lon: f64, lat: f64) -> MapPoint {
        MapPoint {
            x: Coordinate::from_degrees(lon).raw(),
            y: Coordinate::from_degrees(lat).raw(),
        }
    }
}

/// An axis aligned bounding box over fixed-point coordinates.
///
/// `MapBox` is inclusive on both corners. A freshly created [`MapBox::empty`]
/// box is inverted so that the first `enlarge` call snaps it to the point.
///
/// # Examples
///
/// ```rust,ignore
/// use osmc_index::{MapBox, MapPoint};
///
/// let mut bounds = MapBox::empty();
/// bounds.enlarge(MapPoint::new(10, 20));
/// bounds.enlarge(MapPoint::new(-5, 40));
/// assert_eq!(bounds, MapBox::new(MapPoint::new(-5, 20), MapPoint::new(10, 40)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapBox {
    pub min: MapPoint,
    pub max: MapPoint,
}

impl MapBox {
    pub fn new(min: MapPoint, max: MapPoint) -> MapBox {
        MapBox { min, max }
    }

    /// The inverted box that contains nothing.
    pub fn empty() -> MapBox {
        MapBox {
            min: MapPoint::new(i32::MAX, i32::MAX),
            max: MapPoint::new(i32::MIN, i32::MIN),
        }
    }

    /// Bounding box of a list of points, or the empty box for no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a MapPoint>) -> MapBox {
        let mut bounds = MapBox::empty();
        for point in points {
            bounds.enlarge(*point);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Grows the box to include the point.
    pub fn enlarge(&mut self, point: MapPoint) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Grows the box to include another box.
    pub fn enlarge_box(&mut self, other: &MapBox) {
        if other.is_empty() {
            return;
        }
        self.enlarge(other.min);
        self.enlarge(other.max);
    }

    pub fn contains_point(&self, point: MapPoint) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn intersects(&self, other: &MapBox) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }
}

impl Default for MapBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for MapBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MapBox({}, {}, {}, {})",
            self.min.x, self.min.y, self.max.x, self.max.y
        )
    }
}
