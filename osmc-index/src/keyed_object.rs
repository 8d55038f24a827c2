//! Keyed objects and the append-only collector feeding the k-d builder.
//!
//! A keyed object is the only thing the spatial index knows about a map
//! feature: an `N`-dimensional integer key, the zoom range it is visible in
//! and the offset of its full record in the data file. Points use `N = 2`
//! (`[x, y]`), way and area boxes use `N = 4` (`[min.x, min.y, max.x, max.y]`).

use crate::coordinate::{MapBox, MapPoint, PayloadOffset, ZoomLevel};

/// One indexed feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyedObject<const N: usize> {
    pub key: [i32; N],
    pub zoom_min: ZoomLevel,
    pub zoom_max: ZoomLevel,
    pub offset: PayloadOffset,
}

/// Point feature key (`[x, y]`).
pub type PointObject = KeyedObject<2>;

/// Bounding box feature key (`[min.x, min.y, max.x, max.y]`).
pub type BoxObject = KeyedObject<4>;

impl<const N: usize> KeyedObject<N> {
    pub fn new(
        key: [i32; N],
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) -> Self {
        Self {
            key,
            zoom_min,
            zoom_max,
            offset,
        }
    }

    /// Whether the object should be drawn at `zoom`.
    pub fn is_visible_at(&self, zoom: ZoomLevel) -> bool {
        self.zoom_min <= zoom && zoom <= self.zoom_max
    }
}

impl KeyedObject<2> {
    pub fn from_point(
        point: MapPoint,
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) -> Self {
        Self::new([point.x, point.y], zoom_min, zoom_max, offset)
    }

    pub fn point(&self) -> MapPoint {
        MapPoint::new(self.key[0], self.key[1])
    }
}

impl KeyedObject<4> {
    pub fn from_box(
        bbox: MapBox,
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) -> Self {
        Self::new(
            [bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y],
            zoom_min,
            zoom_max,
            offset,
        )
    }

    pub fn bbox(&self) -> MapBox {
        MapBox::new(
            MapPoint::new(self.key[0], self.key[1]),
            MapPoint::new(self.key[2], self.key[3]),
        )
    }
}

/// Append-only collection of keyed objects for one object class.
#[derive(Debug, Clone, Default)]
pub struct KeyedObjects<const N: usize> {
    values: Vec<KeyedObject<N>>,
}

impl<const N: usize> KeyedObjects<N> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends one object. Keys and zoom ranges are stored as given.
    pub fn collect(
        &mut self,
        key: [i32; N],
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) {
        self.values
            .push(KeyedObject::new(key, zoom_min, zoom_max, offset));
    }

    pub fn push(&mut self, object: KeyedObject<N>) {
        self.values.push(object);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[KeyedObject<N>] {
        &self.values
    }

    /// Mutable view handed to the builder, which reorders it in place.
    pub fn as_mut_slice(&mut self) -> &mut [KeyedObject<N>] {
        &mut self.values
    }

    pub fn into_vec(self) -> Vec<KeyedObject<N>> {
        self.values
    }
}

impl KeyedObjects<2> {
    pub fn collect_point(
        &mut self,
        point: MapPoint,
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) {
        self.push(KeyedObject::from_point(point, zoom_min, zoom_max, offset));
    }
}

impl KeyedObjects<4> {
    pub fn collect_box(
        &mut self,
        bbox: MapBox,
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) {
        self.push(KeyedObject::from_box(bbox, zoom_min, zoom_max, offset));
    }
}

impl<const N: usize> From<Vec<KeyedObject<N>>> for KeyedObjects<N> {
    fn from(values: Vec<KeyedObject<N>>) -> Self {
        Self { values }
    }
}

impl<const N: usize> FromIterator<KeyedObject<N>> for KeyedObjects<N> {
    fn from_iter<I: IntoIterator<Item = KeyedObject<N>>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Closed per-dimension ranges a key must fall into to match a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange<const N: usize> {
    pub lo: [i32; N],
    pub hi: [i32; N],
}

impl<const N: usize> KeyRange<N> {
    pub fn new(lo: [i32; N], hi: [i32; N]) -> Self {
        Self { lo, hi }
    }

    /// Range that accepts every key.
    pub fn all() -> Self {
        Self {
            lo: [i32::MIN; N],
            hi: [i32::MAX; N],
        }
    }

    pub fn contains(&self, key: &[i32; N]) -> bool {
        (0..N).all(|d| self.lo[d] <= key[d] && key[d] <= self.hi[d])
    }
}

impl KeyRange<2> {
    /// Points lying inside `window`.
    pub fn within(window: &MapBox) -> Self {
        Self::new(
            [window.min.x, window.min.y],
            [window.max.x, window.max.y],
        )
    }
}

impl KeyRange<4> {
    /// Boxes intersecting `window`: `min <= window.max` and `max >= window.min`.
    pub fn intersecting(window: &MapBox) -> Self {
        Self::new(
            [i32::MIN, i32::MIN, window.min.x, window.min.y],
            [window.max.x, window.max.y, i32::MAX, i32::MAX],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_appends_in_order() {
        let mut objects = KeyedObjects::<2>::new();
        assert!(objects.is_empty());
        objects.collect([1, 2], 0, 5, 10);
        objects.collect([3, 4], 2, 18, 20);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects.as_slice()[0], KeyedObject::new([1, 2], 0, 5, 10));
        assert_eq!(objects.as_slice()[1].offset, 20);
    }

    #[test]
    fn test_collect_point_and_box() {
        let mut points = KeyedObjects::<2>::with_capacity(1);
        points.collect_point(MapPoint::new(7, -3), 14, 18, 0);
        assert_eq!(points.as_slice()[0].key, [7, -3]);
        assert_eq!(points.as_slice()[0].point(), MapPoint::new(7, -3));

        let mut boxes = KeyedObjects::<4>::new();
        let bbox = MapBox::new(MapPoint::new(1, 2), MapPoint::new(3, 4));
        boxes.collect_box(bbox, 5, 11, 64);
        assert_eq!(boxes.as_slice()[0].key, [1, 2, 3, 4]);
        assert_eq!(boxes.as_slice()[0].bbox(), bbox);
    }

    #[test]
    fn test_is_visible_at() {
        let object = KeyedObject::new([0, 0], 5, 11, 0);
        assert!(!object.is_visible_at(4));
        assert!(object.is_visible_at(5));
        assert!(object.is_visible_at(11));
        assert!(!object.is_visible_at(12));
    }

    #[test]
    fn test_inverted_zoom_range_is_kept() {
        let mut objects = KeyedObjects::<2>::new();
        objects.collect([0, 0], 9, 3, 0);
        assert_eq!(objects.as_slice()[0].zoom_min, 9);
        assert!(!objects.as_slice()[0].is_visible_at(5));
    }

    #[test]
    fn test_from_iterator() {
        let objects: KeyedObjects<2> = (0..5)
            .map(|i| KeyedObject::new([i, -i], 0, 18, i as u32))
            .collect();
        assert_eq!(objects.len(), 5);
        assert_eq!(objects.into_vec()[4].key, [4, -4]);
    }

    #[test]
    fn test_key_range_within() {
        let window = MapBox::new(MapPoint::new(0, 0), MapPoint::new(10, 10));
        let range = KeyRange::within(&window);
        assert!(range.contains(&[0, 10]));
        assert!(!range.contains(&[11, 5]));
        assert!(KeyRange::<2>::all().contains(&[i32::MIN, i32::MAX]));
    }

    #[test]
    fn test_key_range_intersecting() {
        let window = MapBox::new(MapPoint::new(0, 0), MapPoint::new(10, 10));
        let range = KeyRange::intersecting(&window);
        let inside = MapBox::new(MapPoint::new(2, 2), MapPoint::new(3, 3));
        let overlapping = MapBox::new(MapPoint::new(-5, -5), MapPoint::new(0, 0));
        let outside = MapBox::new(MapPoint::new(11, 0), MapPoint::new(20, 5));
        for bbox in [inside, overlapping, outside] {
            let object = BoxObject::from_box(bbox, 0, 18, 0);
            assert_eq!(range.contains(&object.key), window.intersects(&bbox));
        }
    }
}
