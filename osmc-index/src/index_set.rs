//! The six index files of one map directory.
//!
//! Every object class (points, ways, areas) gets a location index
//! (`*.lidx`, a k-d tree) and an id index (`*.idx`, a radix trie). Points
//! are keyed by their coordinate, ways and areas by their bounding box.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::TrieReaderConfig;
use crate::coordinate::{MapBox, MapPoint, PayloadOffset, ZoomLevel};
use crate::errors::IndexResult;
use crate::kd_tree::{KdIndexReader, KdTree};
use crate::keyed_object::{BoxObject, KeyRange, KeyedObjects, PointObject};
use crate::radix_trie::{RadixTrie, TrieReader, TrieReaderStats};

pub const POINTS_LOCATION_INDEX: &str = "points.lidx";
pub const WAYS_LOCATION_INDEX: &str = "ways.lidx";
pub const AREAS_LOCATION_INDEX: &str = "areas.lidx";
pub const POINTS_ID_INDEX: &str = "points.idx";
pub const WAYS_ID_INDEX: &str = "ways.idx";
pub const AREAS_ID_INDEX: &str = "areas.idx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    Point,
    Way,
    Area,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 3] = [ObjectClass::Point, ObjectClass::Way, ObjectClass::Area];

    pub fn location_file(self) -> &'static str {
        match self {
            ObjectClass::Point => POINTS_LOCATION_INDEX,
            ObjectClass::Way => WAYS_LOCATION_INDEX,
            ObjectClass::Area => AREAS_LOCATION_INDEX,
        }
    }

    pub fn id_file(self) -> &'static str {
        match self {
            ObjectClass::Point => POINTS_ID_INDEX,
            ObjectClass::Way => WAYS_ID_INDEX,
            ObjectClass::Area => AREAS_ID_INDEX,
        }
    }
}

/// What [`IndexSetWriter::finish`] wrote for one object class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    /// Objects in the location index.
    pub objects: usize,
    /// Distinct ids in the id index.
    pub ids: usize,
    pub location_bytes: u64,
    pub id_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSetSummary {
    pub points: ClassSummary,
    pub ways: ClassSummary,
    pub areas: ClassSummary,
}

impl IndexSetSummary {
    pub fn class(&self, class: ObjectClass) -> &ClassSummary {
        match class {
            ObjectClass::Point => &self.points,
            ObjectClass::Way => &self.ways,
            ObjectClass::Area => &self.areas,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        ObjectClass::ALL
            .iter()
            .map(|class| {
                let summary = self.class(*class);
                summary.location_bytes + summary.id_bytes
            })
            .sum()
    }
}

/// Collects the objects of one conversion run and writes their indexes.
///
/// Objects are only buffered until [`finish`](Self::finish); nothing is
/// written to the directory before that.
pub struct IndexSetWriter {
    dir: PathBuf,
    points: KeyedObjects<2>,
    ways: KeyedObjects<4>,
    areas: KeyedObjects<4>,
    point_ids: RadixTrie,
    way_ids: RadixTrie,
    area_ids: RadixTrie,
}

impl IndexSetWriter {
    /// Prepares a writer for `dir`, creating the directory if needed.
    pub fn create(dir: impl AsRef<Path>) -> IndexResult<Self> {
        let dir = dir.as_ref();
        log::debug!("Creating index set in {:?}", dir);
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            points: KeyedObjects::new(),
            ways: KeyedObjects::new(),
            areas: KeyedObjects::new(),
            point_ids: RadixTrie::new(),
            way_ids: RadixTrie::new(),
            area_ids: RadixTrie::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Indexes a point feature. Returns false when `id` was already indexed;
    /// the location is collected either way.
    pub fn add_point(
        &mut self,
        id: u32,
        point: MapPoint,
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) -> bool {
        self.points.collect_point(point, zoom_min, zoom_max, offset);
        self.point_ids.insert(id, offset)
    }

    pub fn add_way(
        &mut self,
        id: u32,
        bbox: MapBox,
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) -> bool {
        self.ways.collect_box(bbox, zoom_min, zoom_max, offset);
        self.way_ids.insert(id, offset)
    }

    pub fn add_area(
        &mut self,
        id: u32,
        bbox: MapBox,
        zoom_min: ZoomLevel,
        zoom_max: ZoomLevel,
        offset: PayloadOffset,
    ) -> bool {
        self.areas.collect_box(bbox, zoom_min, zoom_max, offset);
        self.area_ids.insert(id, offset)
    }

    /// Objects collected so far for `class`.
    pub fn len(&self, class: ObjectClass) -> usize {
        match class {
            ObjectClass::Point => self.points.len(),
            ObjectClass::Way => self.ways.len(),
            ObjectClass::Area => self.areas.len(),
        }
    }

    /// Builds and writes all six files.
    pub fn finish(mut self) -> IndexResult<IndexSetSummary> {
        let points = write_class(
            &self.dir,
            ObjectClass::Point,
            &mut self.points,
            &self.point_ids,
        )?;
        let ways = write_class(&self.dir, ObjectClass::Way, &mut self.ways, &self.way_ids)?;
        let areas = write_class(
            &self.dir,
            ObjectClass::Area,
            &mut self.areas,
            &self.area_ids,
        )?;

        let summary = IndexSetSummary {
            points,
            ways,
            areas,
        };
        log::info!(
            "Wrote index set in {:?}: {} points, {} ways, {} areas, {} bytes",
            self.dir,
            points.objects,
            ways.objects,
            areas.objects,
            summary.total_bytes()
        );
        Ok(summary)
    }
}

fn write_class<const N: usize>(
    dir: &Path,
    class: ObjectClass,
    objects: &mut KeyedObjects<N>,
    ids: &RadixTrie,
) -> IndexResult<ClassSummary> {
    log::debug!("Writing {:?} indexes", class);
    let location_bytes =
        KdTree::build(objects.as_mut_slice()).write_to_path(dir.join(class.location_file()))?;

    let id_bytes = ids.write_to_path(dir.join(class.id_file()))?;
    Ok(ClassSummary {
        objects: objects.len(),
        ids: ids.len(),
        location_bytes,
        id_bytes,
    })
}

/// Read access to the index files of one map directory.
#[derive(Debug)]
pub struct IndexSetReader {
    dir: PathBuf,
    points: KdIndexReader<2>,
    ways: KdIndexReader<4>,
    areas: KdIndexReader<4>,
    point_ids: TrieReader,
    way_ids: TrieReader,
    area_ids: TrieReader,
}

impl IndexSetReader {
    pub fn open(dir: impl AsRef<Path>) -> IndexResult<Self> {
        Self::open_with_config(dir, TrieReaderConfig::default())
    }

    /// Opens all six files; `config` applies to the three id indexes.
    pub fn open_with_config(dir: impl AsRef<Path>, config: TrieReaderConfig) -> IndexResult<Self> {
        let dir = dir.as_ref();
        log::debug!("Opening index set in {:?}", dir);
        Ok(Self {
            dir: dir.to_path_buf(),
            points: KdIndexReader::open(dir.join(POINTS_LOCATION_INDEX))?,
            ways: KdIndexReader::open(dir.join(WAYS_LOCATION_INDEX))?,
            areas: KdIndexReader::open(dir.join(AREAS_LOCATION_INDEX))?,
            point_ids: TrieReader::open_with_config(dir.join(POINTS_ID_INDEX), config)?,
            way_ids: TrieReader::open_with_config(dir.join(WAYS_ID_INDEX), config)?,
            area_ids: TrieReader::open_with_config(dir.join(AREAS_ID_INDEX), config)?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn id_index(&self, class: ObjectClass) -> &TrieReader {
        match class {
            ObjectClass::Point => &self.point_ids,
            ObjectClass::Way => &self.way_ids,
            ObjectClass::Area => &self.area_ids,
        }
    }

    pub fn point_offset(&self, id: u32) -> IndexResult<Option<PayloadOffset>> {
        self.point_ids.lookup(id)
    }

    pub fn way_offset(&self, id: u32) -> IndexResult<Option<PayloadOffset>> {
        self.way_ids.lookup(id)
    }

    pub fn area_offset(&self, id: u32) -> IndexResult<Option<PayloadOffset>> {
        self.area_ids.lookup(id)
    }

    /// Points inside `window` (edges included), visible at `zoom` if given.
    pub fn points_in(
        &self,
        window: &MapBox,
        zoom: Option<ZoomLevel>,
    ) -> IndexResult<Vec<PointObject>> {
        self.points.query(&KeyRange::<2>::within(window), zoom)
    }

    /// Ways whose bounding box intersects `window`.
    pub fn ways_in(&self, window: &MapBox, zoom: Option<ZoomLevel>) -> IndexResult<Vec<BoxObject>> {
        self.ways.query(&KeyRange::<4>::intersecting(window), zoom)
    }

    /// Areas whose bounding box intersects `window`.
    pub fn areas_in(
        &self,
        window: &MapBox,
        zoom: Option<ZoomLevel>,
    ) -> IndexResult<Vec<BoxObject>> {
        self.areas.query(&KeyRange::<4>::intersecting(window), zoom)
    }

    pub fn len(&self, class: ObjectClass) -> usize {
        match class {
            ObjectClass::Point => self.points.len(),
            ObjectClass::Way => self.ways.len(),
            ObjectClass::Area => self.areas.len(),
        }
    }

    pub fn id_stats(&self, class: ObjectClass) -> TrieReaderStats {
        self.id_index(class).stats()
    }

    /// Closes the three id indexes.
    pub fn close(&self) -> IndexResult<()> {
        for class in ObjectClass::ALL {
            self.id_index(class).close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IndexError;
    use crate::id_index::IdIndex;

    fn bbox(x0: i32, y0: i32, x1: i32, y1: i32) -> MapBox {
        MapBox::new(MapPoint::new(x0, y0), MapPoint::new(x1, y1))
    }

    fn sample(dir: &Path) -> IndexSetSummary {
        let mut writer = IndexSetWriter::create(dir).unwrap();
        writer.add_point(1, MapPoint::new(0, 0), 0, 18, 0);
        writer.add_point(2, MapPoint::new(50, 50), 10, 18, 40);
        writer.add_point(3, MapPoint::new(200, 200), 0, 18, 80);
        writer.add_way(10, bbox(0, 0, 100, 10), 5, 18, 120);
        writer.add_way(11, bbox(300, 300, 400, 400), 5, 18, 200);
        writer.add_area(20, bbox(-50, -50, 50, 50), 0, 12, 280);
        writer.finish().unwrap()
    }

    #[test]
    fn test_writes_six_files() {
        let dir = tempfile::tempdir().unwrap();
        let summary = sample(dir.path());
        for class in ObjectClass::ALL {
            assert!(dir.path().join(class.location_file()).exists());
            assert!(dir.path().join(class.id_file()).exists());
        }
        assert_eq!(summary.points.objects, 3);
        assert_eq!(summary.points.location_bytes, 3 * 24);
        assert_eq!(summary.ways.location_bytes, 2 * 32);
        assert_eq!(summary.areas.ids, 1);
        assert_eq!(
            fs::metadata(dir.path().join(AREAS_ID_INDEX)).unwrap().len(),
            summary.areas.id_bytes
        );
    }

    #[test]
    fn test_rewrite_truncates_location_files() {
        let dir = tempfile::tempdir().unwrap();
        sample(dir.path());

        let mut writer = IndexSetWriter::create(dir.path()).unwrap();
        writer.add_point(7, MapPoint::new(1, 1), 0, 18, 0);
        let summary = writer.finish().unwrap();
        for class in ObjectClass::ALL {
            let on_disk = fs::metadata(dir.path().join(class.location_file()))
                .unwrap()
                .len();
            assert_eq!(on_disk, summary.class(class).location_bytes, "{:?}", class);
        }
        assert_eq!(summary.points.location_bytes, 24);
        assert_eq!(summary.ways.location_bytes, 0);

        let reader = IndexSetReader::open(dir.path()).unwrap();
        assert_eq!(reader.point_offset(7).unwrap(), Some(0));
        assert_eq!(reader.point_offset(1).unwrap(), None);
    }

    #[test]
    fn test_lookup_by_id() {
        let dir = tempfile::tempdir().unwrap();
        sample(dir.path());
        let reader = IndexSetReader::open(dir.path()).unwrap();

        assert_eq!(reader.point_offset(2).unwrap(), Some(40));
        assert_eq!(reader.way_offset(11).unwrap(), Some(200));
        assert_eq!(reader.area_offset(20).unwrap(), Some(280));
        // ids are per class
        assert_eq!(reader.point_offset(10).unwrap(), None);
        assert_eq!(reader.id_index(ObjectClass::Way).find_offset(10), Some(120));
    }

    #[test]
    fn test_queries_by_window() {
        let dir = tempfile::tempdir().unwrap();
        sample(dir.path());
        let reader = IndexSetReader::open_with_config(
            dir.path(),
            TrieReaderConfig::builder().cache_depth(2).build(),
        )
        .unwrap();

        let window = bbox(-10, -10, 60, 60);
        let mut points: Vec<_> = reader
            .points_in(&window, None)
            .unwrap()
            .iter()
            .map(|p| p.offset)
            .collect();
        points.sort_unstable();
        assert_eq!(points, vec![0, 40]);

        // the point at (50, 50) is only visible from zoom 10
        let low_zoom = reader.points_in(&window, Some(5)).unwrap();
        assert_eq!(low_zoom.len(), 1);
        assert_eq!(low_zoom[0].offset, 0);

        let ways = reader.ways_in(&window, None).unwrap();
        assert_eq!(ways.len(), 1);
        assert_eq!(ways[0].bbox(), bbox(0, 0, 100, 10));

        assert_eq!(reader.areas_in(&window, Some(12)).unwrap().len(), 1);
        assert!(reader.areas_in(&window, Some(13)).unwrap().is_empty());
    }

    #[test]
    fn test_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let summary = IndexSetWriter::create(dir.path())
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(summary.points.location_bytes, 0);
        assert_eq!(summary.total_bytes(), 3 * 128);

        let reader = IndexSetReader::open(dir.path()).unwrap();
        assert_eq!(reader.len(ObjectClass::Point), 0);
        assert!(reader.points_in(&bbox(0, 0, 1, 1), None).unwrap().is_empty());
        assert_eq!(reader.point_offset(1).unwrap(), None);
    }

    #[test]
    fn test_duplicate_ids_keep_first_offset() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = IndexSetWriter::create(dir.path()).unwrap();
        assert!(writer.add_point(7, MapPoint::new(1, 1), 0, 18, 10));
        assert!(!writer.add_point(7, MapPoint::new(2, 2), 0, 18, 20));
        assert_eq!(writer.len(ObjectClass::Point), 2);
        let summary = writer.finish().unwrap();
        assert_eq!(summary.points.objects, 2);
        assert_eq!(summary.points.ids, 1);

        let reader = IndexSetReader::open(dir.path()).unwrap();
        assert_eq!(reader.point_offset(7).unwrap(), Some(10));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = IndexSetReader::open(dir.path().join("nope"));
        assert!(matches!(result, Err(IndexError::Io(_))));
    }

    #[test]
    fn test_close() {
        let dir = tempfile::tempdir().unwrap();
        sample(dir.path());
        let reader = IndexSetReader::open(dir.path()).unwrap();
        reader.close().unwrap();
        assert!(matches!(reader.way_offset(10), Err(IndexError::Closed)));
        // location indexes stay readable
        assert_eq!(reader.len(ObjectClass::Way), 2);
    }

    #[test]
    fn test_summary_serializes() {
        let dir = tempfile::tempdir().unwrap();
        let summary = sample(dir.path());
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["ways"]["objects"], 2);
    }
}
