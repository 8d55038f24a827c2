//! # OSMC Index - Map Object Indexes
//!
//! This crate provides the two index structures a map conversion run writes
//! next to its data file, and the readers that query them afterwards.
//!
//! ## Features
//!
//! - **Location Index**: a static k-d tree over points (`N = 2`) or
//!   bounding boxes (`N = 4`), stored as fixed-size pre-order records
//! - **Id Index**: a base-16 radix trie from 32-bit object ids to payload
//!   offsets, stored as 16-slot records
//! - **Front Cache**: the top trie levels are held in memory so a lookup
//!   needs only a few disk reads
//! - **Thread Safe Reads**: id readers serialize each record read and can
//!   be shared between threads
//! - **Index Sets**: one writer and one reader for the six files of a map
//!   directory
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use osmc_index::{IndexSetReader, IndexSetWriter, MapBox, MapPoint};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = IndexSetWriter::create("map")?;
//! writer.add_point(42, MapPoint::from_degrees(27.56, 53.9), 12, 18, 0);
//! writer.finish()?;
//!
//! let reader = IndexSetReader::open("map")?;
//! assert_eq!(reader.point_offset(42)?, Some(0));
//!
//! let window = MapBox::new(
//!     MapPoint::from_degrees(27.0, 53.0),
//!     MapPoint::from_degrees(28.0, 54.0),
//! );
//! let visible = reader.points_in(&window, Some(14))?;
//! assert_eq!(visible.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinate;
pub mod errors;
pub mod id_index;
pub mod index_set;
pub mod kd_tree;
pub mod keyed_object;
pub mod radix_trie;

pub use config::{TrieReaderConfig, TrieReaderConfigBuilder};
pub use coordinate::{
    Coordinate, MapBox, MapPoint, PayloadOffset, ZoomLevel, COORDINATE_MULTIPLIER,
    MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL,
};
pub use errors::{IndexError, IndexResult};
pub use id_index::IdIndex;
pub use index_set::{
    ClassSummary, IndexSetReader, IndexSetSummary, IndexSetWriter, ObjectClass,
};
pub use kd_tree::{build_and_write, build_kd_tree, write_kd_tree, KdIndexReader, KdNode, KdTree};
pub use keyed_object::{BoxObject, KeyRange, KeyedObject, KeyedObjects, PointObject};
pub use radix_trie::{RadixTrie, TrieReader, TrieReaderStats};
