//! Static k-dimensional index over keyed objects.
//!
//! This module builds a balanced binary tree by recursive median split and
//! stores it as a flat file of fixed-size records:
//! - One generic builder for any dimension count (`N = 2` for points,
//!   `N = 4` for bounding boxes)
//! - Pre-order serialization where a left child always follows its parent,
//!   so only the right child needs an offset
//! - A memory-mapped reader for read-back and range queries
//!
//! The tree is built once per conversion run and never updated; there is no
//! rebalancing after construction.

pub mod kd_constants;
pub mod kd_record;
mod kd_builder;
mod kd_writer;
mod kd_reader;

pub use kd_builder::{build_kd_tree, KdNode, KdTree};
pub use kd_constants::{NONE_OFFSET, POINT_RECORD_SIZE, BOX_RECORD_SIZE};
pub use kd_record::KdRecord;
pub use kd_reader::KdIndexReader;
pub use kd_writer::{build_and_write, write_kd_tree};
