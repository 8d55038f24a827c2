//! Constants for the k-d index file format.

/// Reserved value meaning "no child" in the left flag and right offset fields.
pub const NONE_OFFSET: u32 = 0xFFFF_FFFF;

/// Value of the left flag when the left child is the next record.
pub const LEFT_PRESENT: u32 = 0;

/// Bytes taken by everything except the key: zoom range (2 x u16),
/// payload offset, left flag and right offset (3 x u32).
pub const RECORD_TRAILER_SIZE: usize = 16;

/// Record size of a point index (`N = 2`).
pub const POINT_RECORD_SIZE: usize = 2 * 4 + RECORD_TRAILER_SIZE;

/// Record size of a bounding box index (`N = 4`).
pub const BOX_RECORD_SIZE: usize = 4 * 4 + RECORD_TRAILER_SIZE;
