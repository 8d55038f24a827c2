//! Fixed-size on-disk record of one k-d tree node.
//!
//! Layout (little-endian, no padding):
//!
//! | field          | type       |
//! |----------------|------------|
//! | key            | `[i32; N]` |
//! | zoom_min       | `u16`      |
//! | zoom_max       | `u16`      |
//! | payload offset | `u32`      |
//! | left flag      | `u32`      |
//! | right offset   | `u32`      |
//!
//! The left flag is `0` when the left child is the very next record and
//! [`NONE_OFFSET`] when there is no left child. The right offset is the byte
//! distance from the end of this record to the right child's record, i.e.
//! the size of the left subtree, or [`NONE_OFFSET`] when there is no right
//! child.

use super::kd_constants::{LEFT_PRESENT, NONE_OFFSET, RECORD_TRAILER_SIZE};
use crate::errors::{IndexError, IndexResult};
use crate::keyed_object::KeyedObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdRecord<const N: usize> {
    pub object: KeyedObject<N>,
    pub left_present: bool,
    /// Bytes to skip after this record to reach the right child.
    pub right_offset: Option<u32>,
}

impl<const N: usize> KdRecord<N> {
    pub const SIZE: usize = 4 * N + RECORD_TRAILER_SIZE;

    /// Appends the encoded record to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        for value in self.object.key {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&self.object.zoom_min.to_le_bytes());
        buf.extend_from_slice(&self.object.zoom_max.to_le_bytes());
        buf.extend_from_slice(&self.object.offset.to_le_bytes());
        let left = if self.left_present {
            LEFT_PRESENT
        } else {
            NONE_OFFSET
        };
        buf.extend_from_slice(&left.to_le_bytes());
        buf.extend_from_slice(&self.right_offset.unwrap_or(NONE_OFFSET).to_le_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        self.encode_into(&mut buf);
        buf
    }

    /// Decodes a record from the first [`Self::SIZE`] bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> IndexResult<Self> {
        if bytes.len() < Self::SIZE {
            return Err(IndexError::Corrupted(format!(
                "k-d record needs {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }

        let mut key = [0i32; N];
        for (d, value) in key.iter_mut().enumerate() {
            *value = i32::from_le_bytes(read_array(bytes, d * 4));
        }
        let base = N * 4;
        let zoom_min = u16::from_le_bytes(read_array(bytes, base));
        let zoom_max = u16::from_le_bytes(read_array(bytes, base + 2));
        let offset = u32::from_le_bytes(read_array(bytes, base + 4));
        let left = u32::from_le_bytes(read_array(bytes, base + 8));
        let right = u32::from_le_bytes(read_array(bytes, base + 12));

        let left_present = match left {
            LEFT_PRESENT => true,
            NONE_OFFSET => false,
            other => {
                return Err(IndexError::Corrupted(format!(
                    "invalid left flag {:#x}",
                    other
                )))
            }
        };
        let right_offset = match right {
            NONE_OFFSET => None,
            value if value as usize % Self::SIZE == 0 => Some(value),
            value => {
                return Err(IndexError::Corrupted(format!(
                    "right offset {} is not a multiple of the record size {}",
                    value,
                    Self::SIZE
                )))
            }
        };

        Ok(Self {
            object: KeyedObject::new(key, zoom_min, zoom_max, offset),
            left_present,
            right_offset,
        })
    }

    /// Number of records between this record and its right child.
    pub fn right_skip(&self) -> Option<usize> {
        self.right_offset.map(|bytes| bytes as usize / Self::SIZE)
    }

    pub fn is_leaf(&self) -> bool {
        !self.left_present && self.right_offset.is_none()
    }
}

fn read_array<const L: usize>(bytes: &[u8], at: usize) -> [u8; L] {
    let mut out = [0u8; L];
    out.copy_from_slice(&bytes[at..at + L]);
    out
}
