//! Read-back of serialized k-d indexes.
//!
//! The file is mapped read-only and walked with the same rule the writer
//! used: the left child of record `i` is record `i + 1`, the right child is
//! record `i + 1 + right_offset / SIZE`, and the split dimension of a record
//! is its depth modulo `N`.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::kd_builder::{KdNode, KdTree};
use super::kd_record::KdRecord;
use crate::coordinate::ZoomLevel;
use crate::errors::{IndexError, IndexResult};
use crate::keyed_object::{KeyRange, KeyedObject};

enum KdData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl KdData {
    fn bytes(&self) -> &[u8] {
        match self {
            KdData::Mapped(map) => &map[..],
            KdData::Owned(bytes) => &bytes[..],
        }
    }
}

/// Read-only view of a k-d index file.
pub struct KdIndexReader<const N: usize> {
    data: KdData,
    len: usize,
    path: Option<PathBuf>,
}

impl<const N: usize> std::fmt::Debug for KdIndexReader<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdIndexReader")
            .field("dimensions", &N)
            .field("len", &self.len)
            .field("path", &self.path)
            .finish()
    }
}

impl<const N: usize> KdIndexReader<N> {
    /// Maps an index file written by [`KdTree::write_to_path`].
    pub fn open(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        log::debug!("Opening {}-d index at {:?}", N, path);
        let file = File::open(path)?;
        let data = if file.metadata()?.len() == 0 {
            KdData::Owned(Vec::new())
        } else {
            // SAFETY: the index is written once and only read afterwards; the
            // mapping is private and read-only.
            KdData::Mapped(unsafe { Mmap::map(&file)? })
        };
        let mut reader = Self::with_data(data)?;
        reader.path = Some(path.to_path_buf());
        Ok(reader)
    }

    /// Reads an index held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> IndexResult<Self> {
        Self::with_data(KdData::Owned(bytes))
    }

    fn with_data(data: KdData) -> IndexResult<Self> {
        let size = data.bytes().len();
        if size % KdRecord::<N>::SIZE != 0 {
            log::error!(
                "k-d index of {} bytes is not a whole number of {} byte records",
                size,
                KdRecord::<N>::SIZE
            );
            return Err(IndexError::Corrupted(format!(
                "{} bytes is not a multiple of the record size {}",
                size,
                KdRecord::<N>::SIZE
            )));
        }
        Ok(Self {
            data,
            len: size / KdRecord::<N>::SIZE,
            path: None,
        })
    }

    /// Number of records, i.e. indexed objects.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Decodes record `index` in file order.
    pub fn record(&self, index: usize) -> IndexResult<KdRecord<N>> {
        if index >= self.len {
            return Err(IndexError::InvalidOperation(format!(
                "record {} out of range (index has {} records)",
                index, self.len
            )));
        }
        let start = index * KdRecord::<N>::SIZE;
        KdRecord::decode(&self.data.bytes()[start..start + KdRecord::<N>::SIZE])
    }

    /// The root record, or `None` for an empty index.
    pub fn root(&self) -> IndexResult<Option<KdRecord<N>>> {
        if self.is_empty() {
            Ok(None)
        } else {
            self.record(0).map(Some)
        }
    }

    // Resolves the children of the record at `index`, checking they stay in
    // the file.
    fn children(
        &self,
        index: usize,
        record: &KdRecord<N>,
    ) -> IndexResult<(Option<usize>, Option<usize>)> {
        let left = record.left_present.then_some(index + 1);
        let right = record.right_skip().map(|skip| index + 1 + skip);
        for child in left.iter().chain(right.iter()) {
            if *child >= self.len {
                log::error!("k-d record {} points past the end of the index", index);
                return Err(IndexError::Corrupted(format!(
                    "record {} has a child at {} beyond {} records",
                    index, child, self.len
                )));
            }
        }
        Ok((left, right))
    }

    /// Rebuilds the in-memory tree from the file.
    ///
    /// Works bottom-up over the records instead of recursing, so a deep but
    /// well-formed file is rebuilt like any other.
    pub fn to_tree(&self) -> IndexResult<KdTree<N>> {
        if self.is_empty() {
            return Ok(KdTree::from_root(None));
        }

        let mut links = Vec::with_capacity(self.len);
        for index in 0..self.len {
            let record = self.record(index)?;
            let (left, right) = self.children(index, &record)?;
            links.push((record.object, left, right));
        }

        // Children always come after their parent, so a backward pass sees
        // every subtree before the record that owns it. `ends[i]` is the
        // index just past the subtree rooted at `i`.
        let mut ends = vec![0usize; self.len];
        for index in (0..self.len).rev() {
            let (_, left, right) = links[index];
            let left_end = left.map_or(index + 1, |at| ends[at]);
            ends[index] = match right {
                Some(at) if at != left_end => {
                    log::error!("k-d record {} has a misplaced right child", index);
                    return Err(IndexError::Corrupted(format!(
                        "record {} expects its right child at {}, left subtree ends at {}",
                        index, at, left_end
                    )));
                }
                Some(at) => ends[at],
                None => left_end,
            };
        }
        if ends[0] != self.len {
            return Err(IndexError::Corrupted(format!(
                "tree covers {} of {} records",
                ends[0], self.len
            )));
        }

        // every record now has exactly one parent
        let mut levels = vec![0usize; self.len];
        for index in 0..self.len {
            let (_, left, right) = links[index];
            for child in left.into_iter().chain(right) {
                levels[child] = levels[index] + 1;
            }
        }

        let mut nodes: Vec<Option<Box<KdNode<N>>>> = Vec::new();
        nodes.resize_with(self.len, || None);
        for index in (0..self.len).rev() {
            let (object, left, right) = links[index];
            let left = left.and_then(|at| nodes[at].take());
            let right = right.and_then(|at| nodes[at].take());
            let node = KdNode::new(levels[index] % N, object, left, right);
            nodes[index] = Some(Box::new(node));
        }
        Ok(KdTree::from_root(nodes[0].take()))
    }

    /// Collects every object whose key lies in `range` and, if `zoom` is
    /// given, is visible at that zoom level.
    ///
    /// Subtrees are skipped when the split rule proves they cannot hold a
    /// match: the left side only has keys `<= pivot[d]` and the right side
    /// only keys `>= pivot[d]`.
    pub fn query(
        &self,
        range: &KeyRange<N>,
        zoom: Option<ZoomLevel>,
    ) -> IndexResult<Vec<KeyedObject<N>>> {
        let mut found = Vec::new();
        if self.is_empty() {
            return Ok(found);
        }

        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, level)) = stack.pop() {
            let record = self.record(index)?;
            let object = record.object;
            if range.contains(&object.key) && zoom.map_or(true, |z| object.is_visible_at(z)) {
                found.push(object);
            }

            let d = level % N;
            let split = object.key[d];
            let (left, right) = self.children(index, &record)?;
            if let Some(right) = right {
                if range.hi[d] >= split {
                    stack.push((right, level + 1));
                }
            }
            if let Some(left) = left {
                if range.lo[d] <= split {
                    stack.push((left, level + 1));
                }
            }
        }
        Ok(found)
    }

    /// Payload offsets of the objects matched by [`Self::query`].
    pub fn query_offsets(
        &self,
        range: &KeyRange<N>,
        zoom: Option<ZoomLevel>,
    ) -> IndexResult<Vec<u32>> {
        Ok(self
            .query(range, zoom)?
            .into_iter()
            .map(|object| object.offset)
            .collect())
    }
}
