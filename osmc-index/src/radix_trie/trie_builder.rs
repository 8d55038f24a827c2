//! In-memory radix trie built by incremental insertion.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::trie_constants::{nibble, MAX_LEVEL, TREE_CHILDREN};
use super::trie_writer::write_trie;
use crate::coordinate::PayloadOffset;
use crate::errors::IndexResult;

/// A trie node. Which variant a node is follows from its level alone:
/// nodes at [`MAX_LEVEL`] are leaves, everything above is internal.
#[derive(Debug)]
pub enum TrieNode {
    Internal {
        children: [Option<Box<TrieNode>>; TREE_CHILDREN],
        /// Nodes in the subtree rooted here, this node included.
        node_count: u64,
    },
    Leaf {
        offsets: [Option<PayloadOffset>; TREE_CHILDREN],
    },
}

impl TrieNode {
    /// Creates an empty node for `level`.
    pub fn new_at(level: usize) -> Self {
        if level == MAX_LEVEL {
            TrieNode::Leaf {
                offsets: [None; TREE_CHILDREN],
            }
        } else {
            TrieNode::Internal {
                children: Default::default(),
                node_count: 1,
            }
        }
    }

    pub fn node_count(&self) -> u64 {
        match self {
            TrieNode::Internal { node_count, .. } => *node_count,
            TrieNode::Leaf { .. } => 1,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TrieNode::Leaf { .. })
    }

    // Returns how many nodes were created below (and including) this call's
    // children, and whether the id was new.
    fn insert_at(&mut self, id: u32, offset: PayloadOffset, level: usize) -> (u64, bool) {
        let i = nibble(id, level);
        match self {
            TrieNode::Leaf { offsets } => match offsets[i] {
                Some(_) => (0, false),
                None => {
                    offsets[i] = Some(offset);
                    (0, true)
                }
            },
            TrieNode::Internal {
                children,
                node_count,
            } => {
                let mut created = 0;
                let child = children[i].get_or_insert_with(|| {
                    created = 1;
                    Box::new(TrieNode::new_at(level + 1))
                });
                let (below, inserted) = child.insert_at(id, offset, level + 1);
                created += below;
                *node_count += created;
                (created, inserted)
            }
        }
    }
}

/// Base-16 trie from 32-bit ids to payload offsets.
///
/// Inserting an id that is already present keeps the first offset.
///
/// # Example
///
/// ```rust,ignore
/// use osmc_index::RadixTrie;
///
/// let mut trie = RadixTrie::new();
/// trie.insert(5, 100);
/// trie.insert(5, 999);
/// assert_eq!(trie.get(5), Some(100));
/// ```
#[derive(Debug)]
pub struct RadixTrie {
    root: TrieNode,
    len: usize,
}

impl Default for RadixTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixTrie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new_at(0),
            len: 0,
        }
    }

    /// Maps `id` to `offset` unless `id` is already mapped.
    /// Returns true when the mapping was added.
    pub fn insert(&mut self, id: u32, offset: PayloadOffset) -> bool {
        let (_, inserted) = self.root.insert_at(id, offset, 0);
        if inserted {
            self.len += 1;
        } else {
            log::debug!("Id {} is already indexed, keeping the first offset", id);
        }
        inserted
    }

    /// Offset stored for `id`.
    pub fn get(&self, id: u32) -> Option<PayloadOffset> {
        let mut node = &self.root;
        let mut level = 0;
        loop {
            let i = nibble(id, level);
            match node {
                TrieNode::Leaf { offsets } => return offsets[i],
                TrieNode::Internal { children, .. } => {
                    node = children[i].as_deref()?;
                    level += 1;
                }
            }
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, i.e. records the serialized trie will hold.
    pub fn node_count(&self) -> u64 {
        self.root.node_count()
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Serializes the trie; returns the number of bytes written.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> IndexResult<u64> {
        write_trie(self, sink)
    }

    /// Creates (or truncates) `path` and writes the trie into it.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> IndexResult<u64> {
        let path = path.as_ref();
        log::debug!("Writing id index to {:?}", path);
        let mut sink = BufWriter::new(File::create(path)?);
        let written = self.write_to(&mut sink)?;
        sink.flush()?;
        Ok(written)
    }
}

impl Extend<(u32, PayloadOffset)> for RadixTrie {
    fn extend<I: IntoIterator<Item = (u32, PayloadOffset)>>(&mut self, iter: I) {
        for (id, offset) in iter {
            self.insert(id, offset);
        }
    }
}

impl FromIterator<(u32, PayloadOffset)> for RadixTrie {
    fn from_iter<I: IntoIterator<Item = (u32, PayloadOffset)>>(iter: I) -> Self {
        let mut trie = RadixTrie::new();
        trie.extend(iter);
        trie
    }
}
