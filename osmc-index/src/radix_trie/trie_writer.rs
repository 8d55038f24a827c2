//! Pre-order serialization of a [`RadixTrie`].
//!
//! The root is written at offset 0. Each internal record stores absolute
//! file offsets of its children; leaf records store payload offsets.

use std::io::Write;

use super::trie_builder::{RadixTrie, TrieNode};
use super::trie_constants::{RECORD_SIZE, TREE_CHILDREN};
use super::trie_storage::TrieRecord;
use crate::errors::{IndexError, IndexResult};

/// Writes `trie` into `sink` and returns the number of bytes written.
///
/// An empty trie still produces its root record, so every trie file holds
/// at least one record.
pub fn write_trie<W: Write>(trie: &RadixTrie, sink: &mut W) -> IndexResult<u64> {
    let node_count = trie.node_count();
    let total = node_count
        .checked_mul(RECORD_SIZE as u64)
        .filter(|bytes| *bytes <= i64::MAX as u64)
        .ok_or_else(|| {
            IndexError::InvalidOperation(format!("{} trie nodes overflow the file", node_count))
        })?;

    let written = write_node(trie.root(), 0, sink)?;
    debug_assert_eq!(written, total);
    log::info!(
        "Wrote id index: {} ids, {} records, {} bytes",
        trie.len(),
        node_count,
        written
    );
    Ok(written)
}

fn write_node<W: Write>(node: &TrieNode, position: u64, sink: &mut W) -> IndexResult<u64> {
    let mut record = TrieRecord::empty();
    match node {
        TrieNode::Leaf { offsets } => {
            for (slot, offset) in record.0.iter_mut().zip(offsets.iter()) {
                if let Some(offset) = offset {
                    *slot = i64::from(*offset);
                }
            }
            sink.write_all(&record.to_bytes())?;
            Ok(RECORD_SIZE as u64)
        }
        TrieNode::Internal { children, .. } => {
            let mut positions = [0u64; TREE_CHILDREN];
            let mut next = position + RECORD_SIZE as u64;
            for (i, child) in children.iter().enumerate() {
                if let Some(child) = child {
                    positions[i] = next;
                    record.0[i] = next as i64;
                    next += child.node_count() * RECORD_SIZE as u64;
                }
            }
            sink.write_all(&record.to_bytes())?;

            let mut written = RECORD_SIZE as u64;
            for (i, child) in children.iter().enumerate() {
                if let Some(child) = child {
                    written += write_node(child, positions[i], sink)?;
                }
            }
            Ok(written)
        }
    }
}
