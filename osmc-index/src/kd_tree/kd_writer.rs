//! Pre-order serialization of a k-d tree.

use std::io::Write;

use super::kd_builder::{KdNode, KdTree};
use super::kd_record::KdRecord;
use crate::errors::{IndexError, IndexResult};
use crate::keyed_object::KeyedObjects;

/// Writes the tree rooted at `root` into `sink` and returns the number of
/// bytes written (`node count * record size`). An absent root writes nothing.
///
/// Records are emitted node, left subtree, right subtree. The sink is not
/// flushed.
pub fn write_kd_tree<const N: usize, W: Write>(
    root: Option<&KdNode<N>>,
    sink: &mut W,
) -> IndexResult<u64> {
    let Some(root) = root else {
        return Ok(0);
    };

    // the largest right offset is (len - 1) records
    if root.len().saturating_mul(KdRecord::<N>::SIZE) > u32::MAX as usize {
        return Err(IndexError::InvalidOperation(format!(
            "{} records do not fit a 32-bit k-d index",
            root.len()
        )));
    }

    let mut scratch = Vec::with_capacity(KdRecord::<N>::SIZE);
    let mut written = 0u64;
    for node in root.preorder() {
        write_node(node, sink, &mut scratch)?;
        written += scratch.len() as u64;
    }
    log::info!(
        "Wrote {}-d index: {} records, {} bytes",
        N,
        root.len(),
        written
    );
    Ok(written)
}

// Emits the record of `node` alone; its children follow in pre-order.
fn write_node<const N: usize, W: Write>(
    node: &KdNode<N>,
    sink: &mut W,
    scratch: &mut Vec<u8>,
) -> IndexResult<()> {
    let left_len = node.left().map_or(0, KdNode::len);
    let right_offset = node
        .right()
        .map(|_| (left_len * KdRecord::<N>::SIZE) as u32);
    let record = KdRecord {
        object: *node.pivot(),
        left_present: node.left().is_some(),
        right_offset,
    };

    scratch.clear();
    record.encode_into(scratch);
    sink.write_all(scratch)?;
    Ok(())
}

/// Builds the index for one object class and writes it into `sink`.
///
/// The collector's objects are reordered by the build.
pub fn build_and_write<const N: usize, W: Write>(
    objects: &mut KeyedObjects<N>,
    sink: &mut W,
) -> IndexResult<u64> {
    let tree = KdTree::build(objects.as_mut_slice());
    tree.write_to(sink)
}
