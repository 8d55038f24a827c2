use crate::coordinate::PayloadOffset;
use crate::errors::IndexResult;
use crate::radix_trie::{RadixTrie, TrieReader};

/// Exact-match lookup from object id to payload offset.
///
/// Implemented by the in-memory [`RadixTrie`] while an index is being built
/// and by the disk-backed [`TrieReader`] once it is written.
pub trait IdIndex: Send + Sync {
    /// Offset stored for `id`. `Ok(None)` means the id was never indexed;
    /// an error means the index itself could not be read.
    fn lookup(&self, id: u32) -> IndexResult<Option<PayloadOffset>>;

    fn contains_id(&self, id: u32) -> IndexResult<bool> {
        Ok(self.lookup(id)?.is_some())
    }

    /// Like [`lookup`](IdIndex::lookup) but folds read failures into "not
    /// found" after logging them.
    fn find_offset(&self, id: u32) -> Option<PayloadOffset> {
        match self.lookup(id) {
            Ok(offset) => offset,
            Err(err) => {
                log::warn!("Lookup of id {} failed: {}", id, err);
                None
            }
        }
    }
}

impl IdIndex for RadixTrie {
    fn lookup(&self, id: u32) -> IndexResult<Option<PayloadOffset>> {
        Ok(self.get(id))
    }
}

impl IdIndex for TrieReader {
    fn lookup(&self, id: u32) -> IndexResult<Option<PayloadOffset>> {
        TrieReader::lookup(self, id)
    }
}
