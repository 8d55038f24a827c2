//! Flat in-memory copy of the top trie levels.

use super::trie_constants::{ABSENT, BITS_PER_LEVEL, MAX_CACHE_DEPTH, TREE_CHILDREN};
use super::trie_storage::TrieStorage;
use crate::errors::{IndexError, IndexResult};

/// Offsets of every trie record at level `depth`, indexed by the low
/// `4 * depth` bits of the ids routed through them.
///
/// With depth 0 the cache holds the root offset alone and every lookup
/// starts from the root.
#[derive(Debug, Clone)]
pub struct FrontCache {
    depth: usize,
    mask: u64,
    entries: Vec<i64>,
}

impl FrontCache {
    /// Walks the first `depth` levels of the trie in `storage`, one level at
    /// a time.
    pub fn build(storage: &TrieStorage, depth: usize) -> IndexResult<Self> {
        if depth > MAX_CACHE_DEPTH {
            return Err(IndexError::InvalidOperation(format!(
                "cache depth {} exceeds the maximum of {}",
                depth, MAX_CACHE_DEPTH
            )));
        }

        let mut entries: Vec<i64> = vec![0];
        for level in 0..depth {
            let shift = BITS_PER_LEVEL as usize * level;
            let mut next = vec![ABSENT; entries.len() * TREE_CHILDREN];
            for (prefix, &offset) in entries.iter().enumerate() {
                if offset == ABSENT {
                    continue;
                }
                let record = storage.read_record(record_offset(offset)?)?;
                for nibble in 0..TREE_CHILDREN {
                    if let Some(child) = record.slot(nibble) {
                        next[prefix | (nibble << shift)] = child;
                    }
                }
            }
            entries = next;
        }

        let cache = Self {
            depth,
            mask: (1u64 << (BITS_PER_LEVEL as usize * depth)) - 1,
            entries,
        };
        log::debug!(
            "Built id index front cache: depth {}, {} of {} entries populated",
            depth,
            cache.populated(),
            cache.len()
        );
        Ok(cache)
    }

    /// File offset of the record continuing the lookup of `id`, or `None`
    /// when no stored id shares its low bits.
    #[inline]
    pub fn get(&self, id: u32) -> IndexResult<Option<u64>> {
        match self.entries[(u64::from(id) & self.mask) as usize] {
            ABSENT => Ok(None),
            offset => record_offset(offset).map(Some),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn populated(&self) -> usize {
        self.entries.iter().filter(|offset| **offset != ABSENT).count()
    }

    pub fn memory_bytes(&self) -> usize {
        self.entries.len() * std::mem::size_of::<i64>()
    }
}

/// Converts a stored child offset into a file position.
pub(crate) fn record_offset(value: i64) -> IndexResult<u64> {
    u64::try_from(value)
        .map_err(|_| IndexError::Corrupted(format!("invalid trie child offset {}", value)))
}
