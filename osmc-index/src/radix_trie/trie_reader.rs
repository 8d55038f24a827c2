//! Disk-backed id lookups over a serialized trie.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::trie_cache::{record_offset, FrontCache};
use super::trie_constants::{nibble, MAX_LEVEL, RECORD_SIZE};
use super::trie_storage::TrieStorage;
use crate::config::TrieReaderConfig;
use crate::coordinate::PayloadOffset;
use crate::errors::{IndexError, IndexResult};

/// Read-only id index over a trie file.
///
/// Opening reads the top levels of the trie into a [`FrontCache`]. After
/// that, a lookup either fails straight from the cache or continues on
/// disk with one record read per remaining level.
///
/// The reader is cheap to clone; clones share the file handle, the cache
/// and the statistics, and can be used from several threads at once.
#[derive(Clone)]
pub struct TrieReader {
    inner: Arc<TrieReaderInner>,
}

struct TrieReaderInner {
    storage: TrieStorage,
    cache: FrontCache,
    stats: ReaderStatistics,
    closed: RwLock<bool>,
}

struct ReaderStatistics {
    lookups: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    disk_reads: AtomicU64,
}

impl ReaderStatistics {
    fn new() -> Self {
        Self {
            lookups: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            disk_reads: AtomicU64::new(0),
        }
    }
}

/// Snapshot of a reader's counters.
///
/// A cache hit is a lookup routed to disk by a populated cache entry; a
/// cache miss is a lookup answered "absent" by the cache alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieReaderStats {
    pub lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub disk_reads: u64,
    pub cache_entries: u64,
}

impl TrieReader {
    /// Opens the trie at `path` with the default cache depth.
    pub fn open(path: impl AsRef<Path>) -> IndexResult<Self> {
        Self::open_with_config(path, TrieReaderConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: TrieReaderConfig) -> IndexResult<Self> {
        config.validate()?;
        let path = path.as_ref();
        log::debug!(
            "Opening id index {:?} with cache depth {}",
            path,
            config.cache_depth()
        );

        let storage = TrieStorage::open(path)?;
        if storage.file_len() == 0 || storage.file_len() % RECORD_SIZE as u64 != 0 {
            log::error!(
                "Id index {:?} has length {}, not a positive multiple of {}",
                path,
                storage.file_len(),
                RECORD_SIZE
            );
            return Err(IndexError::Corrupted(format!(
                "id index length {} is not a positive multiple of {}",
                storage.file_len(),
                RECORD_SIZE
            )));
        }
        let cache = FrontCache::build(&storage, config.cache_depth())?;

        Ok(Self {
            inner: Arc::new(TrieReaderInner {
                storage,
                cache,
                stats: ReaderStatistics::new(),
                closed: RwLock::new(false),
            }),
        })
    }

    fn check_closed(&self) -> IndexResult<()> {
        if *self.inner.closed.read() {
            Err(IndexError::Closed)
        } else {
            Ok(())
        }
    }

    /// Payload offset stored for `id`, `Ok(None)` when `id` was never
    /// indexed.
    pub fn lookup(&self, id: u32) -> IndexResult<Option<PayloadOffset>> {
        self.check_closed()?;
        let inner = &self.inner;
        inner.stats.lookups.fetch_add(1, Ordering::Relaxed);

        let Some(mut offset) = inner.cache.get(id)? else {
            inner.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };
        inner.stats.cache_hits.fetch_add(1, Ordering::Relaxed);

        for level in inner.cache.depth()..=MAX_LEVEL {
            let record = inner.storage.read_record(offset)?;
            inner.stats.disk_reads.fetch_add(1, Ordering::Relaxed);

            let Some(value) = record.slot(nibble(id, level)) else {
                return Ok(None);
            };
            if level == MAX_LEVEL {
                return PayloadOffset::try_from(value).map(Some).map_err(|_| {
                    log::error!("Id {} maps to invalid payload offset {}", id, value);
                    IndexError::Corrupted(format!("invalid payload offset {}", value))
                });
            }
            offset = record_offset(value)?;
        }
        // the loop always returns at MAX_LEVEL
        Ok(None)
    }

    pub fn contains(&self, id: u32) -> IndexResult<bool> {
        Ok(self.lookup(id)?.is_some())
    }

    pub fn cache_depth(&self) -> usize {
        self.inner.cache.depth()
    }

    pub fn path(&self) -> &Path {
        self.inner.storage.path()
    }

    /// Number of records in the file.
    pub fn record_count(&self) -> u64 {
        self.inner.storage.record_count()
    }

    pub fn stats(&self) -> TrieReaderStats {
        let stats = &self.inner.stats;
        TrieReaderStats {
            lookups: stats.lookups.load(Ordering::Relaxed),
            cache_hits: stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: stats.cache_misses.load(Ordering::Relaxed),
            disk_reads: stats.disk_reads.load(Ordering::Relaxed),
            cache_entries: self.inner.cache.len() as u64,
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.closed.read()
    }

    /// Closes the reader for every clone. Later lookups fail with
    /// [`IndexError::Closed`]; closing twice is a no-op.
    pub fn close(&self) -> IndexResult<()> {
        let mut closed = self.inner.closed.write();
        if !*closed {
            log::debug!("Closing id index {:?}", self.path());
            *closed = true;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TrieReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrieReader")
            .field("path", &self.path())
            .field("cache_depth", &self.cache_depth())
            .field("closed", &self.is_closed())
            .finish()
    }
}
