use serde::{Deserialize, Serialize};

use crate::errors::{IndexError, IndexResult};
use crate::radix_trie::{DEFAULT_CACHE_DEPTH, MAX_CACHE_DEPTH};

/// Settings for opening an id index with [`TrieReader`](crate::TrieReader).
///
/// The only tunable is the depth of the front cache: the number of trie
/// levels held in memory. A depth of `d` costs `16^d * 8` bytes and saves
/// `d` disk reads on every lookup.
///
/// Usage: create via `TrieReaderConfig::builder()`, set the depth, then pass
/// the result to `TrieReader::open_with_config` or
/// `IndexSetReader::open_with_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieReaderConfig {
    cache_depth: usize,
}

impl Default for TrieReaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieReaderConfig {
    /// Creates a configuration with the default cache depth of
    /// [`DEFAULT_CACHE_DEPTH`] levels.
    #[inline]
    pub fn new() -> TrieReaderConfig {
        TrieReaderConfig {
            cache_depth: DEFAULT_CACHE_DEPTH,
        }
    }

    #[inline]
    pub fn builder() -> TrieReaderConfigBuilder {
        TrieReaderConfigBuilder {
            config: TrieReaderConfig::new(),
        }
    }

    /// A configuration that keeps no trie levels in memory.
    #[inline]
    pub fn without_cache() -> TrieReaderConfig {
        TrieReaderConfig { cache_depth: 0 }
    }

    #[inline]
    pub fn cache_depth(&self) -> usize {
        self.cache_depth
    }

    /// Number of front cache entries this configuration allocates.
    pub fn cache_entries(&self) -> usize {
        1usize << (4 * self.cache_depth)
    }

    /// Checks the depth against [`MAX_CACHE_DEPTH`].
    pub fn validate(&self) -> IndexResult<()> {
        if self.cache_depth > MAX_CACHE_DEPTH {
            return Err(IndexError::InvalidOperation(format!(
                "cache depth {} is out of range 0..={}",
                self.cache_depth, MAX_CACHE_DEPTH
            )));
        }
        Ok(())
    }
}

/// Builder for [`TrieReaderConfig`].
#[derive(Debug, Clone)]
pub struct TrieReaderConfigBuilder {
    config: TrieReaderConfig,
}

impl TrieReaderConfigBuilder {
    #[inline]
    pub fn cache_depth(mut self, depth: usize) -> Self {
        self.config.cache_depth = depth;
        self
    }

    /// Finishes the configuration. The depth is validated when a reader is
    /// opened with it.
    #[inline]
    pub fn build(self) -> TrieReaderConfig {
        self.config
    }
}
