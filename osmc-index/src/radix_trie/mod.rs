//! Base-16 radix trie mapping 32-bit ids to payload offsets.
//!
//! This module provides the id index of a compiled map:
//! - An in-memory builder fed one `(id, offset)` pair at a time
//! - A serializer writing one fixed-size record per trie node
//! - A disk reader that keeps the top levels in a flat front cache and
//!   answers lookups with a bounded number of seeks
//!
//! An id is consumed one nibble per level, least significant nibble first.
//! Levels `0..MAX_LEVEL` hold child records; level `MAX_LEVEL` holds the
//! payload offsets themselves.

pub mod trie_constants;
mod trie_builder;
mod trie_writer;
mod trie_storage;
mod trie_cache;
mod trie_reader;

pub use trie_builder::{RadixTrie, TrieNode};
pub use trie_cache::FrontCache;
pub use trie_constants::{DEFAULT_CACHE_DEPTH, MAX_CACHE_DEPTH, MAX_LEVEL, RECORD_SIZE};
pub use trie_reader::{TrieReader, TrieReaderStats};
pub use trie_storage::{TrieRecord, TrieStorage};
pub use trie_writer::write_trie;
