//! Disk access for serialized trie records.
//!
//! Records are read one at a time on demand; nothing beyond the front cache
//! is ever preloaded. Every read is one seek plus one read under the file
//! lock, so a shared reader never interleaves positioning and reading.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::trie_constants::{ABSENT, RECORD_SIZE, TREE_CHILDREN};
use crate::errors::{IndexError, IndexResult};

/// One trie node as stored on disk: 16 little-endian `i64` slots.
///
/// Internal records hold the absolute file offset of each child, leaf
/// records hold payload offsets. [`ABSENT`] marks an empty slot in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieRecord(pub [i64; TREE_CHILDREN]);

impl TrieRecord {
    pub fn empty() -> Self {
        TrieRecord([ABSENT; TREE_CHILDREN])
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        for (slot, value) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut values = [ABSENT; TREE_CHILDREN];
        for (value, slot) in values.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(slot);
            *value = i64::from_le_bytes(raw);
        }
        TrieRecord(values)
    }

    /// Slot value, `None` when the slot is [`ABSENT`].
    #[inline]
    pub fn slot(&self, index: usize) -> Option<i64> {
        match self.0[index] {
            ABSENT => None,
            value => Some(value),
        }
    }
}

/// Read-only handle on a serialized trie file.
pub struct TrieStorage {
    file: Mutex<File>,
    path: PathBuf,
    file_len: u64,
}

impl TrieStorage {
    /// Opens an existing trie file for reading.
    pub fn open(path: &Path) -> IndexResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            file_len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn record_count(&self) -> u64 {
        self.file_len / RECORD_SIZE as u64
    }

    /// Reads the record starting at byte `offset`.
    ///
    /// Offsets that are unaligned or point past the end of the file come
    /// from a damaged index and are reported as corruption.
    pub fn read_record(&self, offset: u64) -> IndexResult<TrieRecord> {
        if offset % RECORD_SIZE as u64 != 0 {
            return Err(IndexError::Corrupted(format!(
                "trie record offset {} is not aligned to {} bytes",
                offset, RECORD_SIZE
            )));
        }
        if offset + RECORD_SIZE as u64 > self.file_len {
            log::error!(
                "Trie record offset {} points past the end of {:?}",
                offset,
                self.path
            );
            return Err(IndexError::Corrupted(format!(
                "trie record offset {} is past the end of {:?} ({} bytes)",
                offset, self.path, self.file_len
            )));
        }

        let mut buffer = [0u8; RECORD_SIZE];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buffer)?;
        }
        Ok(TrieRecord::from_bytes(&buffer))
    }
}

impl std::fmt::Debug for TrieStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrieStorage")
            .field("path", &self.path)
            .field("file_len", &self.file_len)
            .finish()
    }
}
