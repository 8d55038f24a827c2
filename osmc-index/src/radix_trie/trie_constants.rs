//! Constants for the radix trie and its file format.

/// Children per node.
pub const TREE_CHILDREN: usize = 16;

/// Bits of the id consumed per level.
pub const BITS_PER_LEVEL: u32 = 4;

/// Mask selecting one nibble.
pub const NIBBLE_MASK: u64 = 0xF;

/// Level of the nodes holding payload offsets. Levels `0..MAX_LEVEL` are
/// internal, so a path from the root visits `MAX_LEVEL + 1` records.
pub const MAX_LEVEL: usize = 9;

/// Width of one record: 16 little-endian `i64` values.
pub const RECORD_SIZE: usize = TREE_CHILDREN * 8;

/// Value stored for an absent child or payload.
pub const ABSENT: i64 = -1;

/// Levels resolved from memory by a reader unless configured otherwise.
/// Depth 4 gives 65 536 cache entries.
pub const DEFAULT_CACHE_DEPTH: usize = 4;

/// Deepest front cache a reader accepts (16^6 entries).
pub const MAX_CACHE_DEPTH: usize = 6;

/// Nibble of `id` used at `level`.
#[inline]
pub fn nibble(id: u32, level: usize) -> usize {
    ((u64::from(id) >> (BITS_PER_LEVEL as usize * level)) & NIBBLE_MASK) as usize
}
