//! Memory structure

pub mod cache;
pub mod inclusive;
pub mod ram;
pub mod stats;

use crate::error::SimulatorResult;
use stats::AccessStats;

/// Number of words in a block (and in a cache line)
pub const WORDS_PER_BLOCK: usize = 4;

/// Number of cache levels in the hierarchy
pub const LEVEL_COUNT: usize = 3;

pub type Word = i32;

/// Logical time, i.e. the index of the access being resolved
pub type Tick = u64;

/// The block tag of an address
pub fn get_tag(address: usize) -> usize {
    address / WORDS_PER_BLOCK
}

/// The word offset of an address within its block
pub fn get_offset(address: usize) -> usize {
    address % WORDS_PER_BLOCK
}

/// A memory block, or a line when resident in a cache
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub words: [Word; WORDS_PER_BLOCK],
    pub tag: usize,

    /// Number of references while resident in a cache level.
    /// Kept for inspection; replacement never reads it.
    pub access_count: u32,
    /// Most recent reference while resident in a cache level
    pub last_access_time: Tick,
}

impl Block {
    pub fn make(tag: usize) -> Self {
        Self {
            words: [0; WORDS_PER_BLOCK],
            tag,
            access_count: 0,
            last_access_time: 0,
        }
    }

    /// Record a reference at time `now`
    pub fn touch(&mut self, now: Tick) {
        self.access_count += 1;
        self.last_access_time = now;
    }
}

/// Memory interface implementation
pub trait StorageInterface {
    /// Read the word at `address` at logical time `now`,
    /// recording per-level outcomes into `stats`
    fn read(
        &mut self,
        address: usize,
        now: Tick,
        stats: &mut AccessStats,
    ) -> SimulatorResult<Word>;

    /// Exclusive upper bound of valid addresses
    fn max_address(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_split() {
        assert_eq!(get_tag(0), 0);
        assert_eq!(get_offset(0), 0);
        assert_eq!(get_tag(13), 3);
        assert_eq!(get_offset(13), 1);
        for address in 0..64 {
            assert_eq!(
                get_tag(address) * WORDS_PER_BLOCK + get_offset(address),
                address
            );
        }
    }

    #[test]
    fn test_touch() {
        let mut block = Block::make(7);
        assert_eq!(block.access_count, 0);
        block.touch(5);
        block.touch(9);
        assert_eq!(block.access_count, 2);
        assert_eq!(block.last_access_time, 9);
        assert_eq!(block.tag, 7);
    }
}
