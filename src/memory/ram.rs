//! Main memory, the backing store of the hierarchy

use super::stats::AccessStats;
use super::{get_offset, get_tag, Block, StorageInterface, Tick, Word};
use super::WORDS_PER_BLOCK;
use crate::error::{MemoryError, SimulatorResult};

/// Flat array of blocks, where the block at index i has tag i.
/// Never evicts and never misses.
pub struct BackingStore {
    blocks: Vec<Block>,
}

impl BackingStore {
    /// Make a zero-filled store of `capacity` blocks
    pub fn make(capacity: usize) -> Self {
        Self {
            blocks: (0..capacity).map(Block::make).collect(),
        }
    }

    /// Set word `offset` of block `tag` to `f(tag, offset)` for every word
    pub fn fill(&mut self, mut f: impl FnMut(usize, usize) -> Word) {
        for block in self.blocks.iter_mut() {
            for (offset, word) in block.words.iter_mut().enumerate() {
                *word = f(block.tag, offset);
            }
        }
    }

    /// Number of blocks in the store
    pub fn capacity(&self) -> usize {
        self.blocks.len()
    }

    /// Read the block with the given tag
    pub fn read_block(&self, tag: usize) -> SimulatorResult<Block> {
        self.blocks.get(tag).copied().ok_or_else(|| {
            MemoryError::TagOutOfRange {
                tag,
                capacity: self.capacity(),
            }
            .into()
        })
    }
}

/// Uncached access, served straight from the store
impl StorageInterface for BackingStore {
    fn read(
        &mut self,
        address: usize,
        _: Tick,
        _: &mut AccessStats,
    ) -> SimulatorResult<Word> {
        if address >= self.max_address() {
            return Err(MemoryError::AddressOutOfBounds {
                address,
                max_address: self.max_address(),
            }
            .into());
        }
        Ok(self.read_block(get_tag(address))?.words[get_offset(address)])
    }

    fn max_address(&self) -> usize {
        self.capacity() * WORDS_PER_BLOCK
    }
}
