//! Cache implementation

use super::{Block, Tick};

/// A fully-associative cache level with LRU replacement
pub struct CacheLevel {
    /// Empty slots are `None`
    slots: Vec<Option<Block>>,
}

impl CacheLevel {
    pub fn make(capacity: usize) -> Self {
        assert!(capacity > 0, "A cache level needs at least one slot");
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Make a level holding exactly the given slots
    #[cfg(test)]
    pub(crate) fn from_slots(slots: Vec<Option<Block>>) -> Self {
        assert!(!slots.is_empty());
        Self { slots }
    }

    /// Return the number of slots of this level
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Return the number of occupied slots
    pub fn occupancy(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Return the block in slot `i`, if any
    pub fn get(&self, i: usize) -> Option<&Block> {
        self.slots.get(i).and_then(Option::as_ref)
    }

    /// Find the slot holding `tag` without touching it
    pub fn find(&self, tag: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(block) if block.tag == tag))
    }

    pub fn is_in_cache(&self, tag: usize) -> bool {
        self.find(tag).is_some()
    }

    /// Look up `tag` and, on a match, mark the slot as referenced at `now`
    pub fn lookup(&mut self, tag: usize, now: Tick) -> Option<usize> {
        let index = self.find(tag)?;
        if let Some(block) = &mut self.slots[index] {
            block.touch(now);
        }
        Some(index)
    }

    /// Empty slots go first; otherwise the least recent reference,
    /// the lowest index winning ties
    pub fn get_index_to_replace(&self) -> usize {
        let mut result = 0;
        let mut min_ref = Tick::MAX;
        for (i, slot) in self.slots.iter().enumerate() {
            match slot {
                // If it's empty, replace it immediately
                None => return i,
                Some(block) if block.last_access_time < min_ref => {
                    min_ref = block.last_access_time;
                    result = i;
                }
                Some(_) => {}
            }
        }
        result
    }

    /// Overwrite the LRU slot with `block`, referenced at `now`.
    /// The reference count restarts for the new residency.
    /// Returns the index of the written slot
    pub fn replace_lru(&mut self, block: Block, now: Tick) -> usize {
        let index_to_replace = self.get_index_to_replace();
        let mut block = block;
        block.access_count = 0;
        block.touch(now);
        // The evicted block is simply dropped: nothing is ever dirty
        self.slots[index_to_replace] = Some(block);
        index_to_replace
    }

    /// Return the tag of a block held in two slots, if any
    pub fn find_duplicate(&self) -> Option<usize> {
        let mut tags: Vec<usize> =
            self.slots.iter().flatten().map(|block| block.tag).collect();
        tags.sort_unstable();
        tags.windows(2).find(|pair| pair[0] == pair[1]).map(|pair| pair[0])
    }
}

/// Hit and miss counters of one cache level
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CacheHistory {
    pub num_hit: u64,
    pub num_miss: u64,
}

impl CacheHistory {
    pub fn record_hit(&mut self) {
        self.num_hit += 1;
    }

    pub fn record_miss(&mut self) {
        self.num_miss += 1;
    }

    /// Number of lookups at this level
    pub fn num_access(&self) -> u64 {
        self.num_hit + self.num_miss
    }

    /// Computes the current miss rate, 0 if never accessed
    pub fn get_miss_rate(&self) -> f64 {
        if self.num_access() == 0 {
            return 0.;
        }
        self.num_miss as f64 / self.num_access() as f64
    }

    /// Computes the current hit rate, 0 if never accessed
    pub fn get_hit_rate(&self) -> f64 {
        if self.num_access() == 0 {
            return 0.;
        }
        self.num_hit as f64 / self.num_access() as f64
    }
}
