//! Inclusive cache implementation

use tracing::debug;

use super::cache::CacheLevel;
use super::ram::BackingStore;
use super::stats::AccessStats;
use super::{get_offset, get_tag, Block, StorageInterface, Tick, Word};
use super::{LEVEL_COUNT, WORDS_PER_BLOCK};
use crate::error::MemoryError;
use crate::error::{SimulatorError, SimulatorResult};

/// Inclusive cache implementation.
/// We maintain 3 cache levels (L1 first) in front of the backing store.
/// Whatever level serves an access, the block is copied
/// into every faster level on the way back.
pub struct InclusiveCache {
    pub caches: [CacheLevel; LEVEL_COUNT],
    pub ram: BackingStore,
}

impl InclusiveCache {
    /// Create an inclusive cache from the capacity of each level
    /// (in lines) and the backing store.
    /// Every level and the store must hold at least one block
    pub fn make(
        capacities: [usize; LEVEL_COUNT],
        ram: BackingStore,
    ) -> SimulatorResult<Self> {
        if let Some(k) = capacities.iter().position(|&capacity| capacity == 0) {
            return Err(SimulatorError::ConfigError(format!(
                "L{} capacity must be positive",
                k + 1
            )));
        }
        if ram.capacity() == 0 {
            return Err(SimulatorError::ConfigError(
                "RAM capacity must be positive".to_string(),
            ));
        }
        Ok(Self {
            caches: capacities.map(CacheLevel::make),
            ram,
        })
    }

    /// Copy `block` into levels k - 1 down to L1
    fn promote(&mut self, k: usize, block: Block, now: Tick) {
        for cache in self.caches[..k].iter_mut().rev() {
            cache.replace_lru(block, now);
        }
    }

    /// Check that no level holds the same block twice
    pub fn verify_uniqueness(&self) -> SimulatorResult<()> {
        for (k, cache) in self.caches.iter().enumerate() {
            if let Some(tag) = cache.find_duplicate() {
                return Err(MemoryError::CacheInconsistency(
                    k + 1,
                    format!("Block {} is held in more than one slot", tag),
                )
                .into());
            }
        }
        Ok(())
    }

    /// Check that the block `tag` sits in L1, referenced at `now`
    pub fn verify_inclusion(&self, tag: usize, now: Tick) -> SimulatorResult<()> {
        let l1 = &self.caches[0];
        match l1.find(tag).and_then(|i| l1.get(i)) {
            Some(block) if block.last_access_time == now => Ok(()),
            Some(block) => Err(MemoryError::CacheInconsistency(
                1,
                format!(
                    "Block {} was last referenced at {}, expected {}",
                    tag, block.last_access_time, now
                ),
            )
            .into()),
            None => Err(MemoryError::CacheInconsistency(
                1,
                format!("Block {} is missing after being referenced", tag),
            )
            .into()),
        }
    }
}

impl StorageInterface for InclusiveCache {
    fn read(
        &mut self,
        address: usize,
        now: Tick,
        stats: &mut AccessStats,
    ) -> SimulatorResult<Word> {
        // Reject before touching any level
        if address >= self.max_address() {
            return Err(MemoryError::AddressOutOfBounds {
                address,
                max_address: self.max_address(),
            }
            .into());
        }
        let tag = get_tag(address);
        let offset = get_offset(address);

        for k in 0..LEVEL_COUNT {
            let hit = self.caches[k]
                .lookup(tag, now)
                .and_then(|hit_index| self.caches[k].get(hit_index).copied());
            if let Some(block) = hit {
                // A hit at this level
                stats.record_hit(k);
                debug!(address, tag, now, "hit at L{}", k + 1);

                self.promote(k, block, now);
                return Ok(block.words[offset]);
            }
            // A miss at this level
            stats.record_miss(k);
        }

        // Missed everywhere: fetch from the backing store
        debug!(address, tag, now, "served by main memory");
        let block = self.ram.read_block(tag)?;
        self.promote(LEVEL_COUNT, block, now);
        Ok(block.words[offset])
    }

    fn max_address(&self) -> usize {
        self.ram.capacity() * WORDS_PER_BLOCK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(capacities: [usize; LEVEL_COUNT], ram_capacity: usize) -> InclusiveCache {
        let mut ram = BackingStore::make(ram_capacity);
        ram.fill(|tag, offset| (tag * WORDS_PER_BLOCK + offset) as Word * 3 + 1);
        InclusiveCache::make(capacities, ram).unwrap()
    }

    fn address_of(tag: usize) -> usize {
        tag * WORDS_PER_BLOCK
    }

    fn counts(stats: &AccessStats) -> [(u64, u64); LEVEL_COUNT] {
        [0, 1, 2].map(|k| (stats.hits(k), stats.misses(k)))
    }

    #[test]
    fn test_cold_miss() {
        let mut mem = make([16, 32, 64], 1024);
        let mut stats = AccessStats::default();

        let value = mem.read(0, 0, &mut stats).unwrap();
        assert_eq!(value, mem.ram.read_block(0).unwrap().words[0]);
        assert_eq!(counts(&stats), [(0, 1), (0, 1), (0, 1)]);
        // The block now sits in every level
        for cache in mem.caches.iter() {
            assert!(cache.is_in_cache(0));
        }
    }

    #[test]
    fn test_repeated_access() {
        let mut mem = make([16, 32, 64], 1024);
        let mut stats = AccessStats::default();
        let n = 25;
        for now in 0..n {
            mem.read(42, now, &mut stats).unwrap();
        }
        assert_eq!(counts(&stats), [(n - 1, 1), (0, 1), (0, 1)]);
    }

    #[test]
    fn test_small_sequence() {
        let mut mem = make([2, 4, 8], 16);
        let mut stats = AccessStats::default();
        for (now, tag) in [0, 1, 0, 2, 1].into_iter().enumerate() {
            mem.read(address_of(tag), now as Tick, &mut stats).unwrap();
            mem.verify_inclusion(tag, now as Tick).unwrap();
        }
        // Tag 0 hits in L1 at time 2; tag 2 at time 3 evicts tag 1 from L1,
        // which then hits in L2 at time 4
        assert_eq!(counts(&stats), [(1, 4), (1, 3), (0, 3)]);
        assert!(mem.caches[0].is_in_cache(1));
        assert!(mem.caches[0].is_in_cache(2));
        assert!(!mem.caches[0].is_in_cache(0));
    }

    #[test]
    fn test_l2_hit_promotes_to_l1() {
        let mut mem = make([1, 4, 8], 16);
        let mut stats = AccessStats::default();
        mem.read(address_of(3), 0, &mut stats).unwrap();
        mem.read(address_of(5), 1, &mut stats).unwrap();
        // L1 only holds tag 5 now
        assert!(!mem.caches[0].is_in_cache(3));

        let value = mem.read(address_of(3) + 2, 2, &mut stats).unwrap();
        assert_eq!(value, mem.ram.read_block(3).unwrap().words[2]);
        assert_eq!(stats.hits(1), 1);
        assert_eq!(stats.misses(2), 2);
        assert!(mem.caches[0].is_in_cache(3));
        mem.verify_inclusion(3, 2).unwrap();
    }

    #[test]
    fn test_l3_hit_promotes_to_l2_and_l1() {
        let mut mem = make([1, 1, 8], 16);
        let mut stats = AccessStats::default();
        mem.read(address_of(3), 0, &mut stats).unwrap();
        mem.read(address_of(5), 1, &mut stats).unwrap();

        mem.read(address_of(3), 2, &mut stats).unwrap();
        assert_eq!(counts(&stats), [(0, 3), (0, 3), (1, 2)]);
        assert!(mem.caches[0].is_in_cache(3));
        assert!(mem.caches[1].is_in_cache(3));
        // The L3 copy was referenced as well
        let l3 = &mem.caches[2];
        let block = l3.get(l3.find(3).unwrap()).unwrap();
        assert_eq!(block.last_access_time, 2);
    }

    #[test]
    fn test_values_match_backing_store() {
        let mut mem = make([2, 3, 5], 32);
        let mut ram = make([1, 1, 1], 32).ram;
        let mut stats = AccessStats::default();
        let mut uncached = AccessStats::default();
        for now in 0..500 {
            let address = (now as usize * 37 + 11) % mem.max_address();
            assert_eq!(
                mem.read(address, now, &mut stats).unwrap(),
                ram.read(address, now, &mut uncached).unwrap()
            );
        }
    }

    #[test]
    fn test_invariants_hold() {
        let mut mem = make([4, 8, 16], 64);
        let mut stats = AccessStats::default();
        let mut seed: usize = 17;
        for now in 0..2000 {
            // Cheap LCG keeps the stream reproducible
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345) % (1 << 31);
            let address = seed % mem.max_address();
            mem.read(address, now, &mut stats).unwrap();
            mem.verify_inclusion(get_tag(address), now).unwrap();
            mem.verify_uniqueness().unwrap();
        }
        stats.verify_funnel(2000).unwrap();
    }

    #[test]
    fn test_deterministic_replay() {
        let addresses: Vec<usize> =
            (0..300).map(|i| (i * i * 7 + i * 3) % 256).collect();
        let run = || {
            let mut mem = make([4, 8, 16], 64);
            let mut stats = AccessStats::default();
            for (now, address) in addresses.iter().enumerate() {
                mem.read(*address, now as Tick, &mut stats).unwrap();
            }
            stats
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_out_of_bounds() {
        let mut mem = make([2, 4, 8], 16);
        let mut stats = AccessStats::default();
        assert!(mem.read(63, 0, &mut stats).is_ok());
        assert!(mem.read(64, 1, &mut stats).is_err());
        // The rejected access left no trace
        assert_eq!(stats.levels[0].num_access(), 1);
    }

    #[test]
    fn test_zero_capacity() {
        match InclusiveCache::make([0, 4, 8], BackingStore::make(16)) {
            Err(SimulatorError::ConfigError(message)) => {
                assert!(message.contains("L1"))
            }
            _ => panic!("Expected a configuration error"),
        }
        assert!(InclusiveCache::make([2, 4, 0], BackingStore::make(16)).is_err());
        assert!(InclusiveCache::make([2, 4, 8], BackingStore::make(0)).is_err());
    }

    #[test]
    fn test_access_count_per_level() {
        let mut mem = make([2, 4, 8], 16);
        let mut stats = AccessStats::default();
        mem.read(address_of(1), 0, &mut stats).unwrap();

        // One insertion per level, no carry-over from the level below
        for cache in mem.caches.iter() {
            let block = cache.get(cache.find(1).unwrap()).unwrap();
            assert_eq!(block.access_count, 1);
        }

        mem.read(address_of(1), 1, &mut stats).unwrap();
        let l1 = &mem.caches[0];
        assert_eq!(l1.get(l1.find(1).unwrap()).unwrap().access_count, 2);
        let l2 = &mem.caches[1];
        assert_eq!(l2.get(l2.find(1).unwrap()).unwrap().access_count, 1);
    }
}
