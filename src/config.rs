//! Simulation parameters

use crate::error::{SimulatorError, SimulatorResult};
use crate::memory::{LEVEL_COUNT, WORDS_PER_BLOCK};

/// Simulation configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimConfig {
    /// Size of main memory in blocks
    pub ram_capacity: usize,
    /// Size of each cache level in lines, L1 first
    pub cache_capacities: [usize; LEVEL_COUNT],
    /// Number of random accesses to simulate
    pub num_accesses: usize,
    /// Seed of the random address stream; OS entropy if unset
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ram_capacity: 1024,
            cache_capacities: [16, 32, 64],
            num_accesses: 1000,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Exclusive upper bound of generated addresses
    pub fn max_address(&self) -> usize {
        self.ram_capacity * WORDS_PER_BLOCK
    }

    pub fn validate(&self) -> SimulatorResult<()> {
        if self.ram_capacity == 0 {
            return Err(SimulatorError::ConfigError(
                "RAM capacity must be positive".to_string(),
            ));
        }
        for (k, capacity) in self.cache_capacities.iter().enumerate() {
            if *capacity == 0 {
                return Err(SimulatorError::ConfigError(format!(
                    "L{} capacity must be positive",
                    k + 1
                )));
            }
        }
        if self.ram_capacity.checked_mul(WORDS_PER_BLOCK).is_none() {
            return Err(SimulatorError::ConfigError(format!(
                "RAM capacity {} overflows the address space",
                self.ram_capacity
            )));
        }
        Ok(())
    }
}
