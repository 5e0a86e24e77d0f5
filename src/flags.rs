use std::path::PathBuf;

use crate::config::SimConfig;

xflags::xflags! {
    /// Three-level inclusive cache simulator.
    cmd cache-sim {
        /// Path to a trace file with one address per line.
        /// Random addresses are simulated when omitted.
        optional trace: PathBuf

        /// Size of main memory in blocks (default 1024).
        optional --ram capacity: usize

        /// Number of lines in the L1 cache (default 16).
        optional --l1 capacity: usize

        /// Number of lines in the L2 cache (default 32).
        optional --l2 capacity: usize

        /// Number of lines in the L3 cache (default 64).
        optional --l3 capacity: usize

        /// Number of random accesses to simulate (default 1000).
        optional -n, --accesses count: usize

        /// Seed of the random address stream.
        optional --seed seed: u64

        /// Also write the report as CSV to the given path.
        optional --csv path: PathBuf

        /// Verify the hierarchy invariants after the run.
        optional --check

        /// Enables verbose mode, logging the level serving each access.
        optional -v, --verbose
    }
}

impl CacheSim {
    /// Overlay the given options on the default configuration
    pub fn to_config(&self) -> SimConfig {
        let default = SimConfig::default();
        let [l1, l2, l3] = default.cache_capacities;
        SimConfig {
            ram_capacity: self.ram.unwrap_or(default.ram_capacity),
            cache_capacities: [
                self.l1.unwrap_or(l1),
                self.l2.unwrap_or(l2),
                self.l3.unwrap_or(l3),
            ],
            num_accesses: self.accesses.unwrap_or(default.num_accesses),
            seed: self.seed,
        }
    }
}
