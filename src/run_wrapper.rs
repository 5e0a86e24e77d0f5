//! A simulator wrapper

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::error::{SimulatorResult, TraceError};
use crate::memory::inclusive::InclusiveCache;
use crate::memory::ram::BackingStore;
use crate::memory::stats::AccessStats;
use crate::memory::{get_tag, StorageInterface, Tick};

/// Make the random source of a run
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Endless stream of uniformly random addresses in [0, max_address)
pub struct RandomAddresses<R: Rng> {
    rng: R,
    max_address: usize,
}

impl<R: Rng> RandomAddresses<R> {
    pub fn new(rng: R, max_address: usize) -> Self {
        assert!(max_address > 0);
        Self { rng, max_address }
    }
}

impl<R: Rng> Iterator for RandomAddresses<R> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        Some(self.rng.gen_range(0..self.max_address))
    }
}

/// Build the hierarchy described by `config`,
/// with main memory filled from `rng`
pub fn build_hierarchy(
    config: &SimConfig,
    rng: &mut impl Rng,
) -> SimulatorResult<InclusiveCache> {
    config.validate()?;
    let mut ram = BackingStore::make(config.ram_capacity);
    ram.fill(|_, _| rng.gen());
    InclusiveCache::make(config.cache_capacities, ram)
}

/// Resolve every address in order, the i-th one at logical time i
pub fn simulate(
    mem: &mut impl StorageInterface,
    addresses: impl IntoIterator<Item = usize>,
) -> SimulatorResult<AccessStats> {
    let mut stats = AccessStats::default();
    for (now, address) in addresses.into_iter().enumerate() {
        mem.read(address, now as Tick, &mut stats)?;
    }
    Ok(stats)
}

/// Run simulation on the given configuration, drawing addresses
/// from the trace file if any and from the random stream otherwise
pub fn run(
    config: &SimConfig,
    trace_path: Option<&Path>,
    check: bool,
) -> SimulatorResult<AccessStats> {
    let mut rng = make_rng(config.seed);
    let mut mem = build_hierarchy(config, &mut rng)?;

    let addresses: Vec<usize> = match trace_path {
        Some(trace_path) => fetch_addresses(trace_path)?,
        None => RandomAddresses::new(rng, config.max_address())
            .take(config.num_accesses)
            .collect(),
    };
    info!(
        accesses = addresses.len(),
        ram = config.ram_capacity,
        caches = ?config.cache_capacities,
        "Starting simulation"
    );

    let stats = simulate(&mut mem, addresses.iter().copied())?;

    if check {
        mem.verify_uniqueness()?;
        stats.verify_funnel(addresses.len() as u64)?;
        if let Some(address) = addresses.last() {
            let now = (addresses.len() - 1) as Tick;
            mem.verify_inclusion(get_tag(*address), now)?;
        }
        info!("Hierarchy invariants hold");
    }

    info!(
        l1_miss_rate = stats.levels[0].get_miss_rate(),
        "Simulation finished"
    );
    Ok(stats)
}

/// Replay `addresses` once per L1 size, other parameters taken from `base`.
/// Returns the statistics of each run, in the order of `l1_capacities`
pub fn sweep_l1(
    base: &SimConfig,
    addresses: &[usize],
    l1_capacities: &[usize],
) -> SimulatorResult<Vec<AccessStats>> {
    let mut results = Vec::with_capacity(l1_capacities.len());
    for l1_capacity in l1_capacities {
        let mut config = *base;
        config.cache_capacities[0] = *l1_capacity;
        let mut mem = build_hierarchy(&config, &mut make_rng(config.seed))?;
        let stats = simulate(&mut mem, addresses.iter().copied())?;
        stats.verify_funnel(addresses.len() as u64)?;
        info!(
            l1_capacity = *l1_capacity,
            l1_hit_rate = stats.levels[0].get_hit_rate(),
            "Sweep point"
        );
        results.push(stats);
    }
    Ok(results)
}

/// Parse a decimal or 0x-prefixed hexadecimal address
fn parse_address(token: &str) -> Option<usize> {
    match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

/// Fetch addresses from the trace file, one per line.
/// Blank lines and lines starting with '#' are skipped
pub fn fetch_addresses(trace_path: &Path) -> SimulatorResult<Vec<usize>> {
    let content = std::fs::read_to_string(trace_path)
        .map_err(|e| TraceError::FileReadError(trace_path.into(), e))?;
    let mut addresses = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let address = parse_address(line).ok_or_else(|| {
            TraceError::ParseError(
                trace_path.into(),
                format!("Invalid address '{}' at line {}", line, line_num + 1),
            )
        })?;
        addresses.push(address);
    }

    if addresses.is_empty() {
        warn!("Trace file {} holds no addresses", trace_path.display());
    }
    Ok(addresses)
}
