//! Per-level access statistics of a simulation run

use std::fmt;
use std::io;

use super::cache::CacheHistory;
use super::LEVEL_COUNT;
use crate::error::{MemoryError, SimulatorResult};

/// Hit/miss counters for every cache level.
/// Only the resolver mutates them.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct AccessStats {
    pub levels: [CacheHistory; LEVEL_COUNT],
}

impl AccessStats {
    pub fn record_hit(&mut self, k: usize) {
        self.levels[k].record_hit();
    }

    pub fn record_miss(&mut self, k: usize) {
        self.levels[k].record_miss();
    }

    pub fn hits(&self, k: usize) -> u64 {
        self.levels[k].num_hit
    }

    pub fn misses(&self, k: usize) -> u64 {
        self.levels[k].num_miss
    }

    /// Check that every access reached L1
    /// and that each miss fell through to exactly the next level
    pub fn verify_funnel(&self, num_accesses: u64) -> SimulatorResult<()> {
        if self.levels[0].num_access() != num_accesses {
            return Err(MemoryError::CacheInconsistency(
                1,
                format!(
                    "{} lookups recorded for {} accesses",
                    self.levels[0].num_access(),
                    num_accesses
                ),
            )
            .into());
        }
        for k in 0..LEVEL_COUNT - 1 {
            if self.misses(k) != self.levels[k + 1].num_access() {
                return Err(MemoryError::CacheInconsistency(
                    k + 2,
                    format!(
                        "{} lookups recorded but level {} missed {} times",
                        self.levels[k + 1].num_access(),
                        k + 1,
                        self.misses(k)
                    ),
                )
                .into());
            }
        }
        Ok(())
    }

    /// Write one record per level
    pub fn write_csv<W: io::Write>(&self, writer: W) -> SimulatorResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(["Level", "Hits", "Misses", "Miss rate"])?;
        for (k, history) in self.levels.iter().enumerate() {
            writer.write_record([
                format!("L{}", k + 1),
                history.num_hit.to_string(),
                history.num_miss.to_string(),
                format!("{:.3}", history.get_miss_rate()),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for AccessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation results:")?;
        for (k, history) in self.levels.iter().enumerate() {
            writeln!(
                f,
                "Cache level {} - Hits: {}, Misses: {}",
                k + 1,
                history.num_hit,
                history.num_miss
            )?;
        }
        Ok(())
    }
}
