//! Translation statistics collection and reporting.
//!
//! This module tracks how the paging unit is exercised. It provides:
//! 1. **Lookups:** Probe count, hits, and misses of the TLB.
//! 2. **Walks:** Completed page walks, faults raised, and bus-busy deferrals.
//! 3. **Maintenance:** LRU evictions, single-address invalidations, and flushes.
//!
//! Counters are plain `u64` fields updated on the hot path; export is via
//! `serde` so an embedding emulator can dump them next to its own statistics.

use serde::Serialize;

/// Counters describing TLB and walker activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TlbStats {
    /// Translations requested while paging was enabled.
    pub lookups: u64,
    /// Translations served from the TLB.
    pub hits: u64,
    /// Translations that missed both size classes.
    pub misses: u64,
    /// Page walks that completed and inserted an entry.
    pub walks: u64,
    /// Walks that ended in a fault, dispatched or suppressed.
    pub faults: u64,
    /// Walks deferred because the bus was busy.
    pub pending: u64,
    /// Valid entries displaced by LRU replacement.
    pub evictions: u64,
    /// Entries removed by single-address invalidation.
    pub invalidations: u64,
    /// Full or non-global flushes performed.
    pub flushes: u64,
}

impl TlbStats {
    /// Fraction of lookups served from the TLB, or `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    /// Serializes the counters as a JSON object.
    ///
    /// # Errors
    ///
    /// Propagates any `serde_json` serialization error.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
