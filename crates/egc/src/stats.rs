//! Statistics Module - Collector Counters
//!
//! Plain counters updated by the heap and the collector. Useful for
//! regression tests and for the diagnostics dump.

use serde::Serialize;

/// Cumulative collector statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct GcStats {
    /// Completed full cycles (Pause -> ... -> Finalize)
    pub cycles: u64,

    /// `step()` invocations that did any work
    pub steps: u64,

    /// Objects reclaimed by the sweep phase
    pub swept: u64,

    /// Objects finalized through the destruction queue
    pub drained: u64,

    /// Write-barrier invocations that had to gray a white target
    pub barrier_grays: u64,

    /// References nulled because their target was pending destruction
    pub euthanized_refs: u64,

    /// Objects inserted over the heap's lifetime
    pub inserted: u64,
}

impl GcStats {
    /// Create zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }
}
