//! Configuration Module - Collector Tuning Parameters
//!
//! The collector is incremental: it does a bounded amount of work per
//! `step()` call and otherwise stays out of the frame. These parameters
//! control when a cycle starts and how much of it runs per step.

use serde::{Deserialize, Serialize};

use crate::error::{HeapError, Result};

/// Work units granted per propagation step at `step_mul` = 100%.
///
/// One unit is one gray object popped or one reference field visited.
pub const STEP_WORK_BASE: usize = 32;

/// Tuning parameters for the incremental collector
///
/// Most workloads run fine on the defaults. Raising `pause_pct` trades
/// memory for fewer cycles; raising `step_mul` trades per-frame time for
/// shorter cycles.
///
/// # Examples
///
/// ```rust
/// use egc::GcTuning;
///
/// let tuning = GcTuning {
///     pause_pct: 200,
///     ..Default::default()
/// };
/// assert!(tuning.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcTuning {
    /// Percentage of the live-byte estimate at which the next cycle starts.
    ///
    /// After each full cycle the trigger threshold is recomputed as
    /// `estimate * pause_pct / 100`. Default: 150 (a new cycle begins once
    /// the heap grows half again past the last estimate).
    pub pause_pct: usize,

    /// Propagation budget as a percentage of [`STEP_WORK_BASE`].
    ///
    /// Default: 400 (each `step()` drains up to `4 * STEP_WORK_BASE` work
    /// units from the gray set).
    pub step_mul: usize,

    /// Maximum directory slots examined per sweep step.
    ///
    /// Default: 40.
    pub sweep_max: usize,

    /// Trigger threshold in bytes before the first cycle has run.
    ///
    /// Default: 64 KiB.
    pub initial_threshold: usize,

    /// Floor for the recomputed threshold, in bytes.
    ///
    /// Keeps a nearly-empty heap from cycling continuously. Default: 4 KiB.
    pub min_threshold: usize,
}

impl Default for GcTuning {
    fn default() -> Self {
        Self {
            pause_pct: 150,
            step_mul: 400,
            sweep_max: 40,
            initial_threshold: 64 * 1024,
            min_threshold: 4 * 1024,
        }
    }
}

impl GcTuning {
    /// Validate tuning parameters
    ///
    /// # Returns
    /// * `Ok(())` - parameters are usable
    /// * `Err(HeapError::Configuration)` - a parameter is out of range
    pub fn validate(&self) -> Result<()> {
        if self.pause_pct < 100 {
            return Err(HeapError::Configuration(format!(
                "pause_pct must be >= 100, got {}",
                self.pause_pct
            )));
        }
        if self.step_mul == 0 {
            return Err(HeapError::Configuration("step_mul must be > 0".into()));
        }
        if self.sweep_max == 0 {
            return Err(HeapError::Configuration("sweep_max must be > 0".into()));
        }
        if self.min_threshold > self.initial_threshold {
            return Err(HeapError::Configuration(format!(
                "min_threshold ({}) exceeds initial_threshold ({})",
                self.min_threshold, self.initial_threshold
            )));
        }
        Ok(())
    }

    /// Work units available to one propagation step; never zero, or the
    /// cycle could stall
    pub(crate) fn step_budget(&self) -> usize {
        ((STEP_WORK_BASE * self.step_mul) / 100).max(1)
    }
}
