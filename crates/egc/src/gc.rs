//! GC Module - Incremental Tri-Color Collection
//!
//! The collector is a four-state machine stepped between frames:
//!
//! 1. **Pause** - idle until the live-byte estimate crosses the threshold
//! 2. **Propagate** - drain the gray work-list a budgeted amount per step
//! 3. **Sweep** - budgeted cursor walk freeing objects left in the old white
//! 4. **Finalize** - recompute the threshold, back to Pause
//!
//! The current white flips when Propagate completes: objects allocated
//! during Sweep carry the new white and survive unexamined, while objects
//! allocated during Propagate are ordinary white and must be reached (a
//! barriered store or a root) to outlive the cycle.
//!
//! Correctness rests on one invariant: **no black object references a
//! white object of the sweep's target color when Sweep begins.** The write
//! barrier ([`GcCore::barrier`]) restores it by graying the target of any
//! black-to-white store, and the gray set is a work-list, so objects grayed
//! during a step are never dropped.
//!
//! "Incremental" means interruptible across frames, not concurrent: all
//! state lives in [`GcCore`] and every step runs to completion on the
//! calling thread.

use crate::config::GcTuning;
use crate::destroy::FinalizeCtx;
use crate::directory::{Color, ObjectDirectory};
use crate::object::Handle;
use crate::rtti::ClassRegistry;
use crate::stats::GcStats;

/// Collector state, cyclic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcPhase {
    /// Idle; waiting for allocation pressure
    Pause,
    /// Draining the gray set
    Propagate,
    /// Freeing unreachable objects
    Sweep,
    /// End-of-cycle bookkeeping
    Finalize,
}

/// Incremental collector state. Owned by the heap context; all mutation
/// happens through `step`/`barrier` with the directory passed in.
pub(crate) struct GcCore {
    phase: GcPhase,
    /// The white objects are currently born with
    current_white: Color,
    /// The white the active sweep reclaims
    sweep_white: Color,
    /// Gray work-list; barrier pushes land here mid-step
    gray: Vec<Handle>,
    sweep_cursor: usize,
    threshold: usize,
    /// Live-byte estimate from declared instance sizes
    total_bytes: usize,
    tuning: GcTuning,
    roots: Vec<Handle>,
}

impl GcCore {
    pub(crate) fn new(tuning: GcTuning) -> Self {
        Self {
            phase: GcPhase::Pause,
            current_white: Color::White0,
            sweep_white: Color::White1,
            gray: Vec::new(),
            sweep_cursor: 0,
            threshold: tuning.initial_threshold,
            total_bytes: 0,
            tuning,
            roots: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn phase(&self) -> GcPhase {
        self.phase
    }

    #[inline]
    pub(crate) fn current_white(&self) -> Color {
        self.current_white
    }

    #[inline]
    pub(crate) fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    #[inline]
    pub(crate) fn threshold(&self) -> usize {
        self.threshold
    }

    #[inline]
    pub(crate) fn roots(&self) -> &[Handle] {
        &self.roots
    }

    #[inline]
    pub(crate) fn roots_mut(&mut self) -> &mut Vec<Handle> {
        &mut self.roots
    }

    #[inline]
    pub(crate) fn note_alloc(&mut self, bytes: usize) {
        self.total_bytes += bytes;
    }

    #[inline]
    pub(crate) fn note_free(&mut self, bytes: usize) {
        self.total_bytes = self.total_bytes.saturating_sub(bytes);
    }

    /// Register a permanently-reachable starting point.
    ///
    /// Roots added while a mark is in flight are grayed immediately so the
    /// running cycle cannot miss them.
    pub(crate) fn add_root(&mut self, h: Handle, dir: &mut ObjectDirectory) {
        if self.roots.contains(&h) {
            return;
        }
        self.roots.push(h);
        if self.phase == GcPhase::Propagate && dir.color(h).map_or(false, Color::is_white) {
            dir.set_color(h, Color::Gray);
            self.gray.push(h);
        }
    }

    pub(crate) fn remove_root(&mut self, h: Handle) {
        self.roots.retain(|&r| r != h);
    }

    /// Write barrier: restores the tri-color invariant when a reference on
    /// a black object is made to point at a white one. No-op otherwise.
    pub(crate) fn barrier(
        &mut self,
        from: Handle,
        to: Handle,
        dir: &mut ObjectDirectory,
        stats: &mut GcStats,
    ) {
        if dir.color(from) == Some(Color::Black)
            && dir.is_live(to)
            && dir.color(to).map_or(false, Color::is_white)
        {
            dir.set_color(to, Color::Gray);
            self.gray.push(to);
            stats.barrier_grays += 1;
        }
    }

    /// One bounded unit of work appropriate to the current phase.
    /// Returns true if any work was done.
    pub(crate) fn step(
        &mut self,
        dir: &mut ObjectDirectory,
        reg: &mut ClassRegistry,
        pending: &mut Vec<Handle>,
        stats: &mut GcStats,
    ) -> bool {
        match self.phase {
            GcPhase::Pause => {
                if self.total_bytes < self.threshold {
                    return false;
                }
                self.start_cycle(dir);
                true
            }
            GcPhase::Propagate => {
                self.propagate_step(dir, reg, stats);
                true
            }
            GcPhase::Sweep => {
                self.sweep_step(dir, pending, stats);
                true
            }
            GcPhase::Finalize => {
                self.finish_cycle(stats);
                true
            }
        }
    }

    /// Begin a cycle: gray the root set, enter Propagate.
    ///
    /// Every surviving object is white here (the previous sweep recolored
    /// them), so a fresh gray list seeded from the roots is a complete
    /// starting front.
    pub(crate) fn start_cycle(&mut self, dir: &mut ObjectDirectory) {
        self.gray.clear();
        let (roots, gray) = (&self.roots, &mut self.gray);
        for &r in roots {
            if dir.is_live(r) && dir.color(r).map_or(false, Color::is_white) {
                dir.set_color(r, Color::Gray);
                gray.push(r);
            }
        }
        self.phase = GcPhase::Propagate;
    }

    fn propagate_step(
        &mut self,
        dir: &mut ObjectDirectory,
        reg: &mut ClassRegistry,
        stats: &mut GcStats,
    ) {
        let mut budget = self.tuning.step_budget();
        while budget > 0 {
            let Some(h) = self.gray.pop() else {
                // Atomic step: the gray set is empty, the invariant holds.
                // Flip whites and hand over to the sweep.
                self.sweep_white = self.current_white;
                self.current_white = self.current_white.flipped();
                self.sweep_cursor = 0;
                self.phase = GcPhase::Sweep;
                return;
            };
            // Stale entries: destroyed since grayed, or already blackened.
            if !dir.is_live(h) || dir.color(h) != Some(Color::Gray) {
                continue;
            }
            budget = budget.saturating_sub(self.propagate_one(h, dir, reg, stats));
        }
    }

    /// Blacken one gray object: gray its not-yet-visited children, null
    /// its references to objects that asked to die. Returns work units.
    fn propagate_one(
        &mut self,
        h: Handle,
        dir: &mut ObjectDirectory,
        reg: &mut ClassRegistry,
        stats: &mut GcStats,
    ) -> usize {
        let class = match dir.class_of(h) {
            Some(c) => c,
            None => return 1,
        };
        let Some(mut obj) = dir.take_obj(h) else {
            return 1;
        };
        let mut work = 1usize;
        {
            let gray = &mut self.gray;
            let thunks = reg.flat_refs(class);
            for thunk in thunks {
                thunk(obj.as_mut(), &mut |r| {
                    work += 1;
                    let Some(target) = r.get() else { return };
                    if dir.is_pending(target) {
                        // Soft-root cleanup: the target wants to die, so
                        // drop the edge instead of keeping it alive.
                        r.clear();
                        stats.euthanized_refs += 1;
                    } else if dir.color(target).map_or(false, Color::is_white) {
                        dir.set_color(target, Color::Gray);
                        gray.push(target);
                    }
                });
            }
        }
        dir.put_back(h, obj);
        dir.set_color(h, Color::Black);
        work
    }

    fn sweep_step(
        &mut self,
        dir: &mut ObjectDirectory,
        pending: &mut Vec<Handle>,
        stats: &mut GcStats,
    ) {
        let mut examined = 0;
        while examined < self.tuning.sweep_max {
            if self.sweep_cursor >= dir.capacity() {
                self.phase = GcPhase::Finalize;
                return;
            }
            let h = Handle(self.sweep_cursor as u32);
            self.sweep_cursor += 1;
            examined += 1;

            // Holes and pending slots belong to the destruction queue.
            if !dir.is_live(h) {
                continue;
            }
            let Some(color) = dir.color(h) else {
                continue;
            };
            if color == self.sweep_white {
                self.reclaim(h, dir, pending, stats);
            } else {
                dir.set_color(h, self.current_white);
            }
        }
    }

    /// Finalize and free one unreachable object. No null scan is needed:
    /// nothing reachable references it, and the barrier kept it that way.
    fn reclaim(
        &mut self,
        h: Handle,
        dir: &mut ObjectDirectory,
        pending: &mut Vec<Handle>,
        stats: &mut GcStats,
    ) {
        let Some(mut obj) = dir.take_obj(h) else {
            return;
        };
        if let Some(m) = dir.meta_mut(h) {
            m.in_cleanup = true;
        }
        let mut ctx = FinalizeCtx::new(dir, pending, &mut self.roots);
        obj.finalize(&mut ctx);
        let chained = ctx.chained();
        drop(ctx);
        if !chained {
            log::error!(
                "BUG: {} finalizer did not chain to finalize_base",
                obj.class_name()
            );
        }
        let size = dir.meta(h).map_or(0, |m| m.size);
        dir.free_slot(h);
        self.total_bytes = self.total_bytes.saturating_sub(size);
        stats.swept += 1;
    }

    fn finish_cycle(&mut self, stats: &mut GcStats) {
        self.threshold = std::cmp::max(
            (self.total_bytes / 100).saturating_mul(self.tuning.pause_pct),
            self.tuning.min_threshold,
        );
        self.gray.clear();
        stats.cycles += 1;
        self.phase = GcPhase::Pause;
    }
}
