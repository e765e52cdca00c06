//! Destroy Module - Deferred Mass Destruction
//!
//! Two-phase destruction: `destroy()` detaches an object from the live
//! surface and queues it; the end-of-frame drain nulls every remaining
//! reference to the whole batch in one directory scan, then runs the
//! finalizers. No object ever observes a half-destroyed neighbor through a
//! reference field.
//!
//! The batch container is growable; there is no hard cap and no
//! "too many to destroy" abort.

use rustc_hash::FxHashSet;

use crate::directory::ObjectDirectory;
use crate::object::Handle;

/// One frame's worth of objects queued for destruction.
///
/// Passed to the out-of-band fix-up callback of
/// [`ObjectHeap::end_frame_with`](crate::heap::ObjectHeap::end_frame_with)
/// so engine state not reachable through reference thunks (body queues,
/// per-player soft references, sound targets) can null its own copies.
pub struct PendingBatch {
    set: FxHashSet<Handle>,
    order: Vec<Handle>,
}

impl PendingBatch {
    pub(crate) fn new(handles: Vec<Handle>) -> Self {
        let set = handles.iter().copied().collect();
        Self {
            set,
            order: handles,
        }
    }

    /// Is `h` part of this batch?
    #[inline]
    pub fn contains(&self, h: Handle) -> bool {
        self.set.contains(&h)
    }

    /// Batch members in destruction-request order
    #[inline]
    pub fn handles(&self) -> &[Handle] {
        &self.order
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Context handed to finalizers.
///
/// Lets a finalizer request destruction of further objects (drained in the
/// same frame) without exposing the rest of the heap mid-teardown.
pub struct FinalizeCtx<'a> {
    dir: &'a mut ObjectDirectory,
    pending: &'a mut Vec<Handle>,
    roots: &'a mut Vec<Handle>,
    chained: bool,
}

impl<'a> FinalizeCtx<'a> {
    pub(crate) fn new(
        dir: &'a mut ObjectDirectory,
        pending: &'a mut Vec<Handle>,
        roots: &'a mut Vec<Handle>,
    ) -> Self {
        Self {
            dir,
            pending,
            roots,
            chained: false,
        }
    }

    /// Queue another object for destruction. Idempotent; no-ops on
    /// handles that are already pending, already being cleaned up, or
    /// freed.
    pub fn destroy(&mut self, h: Handle) -> bool {
        queue_destroy(self.dir, self.pending, self.roots, h)
    }

    /// Record that `finalize_base` ran. Called by the base implementation;
    /// finalizer overrides must not call this directly.
    pub fn note_chained(&mut self) {
        self.chained = true;
    }

    pub(crate) fn chained(&self) -> bool {
        self.chained
    }
}

/// Shared destroy entry point: flags the slot pending, drops it from the
/// root set, and enqueues it. Returns false when the call was a no-op.
pub(crate) fn queue_destroy(
    dir: &mut ObjectDirectory,
    pending: &mut Vec<Handle>,
    roots: &mut Vec<Handle>,
    h: Handle,
) -> bool {
    let Some(meta) = dir.meta(h) else {
        return false;
    };
    if meta.pending || meta.in_cleanup {
        return false;
    }
    dir.set_pending(h);
    roots.retain(|&r| r != h);
    pending.push(h);
    true
}
