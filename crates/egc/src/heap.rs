//! Heap Module - Injected Object Heap Context
//!
//! [`ObjectHeap`] bundles the class registry, the object directory, the
//! incremental collector and the destruction queue behind one facade. It is
//! an explicit context value, not a global: the engine constructs one (or
//! several, in tests) and threads it to whoever allocates.
//!
//! The facade is also where the safety contracts are enforced in one place:
//! typed access checks liveness before downcasting, and [`store_ref`] is the
//! single entry point for mutating reference fields on inserted objects, so
//! the write barrier can never be forgotten.
//!
//! [`store_ref`]: ObjectHeap::store_ref

use indexmap::IndexMap;

use crate::config::GcTuning;
use crate::destroy::{queue_destroy, FinalizeCtx, PendingBatch};
use crate::directory::ObjectDirectory;
use crate::error::{HeapError, Result};
use crate::gc::{GcCore, GcPhase};
use crate::object::{EngineObject, Handle, ObjRef};
use crate::rtti::{ClassDecl, ClassId, ClassRegistry};
use crate::stats::GcStats;

/// The engine's object heap: registry, directory, collector and the
/// end-of-frame destruction queue.
///
/// # Examples
///
/// ```rust
/// use egc::heap::ObjectHeap;
/// use egc::object::{EngineObject, ObjRef};
/// use egc::rtti::ClassDecl;
///
/// struct Marker;
/// impl EngineObject for Marker {
///     fn class_name(&self) -> &'static str { "Marker" }
///     fn as_any(&self) -> &dyn std::any::Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
/// }
///
/// let mut heap = ObjectHeap::new();
/// heap.register_class(ClassDecl {
///     name: "Marker",
///     parent: None,
///     size: std::mem::size_of::<Marker>(),
///     refs: None,
///     factory: None,
/// });
/// heap.link_classes();
///
/// let h = heap.insert(Marker).unwrap();
/// assert!(heap.get::<Marker>(h).is_ok());
/// heap.destroy(h);
/// heap.end_frame();
/// assert!(heap.get::<Marker>(h).is_err());
/// ```
pub struct ObjectHeap {
    registry: ClassRegistry,
    directory: ObjectDirectory,
    gc: GcCore,
    /// Destruction queue, drained (in batches) by `end_frame`
    pending: Vec<Handle>,
    stats: GcStats,
}

impl ObjectHeap {
    /// Heap with default collector tuning
    pub fn new() -> Self {
        Self::build(GcTuning::default())
    }

    /// Heap with explicit collector tuning
    ///
    /// # Returns
    /// * `Ok(ObjectHeap)` - ready to register classes
    /// * `Err(HeapError::Configuration)` - tuning out of range
    pub fn with_tuning(tuning: GcTuning) -> Result<Self> {
        tuning.validate()?;
        Ok(Self::build(tuning))
    }

    fn build(tuning: GcTuning) -> Self {
        Self {
            registry: ClassRegistry::new(),
            directory: ObjectDirectory::new(),
            gc: GcCore::new(tuning),
            pending: Vec::new(),
            stats: GcStats::new(),
        }
    }

    /// Register a class declaration. Call [`link_classes`](Self::link_classes)
    /// once registration is done.
    pub fn register_class(&mut self, decl: ClassDecl) -> ClassId {
        self.registry.register(decl)
    }

    /// Resolve parent links and validate thunks; see [`ClassRegistry::link`]
    pub fn link_classes(&mut self) {
        self.registry.link();
    }

    #[inline]
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    #[inline]
    pub fn directory(&self) -> &ObjectDirectory {
        &self.directory
    }

    #[inline]
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    #[inline]
    pub fn phase(&self) -> GcPhase {
        self.gc.phase()
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.directory.live_count()
    }

    /// Handles currently queued for destruction
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Insert an object under the collector's management.
    ///
    /// The object is born in the current white. Storing the handle into
    /// another object (via [`store_ref`](Self::store_ref)) or rooting it
    /// keeps it alive across a cycle in flight.
    ///
    /// # Returns
    /// * `Ok(Handle)` - the object's stable directory index
    /// * `Err(HeapError::UnregisteredClass)` - `class_name()` was never
    ///   registered
    pub fn insert<T: EngineObject>(&mut self, obj: T) -> Result<Handle> {
        let name = obj.class_name();
        let class = self
            .registry
            .find(name)
            .ok_or_else(|| HeapError::UnregisteredClass(name.to_string()))?;
        let size = self.registry.desc(class).size();
        let h = self
            .directory
            .insert(Box::new(obj), class, size, self.gc.current_white());
        self.gc.note_alloc(size);
        self.stats.inserted += 1;
        Ok(h)
    }

    fn live_check(&self, h: Handle) -> Result<()> {
        if !self.directory.is_occupied(h) {
            return Err(HeapError::UnknownHandle(h.index()));
        }
        if self.directory.is_pending(h) {
            return Err(HeapError::PendingDestruction(h.index()));
        }
        Ok(())
    }

    /// Typed shared access
    ///
    /// # Returns
    /// * `Ok(&T)` - the object
    /// * `Err(HeapError::UnknownHandle)` - freed or never valid
    /// * `Err(HeapError::PendingDestruction)` - destroyed, not yet drained
    /// * `Err(HeapError::ClassMismatch)` - object is not a `T`
    pub fn get<T: EngineObject>(&self, h: Handle) -> Result<&T> {
        self.live_check(h)?;
        let obj = self
            .directory
            .obj(h)
            .ok_or_else(|| HeapError::UnknownHandle(h.index()))?;
        let actual = obj.class_name();
        obj.as_any()
            .downcast_ref::<T>()
            .ok_or(HeapError::ClassMismatch {
                index: h.index(),
                actual,
            })
    }

    /// Typed exclusive access. Mutate non-reference state freely; reference
    /// fields go through [`store_ref`](Self::store_ref).
    pub fn get_mut<T: EngineObject>(&mut self, h: Handle) -> Result<&mut T> {
        self.live_check(h)?;
        let obj = self
            .directory
            .obj_mut(h)
            .ok_or_else(|| HeapError::UnknownHandle(h.index()))?;
        let actual = obj.class_name();
        obj.as_any_mut()
            .downcast_mut::<T>()
            .ok_or(HeapError::ClassMismatch {
                index: h.index(),
                actual,
            })
    }

    /// Untyped access, for code that only needs the trait surface
    pub fn obj(&self, h: Handle) -> Option<&dyn EngineObject> {
        self.directory.obj(h)
    }

    /// Assign a reference field on an inserted object, running the write
    /// barrier first.
    ///
    /// `field` projects the `ObjRef` out of the concrete type, e.g.
    /// `|a: &mut Actor| &mut a.target` written as a plain fn.
    ///
    /// # Returns
    /// * `Ok(())` - stored
    /// * `Err(HeapError::UnknownHandle)` - owner or target freed
    /// * `Err(HeapError::PendingDestruction)` - owner or target is queued
    ///   for destruction
    /// * `Err(HeapError::ClassMismatch)` - owner is not a `T`
    pub fn store_ref<T: EngineObject>(
        &mut self,
        owner: Handle,
        field: fn(&mut T) -> &mut ObjRef,
        value: Option<Handle>,
    ) -> Result<()> {
        self.live_check(owner)?;
        if let Some(target) = value {
            self.live_check(target)?;
            self.gc
                .barrier(owner, target, &mut self.directory, &mut self.stats);
        }
        let slot = self.get_mut::<T>(owner)?;
        field(slot).set(value);
        Ok(())
    }

    /// Queue an object for destruction.
    ///
    /// Idempotent. The object leaves the live-iteration surface right away;
    /// its slot and memory are reclaimed by the next [`end_frame`]
    /// (references to it held elsewhere are nulled there).
    ///
    /// Returns false when the call was a no-op (already pending, mid
    /// finalizer, or freed).
    ///
    /// [`end_frame`]: Self::end_frame
    pub fn destroy(&mut self, h: Handle) -> bool {
        queue_destroy(&mut self.directory, &mut self.pending, self.gc.roots_mut(), h)
    }

    /// End-of-frame drain plus one collector step
    pub fn end_frame(&mut self) {
        self.end_frame_with(|_| {});
    }

    /// End-of-frame drain with an out-of-band fix-up callback.
    ///
    /// For every batch drained, `fix` runs after the directory-wide null
    /// scan and before any finalizer: engine state not reachable through
    /// reference thunks can null its own copies against
    /// [`PendingBatch::contains`].
    ///
    /// Finalizers may queue further destructions; those drain as additional
    /// batches within the same call.
    pub fn end_frame_with(&mut self, mut fix: impl FnMut(&PendingBatch)) {
        while !self.pending.is_empty() {
            let batch = PendingBatch::new(std::mem::take(&mut self.pending));
            if !self.directory.inactive() {
                self.null_refs_to_batch(&batch);
            }
            fix(&batch);
            for &h in batch.handles() {
                self.finalize_one(h);
            }
        }
        self.directory.clear_spawn_flags();
        self.gc_step();
    }

    /// One directory pass nulling every live reference whose target is in
    /// the batch. One scan per batch regardless of batch size.
    fn null_refs_to_batch(&mut self, batch: &PendingBatch) {
        for i in 0..self.directory.capacity() {
            let Some(h) = self.directory.live_handle_at(i) else {
                continue;
            };
            let Some(class) = self.directory.class_of(h) else {
                continue;
            };
            let Some(mut obj) = self.directory.take_obj(h) else {
                continue;
            };
            for thunk in self.registry.flat_refs(class) {
                thunk(obj.as_mut(), &mut |r| {
                    if r.get().is_some_and(|t| batch.contains(t)) {
                        r.clear();
                    }
                });
            }
            self.directory.put_back(h, obj);
        }
    }

    /// Run one object's finalizer and release its slot
    fn finalize_one(&mut self, h: Handle) {
        let Some(mut obj) = self.directory.take_obj(h) else {
            return;
        };
        if let Some(m) = self.directory.meta_mut(h) {
            m.in_cleanup = true;
        }
        let mut ctx = FinalizeCtx::new(&mut self.directory, &mut self.pending, self.gc.roots_mut());
        obj.finalize(&mut ctx);
        let chained = ctx.chained();
        drop(ctx);
        if !chained {
            log::error!(
                "BUG: {} finalizer did not chain to finalize_base",
                obj.class_name()
            );
        }
        let size = self.directory.meta(h).map_or(0, |m| m.size);
        self.directory.free_slot(h);
        self.gc.note_free(size);
        self.stats.drained += 1;
    }

    /// Destroy and finalize one object immediately, without waiting for the
    /// frame boundary. The null scan covers just this object (skipped when
    /// the heap is shutting down).
    ///
    /// Returns false when the handle was already freed or mid finalizer.
    pub fn remove_now(&mut self, h: Handle) -> bool {
        let Some(meta) = self.directory.meta(h) else {
            return false;
        };
        if meta.in_cleanup {
            return false;
        }
        if !meta.pending {
            self.directory.set_pending(h);
            self.gc.remove_root(h);
        }
        self.pending.retain(|&p| p != h);
        if !self.directory.inactive() {
            let batch = PendingBatch::new(vec![h]);
            self.null_refs_to_batch(&batch);
        }
        self.finalize_one(h);
        true
    }

    /// Register `h` as permanently reachable.
    ///
    /// # Returns
    /// * `Ok(())` - rooted (idempotent)
    /// * `Err(HeapError::UnknownHandle)` / `Err(HeapError::PendingDestruction)` -
    ///   the object cannot be rooted
    pub fn add_root(&mut self, h: Handle) -> Result<()> {
        self.live_check(h)?;
        self.gc.add_root(h, &mut self.directory);
        Ok(())
    }

    /// Unregister a root. No-op for handles that were never rooted.
    pub fn remove_root(&mut self, h: Handle) {
        self.gc.remove_root(h);
    }

    #[inline]
    pub fn roots(&self) -> &[Handle] {
        self.gc.roots()
    }

    /// One bounded collector step. Returns true if the collector did work.
    pub fn gc_step(&mut self) -> bool {
        let did = self.gc.step(
            &mut self.directory,
            &mut self.registry,
            &mut self.pending,
            &mut self.stats,
        );
        if did {
            self.stats.steps += 1;
        }
        did
    }

    /// Run a complete collection cycle to the next Pause, starting one if
    /// the collector is idle. Objects queued by sweep-phase finalizers are
    /// left for the next `end_frame`.
    pub fn full_gc(&mut self) {
        if self.gc.phase() == GcPhase::Pause {
            self.gc.start_cycle(&mut self.directory);
            self.stats.steps += 1;
        }
        while self.gc.phase() != GcPhase::Pause {
            self.gc.step(
                &mut self.directory,
                &mut self.registry,
                &mut self.pending,
                &mut self.stats,
            );
            self.stats.steps += 1;
        }
    }

    /// Tear the heap down: every remaining object is finalized, with the
    /// dangling-reference null scans disabled (nothing will dereference a
    /// handle again).
    pub fn shutdown(&mut self) {
        self.directory.set_inactive(true);
        for h in self.directory.occupied_handles() {
            if self.directory.is_occupied(h) {
                self.finalize_one(h);
            }
        }
        self.pending.clear();
        self.gc.roots_mut().clear();
    }

    /// Key/value snapshot of heap state, insertion-ordered; the primitive
    /// behind the `heapstat` console command.
    pub fn diagnostics(&self) -> IndexMap<String, String> {
        let mut out = IndexMap::new();
        out.insert("phase".into(), format!("{:?}", self.gc.phase()));
        out.insert("live".into(), self.directory.live_count().to_string());
        out.insert("pending".into(), self.pending.len().to_string());
        out.insert("slots".into(), self.directory.capacity().to_string());
        out.insert("bytes".into(), self.gc.total_bytes().to_string());
        out.insert("threshold".into(), self.gc.threshold().to_string());
        out.insert("roots".into(), self.gc.roots().len().to_string());
        out.insert("classes".into(), self.registry.len().to_string());
        out.insert("cycles".into(), self.stats.cycles.to_string());
        out.insert("swept".into(), self.stats.swept.to_string());
        out.insert("drained".into(), self.stats.drained.to_string());
        out
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}
