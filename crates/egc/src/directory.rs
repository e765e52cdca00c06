//! Directory Module - Dense Index-Stable Object Table
//!
//! All tracked objects live here, in a growable array whose indices stay
//! valid for the lifetime of the occupying object. Holes left by removed
//! objects are recycled through a free-index stack rather than compacted,
//! so both the collector and the destruction scanner can visit "all live
//! objects" by a plain index walk.
//!
//! GC metadata (color, lifecycle bits) is kept in a per-slot [`SlotMeta`]
//! owned by this module, beside the object rather than inside it; domain
//! code never touches collector state.

use crate::object::{EngineObject, Handle};
use crate::rtti::ClassId;

/// Tri-color state of one tracked object.
///
/// The two whites alternate per cycle: objects born during a cycle carry
/// the white that the coming sweep does not reclaim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White0,
    White1,
    /// Reachable, children not yet scanned
    Gray,
    /// Reachable, children scanned
    Black,
}

impl Color {
    #[inline]
    pub fn is_white(self) -> bool {
        matches!(self, Color::White0 | Color::White1)
    }

    /// The other white
    #[inline]
    pub fn flipped(self) -> Color {
        match self {
            Color::White0 => Color::White1,
            Color::White1 => Color::White0,
            other => other,
        }
    }
}

/// Collector-owned per-slot metadata
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotMeta {
    pub color: Color,
    pub class: ClassId,
    /// Declared instance size; feeds the allocation-pressure estimate
    pub size: usize,
    /// Queued for mass destruction; off the live-iteration surface
    pub pending: bool,
    /// Finalizer currently running (re-entrant destroy becomes a no-op)
    pub in_cleanup: bool,
    /// Set at insertion, cleared by the first end-of-frame drain
    pub just_spawned: bool,
}

struct SlotEntry {
    /// `None` while the scanner or the drain has the object checked out
    obj: Option<Box<dyn EngineObject>>,
    meta: SlotMeta,
}

/// The process-wide table of tracked objects (one per heap context)
pub struct ObjectDirectory {
    slots: Vec<Option<SlotEntry>>,
    free: Vec<u32>,
    live: usize,
    /// Shutdown mode: the dangling-reference safety net is disabled
    inactive: bool,
}

impl ObjectDirectory {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            inactive: false,
        }
    }

    /// Insert an object, recycling a hole if one exists.
    ///
    /// Returns the assigned index; it is never reused while this object
    /// remains in the directory.
    pub(crate) fn insert(
        &mut self,
        obj: Box<dyn EngineObject>,
        class: ClassId,
        size: usize,
        color: Color,
    ) -> Handle {
        let meta = SlotMeta {
            color,
            class,
            size,
            pending: false,
            in_cleanup: false,
            just_spawned: true,
        };
        let entry = SlotEntry {
            obj: Some(obj),
            meta,
        };
        self.live += 1;
        if let Some(idx) = self.free.pop() {
            debug_assert!(self.slots[idx as usize].is_none());
            self.slots[idx as usize] = Some(entry);
            Handle(idx)
        } else {
            self.slots.push(Some(entry));
            Handle((self.slots.len() - 1) as u32)
        }
    }

    /// Number of slots, holes included. Iteration bound.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live (non-pending) objects
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    #[inline]
    fn entry(&self, h: Handle) -> Option<&SlotEntry> {
        self.slots.get(h.index() as usize)?.as_ref()
    }

    #[inline]
    fn entry_mut(&mut self, h: Handle) -> Option<&mut SlotEntry> {
        self.slots.get_mut(h.index() as usize)?.as_mut()
    }

    /// Slot holds an object, live or pending
    #[inline]
    pub fn is_occupied(&self, h: Handle) -> bool {
        self.entry(h).is_some()
    }

    /// Slot holds an object that is not queued for destruction
    #[inline]
    pub fn is_live(&self, h: Handle) -> bool {
        self.entry(h).map_or(false, |e| !e.meta.pending)
    }

    #[inline]
    pub fn is_pending(&self, h: Handle) -> bool {
        self.entry(h).map_or(false, |e| e.meta.pending)
    }

    /// Handle of the live object at slot `i`, if any
    #[inline]
    pub(crate) fn live_handle_at(&self, i: usize) -> Option<Handle> {
        match self.slots.get(i)?.as_ref() {
            Some(e) if !e.meta.pending => Some(Handle(i as u32)),
            _ => None,
        }
    }

    pub fn obj(&self, h: Handle) -> Option<&dyn EngineObject> {
        let e = self.entry(h)?;
        if e.meta.pending {
            return None;
        }
        e.obj.as_deref()
    }

    pub fn obj_mut(&mut self, h: Handle) -> Option<&mut dyn EngineObject> {
        let e = self.entry_mut(h)?;
        if e.meta.pending {
            return None;
        }
        e.obj.as_deref_mut()
    }

    /// Check the object out of its slot (metadata stays). The caller must
    /// `put_back` or `free_slot` afterwards.
    pub(crate) fn take_obj(&mut self, h: Handle) -> Option<Box<dyn EngineObject>> {
        self.entry_mut(h)?.obj.take()
    }

    pub(crate) fn put_back(&mut self, h: Handle, obj: Box<dyn EngineObject>) {
        let e = self
            .entry_mut(h)
            .expect("put_back on a freed directory slot");
        debug_assert!(e.obj.is_none());
        e.obj = Some(obj);
    }

    #[inline]
    pub(crate) fn meta(&self, h: Handle) -> Option<&SlotMeta> {
        self.entry(h).map(|e| &e.meta)
    }

    #[inline]
    pub(crate) fn meta_mut(&mut self, h: Handle) -> Option<&mut SlotMeta> {
        self.entry_mut(h).map(|e| &mut e.meta)
    }

    #[inline]
    pub fn color(&self, h: Handle) -> Option<Color> {
        self.meta(h).map(|m| m.color)
    }

    #[inline]
    pub(crate) fn set_color(&mut self, h: Handle, color: Color) {
        if let Some(m) = self.meta_mut(h) {
            m.color = color;
        }
    }

    #[inline]
    pub fn class_of(&self, h: Handle) -> Option<ClassId> {
        self.meta(h).map(|m| m.class)
    }

    /// Spawn-frame bit, set at insertion
    pub fn just_spawned(&self, h: Handle) -> bool {
        self.meta(h).map_or(false, |m| m.just_spawned)
    }

    /// Take the slot off the live-iteration surface (destruction queue)
    pub(crate) fn set_pending(&mut self, h: Handle) {
        if let Some(m) = self.meta_mut(h) {
            if !m.pending {
                m.pending = true;
                self.live -= 1;
            }
        }
    }

    /// Release the slot. The last index is popped; interior indices become
    /// holes on the free stack. The array never compacts.
    pub(crate) fn free_slot(&mut self, h: Handle) {
        let i = h.index() as usize;
        let Some(slot) = self.slots.get_mut(i) else {
            return;
        };
        if let Some(e) = slot.take() {
            if !e.meta.pending {
                self.live -= 1;
            }
        } else {
            return;
        }
        if i + 1 == self.slots.len() {
            self.slots.pop();
        } else {
            self.free.push(i as u32);
        }
    }

    /// Visit every live object's handle in index order, skipping holes and
    /// pending slots. The common traversal for marking and null scans.
    pub fn for_each_live(&self, mut f: impl FnMut(Handle)) {
        for i in 0..self.slots.len() {
            if let Some(h) = self.live_handle_at(i) {
                f(h);
            }
        }
    }

    /// Clear the spawn-frame bit on every occupied slot (end-of-frame)
    pub(crate) fn clear_spawn_flags(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.meta.just_spawned = false;
        }
    }

    #[inline]
    pub fn inactive(&self) -> bool {
        self.inactive
    }

    /// Enter shutdown mode; the per-object safety net stops scanning
    pub(crate) fn set_inactive(&mut self, inactive: bool) {
        self.inactive = inactive;
    }

    /// Indices of every occupied slot, pending included (shutdown drain)
    pub(crate) fn occupied_handles(&self) -> Vec<Handle> {
        (0..self.slots.len())
            .filter(|&i| self.slots[i].is_some())
            .map(|i| Handle(i as u32))
            .collect()
    }
}

impl Default for ObjectDirectory {
    fn default() -> Self {
        Self::new()
    }
}
