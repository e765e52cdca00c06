//! Test Utilities for the Object Heap Test Suite
//!
//! Provides a heap fixture with a small registered class tree and a
//! drop-counting object type, so tests can assert both API-visible state
//! (handles, errors, colors) and actual reclamation (Drop ran).

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use egc::destroy::FinalizeCtx;
use egc::{ClassDecl, EngineObject, GcTuning, Handle, ObjRef, ObjectHeap};

/// A linkable test object with two reference fields and a payload.
///
/// Increments the fixture's shared counter when dropped, which happens
/// exactly once, when the directory releases the slot.
pub struct Node {
    pub next: ObjRef,
    pub other: ObjRef,
    pub hp: i32,
    drops: Rc<Cell<usize>>,
}

impl Node {
    pub fn new(drops: Rc<Cell<usize>>) -> Self {
        Self {
            next: ObjRef::none(),
            other: ObjRef::none(),
            hp: 100,
            drops,
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

impl EngineObject for Node {
    fn class_name(&self) -> &'static str {
        "Node"
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Test object whose finalizer destroys its child before chaining.
///
/// Exercises re-entrant destruction from inside the drain.
#[derive(Debug)]
pub struct Spawner {
    pub child: ObjRef,
    drops: Rc<Cell<usize>>,
}

impl Spawner {
    pub fn new(child: Option<Handle>, drops: Rc<Cell<usize>>) -> Self {
        Self {
            child: child.map_or(ObjRef::none(), ObjRef::to),
            drops,
        }
    }
}

impl Drop for Spawner {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

impl EngineObject for Spawner {
    fn class_name(&self) -> &'static str {
        "Spawner"
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
    fn finalize(&mut self, ctx: &mut FinalizeCtx<'_>) {
        if let Some(child) = self.child.get() {
            ctx.destroy(child);
        }
        self.finalize_base(ctx);
    }
}

/// Test fixture: a heap with the `Object` / `Node` / `Spawner` class tree
/// registered and linked, plus a shared drop counter.
pub struct HeapFixture {
    pub heap: ObjectHeap,
    pub drops: Rc<Cell<usize>>,
}

impl HeapFixture {
    /// Default collector tuning; cycles only start under real pressure
    pub fn with_defaults() -> Self {
        Self::with_tuning(GcTuning::default())
    }

    /// Threshold of one byte: every `gc_step` makes progress
    pub fn eager() -> Self {
        Self::with_tuning(GcTuning {
            initial_threshold: 1,
            min_threshold: 1,
            ..Default::default()
        })
    }

    /// Eager start with a tiny propagation budget, so Propagate spans
    /// several steps and mid-cycle mutation can be exercised
    pub fn incremental() -> Self {
        Self::with_tuning(GcTuning {
            step_mul: 25,
            initial_threshold: 1,
            min_threshold: 1,
            ..Default::default()
        })
    }

    pub fn with_tuning(tuning: GcTuning) -> Self {
        let mut heap = ObjectHeap::with_tuning(tuning).expect("test tuning should validate");
        heap.register_class(ClassDecl {
            name: "Object",
            parent: None,
            size: 0,
            refs: None,
            factory: None,
        });
        heap.register_class(ClassDecl {
            name: "Node",
            parent: Some("Object"),
            size: std::mem::size_of::<Node>(),
            refs: Some(egc::ref_fields!(Node: next, other)),
            factory: None,
        });
        heap.register_class(ClassDecl {
            name: "Spawner",
            parent: Some("Object"),
            size: std::mem::size_of::<Spawner>(),
            refs: Some(egc::ref_fields!(Spawner: child)),
            factory: None,
        });
        heap.link_classes();
        Self {
            heap,
            drops: Rc::new(Cell::new(0)),
        }
    }

    pub fn spawn(&mut self) -> Handle {
        self.heap
            .insert(Node::new(self.drops.clone()))
            .expect("Node is registered")
    }

    pub fn spawn_spawner(&mut self, child: Option<Handle>) -> Handle {
        self.heap
            .insert(Spawner::new(child, self.drops.clone()))
            .expect("Spawner is registered")
    }

    /// Barriered store into `from.next`
    pub fn link_next(&mut self, from: Handle, to: Option<Handle>) {
        self.heap
            .store_ref(from, |n: &mut Node| &mut n.next, to)
            .expect("store into a live Node");
    }

    /// Barriered store into `from.other`
    pub fn link_other(&mut self, from: Handle, to: Option<Handle>) {
        self.heap
            .store_ref(from, |n: &mut Node| &mut n.other, to)
            .expect("store into a live Node");
    }

    pub fn drop_count(&self) -> usize {
        self.drops.get()
    }
}
