//! # EGC - Engine Object Heap with Incremental Garbage Collection
//!
//! EGC is the object layer of a game engine: a registry of native classes,
//! a directory of tracked objects, a Lua-derived incremental tri-color
//! collector, and a deferred mass-destruction queue. It is built for
//! frame-based programs that want bounded GC work per frame rather than
//! maximum throughput.
//!
//! ## Overview
//!
//! - **Class registry**: every native class registers a name, a parent, an
//!   instance size and a reference-field accessor; lookups by name, ancestry
//!   tests, and the flattened reference list drive everything else
//! - **Object directory**: dense growable table of `Box<dyn EngineObject>`
//!   with index-stable handles; holes are recycled, never compacted
//! - **Incremental collector**: Pause / Propagate / Sweep / Finalize state
//!   machine with a write barrier and a per-step work budget
//! - **Deferred destruction**: `destroy()` queues; the end-of-frame drain
//!   nulls every reference to the batch in one scan, then finalizes
//!
//! ## Quick Start
//!
//! ```rust
//! use egc::{ClassDecl, EngineObject, ObjRef, ObjectHeap};
//!
//! struct Actor {
//!     target: ObjRef,
//!     health: i32,
//! }
//!
//! impl EngineObject for Actor {
//!     fn class_name(&self) -> &'static str { "Actor" }
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
//! }
//!
//! let mut heap = ObjectHeap::new();
//! heap.register_class(ClassDecl {
//!     name: "Actor",
//!     parent: None,
//!     size: std::mem::size_of::<Actor>(),
//!     refs: Some(egc::ref_fields!(Actor: target)),
//!     factory: None,
//! });
//! heap.link_classes();
//!
//! let player = heap.insert(Actor { target: ObjRef::none(), health: 100 }).unwrap();
//! let monster = heap.insert(Actor { target: ObjRef::none(), health: 20 }).unwrap();
//! heap.add_root(player).unwrap();
//!
//! // Reference stores run the write barrier.
//! heap.store_ref(monster, |a: &mut Actor| &mut a.target, Some(player)).unwrap();
//!
//! // Deferred destruction: queued now, reclaimed at the frame boundary,
//! // with every reference to it nulled first.
//! heap.destroy(monster);
//! heap.end_frame();
//! assert!(heap.get::<Actor>(monster).is_err());
//! ```
//!
//! ## Collection Cycle
//!
//! 1. **Pause**: idle until the live-byte estimate passes the threshold
//! 2. **Propagate**: drain the gray set, a budgeted amount per `step()`;
//!    references to pending-destruction objects are nulled here instead of
//!    followed
//! 3. **Sweep**: walk the directory in slices, freeing objects left in the
//!    previous white; the current white flips when Propagate completes, so
//!    allocations made during the sweep survive it unexamined
//! 4. **Finalize**: recompute the threshold from the surviving estimate
//!
//! ## Safety
//!
//! The crate is safe Rust; incremental correctness rests on two caller
//! contracts:
//!
//! 1. **Reference stores go through [`ObjectHeap::store_ref`]** once an
//!    object has been inserted, so the write barrier runs
//! 2. **Bare handles are not roots**: a `Handle` in a local keeps nothing
//!    alive; register long-lived entry points with [`ObjectHeap::add_root`]
//!
//! Violations cannot corrupt memory (a stale handle is an `Err`, never a
//! dangling pointer), but they can reclaim objects early.
//!
//! ## Modules
//!
//! - [`config`]: collector tuning parameters and validation
//! - [`destroy`]: destruction batches and finalizer context
//! - [`directory`]: the index-stable object table and GC metadata
//! - [`error`]: error types for all heap operations
//! - [`gc`]: the incremental collection state machine
//! - [`heap`]: the injected heap context tying it all together
//! - [`object`]: `EngineObject`, handles and reference fields
//! - [`rtti`]: the class registry
//! - [`stats`]: collector counters
//!
//! ## Limitations
//!
//! - Single-threaded: one heap context serves one thread; "incremental"
//!   means interruptible, not concurrent
//! - Precise only through declared thunks: an `ObjRef` a class forgets to
//!   declare is invisible to the collector

// Core object model
pub mod directory;
pub mod object;
pub mod rtti;

// Collection
pub mod config;
pub mod destroy;
pub mod gc;

// Context and monitoring
pub mod error;
pub mod heap;
pub mod stats;

// Re-export main types for convenience
pub use config::GcTuning;
pub use destroy::{FinalizeCtx, PendingBatch};
pub use directory::Color;
pub use error::{HeapError, Result};
pub use gc::GcPhase;
pub use heap::ObjectHeap;
pub use object::{EngineObject, Handle, ObjRef};
pub use rtti::{ClassDecl, ClassId, ClassRegistry};
pub use stats::GcStats;

/// EGC version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
