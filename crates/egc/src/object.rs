//! Object Module - Tracked Objects and References
//!
//! Everything the collector manages implements [`EngineObject`]. Objects
//! live in the [`ObjectDirectory`](crate::directory::ObjectDirectory) and
//! point at each other through [`ObjRef`] fields, which hold directory
//! indices rather than raw pointers.
//!
//! The collector discovers reference fields through per-class accessor
//! thunks (see [`crate::rtti`]); it holds no per-type knowledge of its own.
//!
//! # Safety rules
//!
//! The heap is safe Rust, but correctness of incremental collection depends
//! on two caller contracts:
//!
//! 1. **Stores go through the heap.** Once an object has been inserted,
//!    assign its `ObjRef` fields via
//!    [`ObjectHeap::store_ref`](crate::heap::ObjectHeap::store_ref) so the
//!    write barrier runs. Initializing fields before insertion is free.
//! 2. **Bare handles are not roots.** A `Handle` held only in a local
//!    variable does not keep its object alive; register it with
//!    [`ObjectHeap::add_root`](crate::heap::ObjectHeap::add_root) if it must
//!    survive a collection.

use std::any::Any;

use crate::destroy::FinalizeCtx;

/// Index of a tracked object in the object directory.
///
/// Handles are plain copyable ids. A handle stays valid from insertion
/// until the object is finalized; the directory guarantees the index is
/// not recycled while the object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub(crate) u32);

impl Handle {
    /// Directory slot index
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A nullable reference field from one tracked object to another.
///
/// `ObjRef` is the only link type the collector traverses. Fields of this
/// type are reported to the GC by the owning class's reference thunk.
///
/// # Examples
///
/// ```rust
/// use egc::object::ObjRef;
///
/// let r = ObjRef::none();
/// assert!(r.is_null());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjRef {
    target: Option<Handle>,
}

impl ObjRef {
    /// A null reference
    #[inline]
    pub const fn none() -> Self {
        Self { target: None }
    }

    /// A reference to `h`
    ///
    /// Intended for initializing fields before the object is inserted;
    /// afterwards use `ObjectHeap::store_ref`.
    #[inline]
    pub const fn to(h: Handle) -> Self {
        Self { target: Some(h) }
    }

    /// Current target, if any
    #[inline]
    pub fn get(&self) -> Option<Handle> {
        self.target
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.target.is_none()
    }

    /// Null the reference. Nulling never breaks the tri-color invariant,
    /// so this is safe without a barrier.
    #[inline]
    pub fn clear(&mut self) {
        self.target = None;
    }

    #[inline]
    pub(crate) fn set(&mut self, target: Option<Handle>) {
        self.target = target;
    }
}

/// A unit tracked by the object directory and the collector.
///
/// Implementors supply their registered class name, `Any` accessors for
/// typed retrieval, and optionally a finalizer. Reference fields are
/// declared separately, on the class descriptor, via [`crate::ref_fields!`].
///
/// # Finalizers
///
/// `finalize` runs exactly once, either from the end-of-frame destruction
/// drain or from the sweep phase. An override **must** chain to
/// `finalize_base` (the drain logs a BUG diagnostic naming the class when
/// the chain is missed). Finalizers may request further destructions
/// through the context; those are drained in the same frame.
pub trait EngineObject: Any {
    /// Name this object was registered under in the type registry
    fn class_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Teardown hook. Override to release non-object resources or to
    /// destroy owned children; always chain to `finalize_base`.
    fn finalize(&mut self, ctx: &mut FinalizeCtx<'_>) {
        self.finalize_base(ctx);
    }

    /// Base teardown. Do not override; call it from `finalize` overrides.
    fn finalize_base(&mut self, ctx: &mut FinalizeCtx<'_>) {
        ctx.note_chained();
    }
}

/// Declare the reference thunk for a class: a function that reports every
/// `ObjRef` field the class itself declares (ancestors declare their own).
///
/// Expands to a [`crate::rtti::RefThunk`] suitable for
/// [`crate::rtti::ClassDecl::refs`].
///
/// # Examples
///
/// ```rust
/// use egc::object::{EngineObject, ObjRef};
/// use egc::ref_fields;
///
/// struct Actor {
///     target: ObjRef,
///     tracer: ObjRef,
///     health: i32,
/// }
/// # impl EngineObject for Actor {
/// #     fn class_name(&self) -> &'static str { "Actor" }
/// #     fn as_any(&self) -> &dyn std::any::Any { self }
/// #     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
/// # }
///
/// let thunk = ref_fields!(Actor: target, tracer);
/// ```
#[macro_export]
macro_rules! ref_fields {
    ($ty:ty : $($field:ident),+ $(,)?) => {{
        fn thunk(
            obj: &mut dyn $crate::object::EngineObject,
            visit: &mut dyn FnMut(&mut $crate::object::ObjRef),
        ) {
            let it = obj
                .as_any_mut()
                .downcast_mut::<$ty>()
                .expect(concat!(
                    "reference thunk for ",
                    stringify!($ty),
                    " applied to another class"
                ));
            $( visit(&mut it.$field); )+
        }
        thunk as $crate::rtti::RefThunk
    }};
}
