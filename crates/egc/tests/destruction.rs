//! Deferred Destruction Tests
//!
//! These tests verify the two-phase destruction protocol:
//! - `destroy()` is deferred, idempotent, and takes the object off the live
//!   surface immediately
//! - the end-of-frame drain nulls every reference to the batch before any
//!   finalizer runs, and handles finalizer-requested destructions in the
//!   same frame
//! - `remove_now` and `shutdown` cover the immediate and teardown paths

mod common;

use common::{HeapFixture, Node};
use egc::{Handle, HeapError};

/// `destroy` defers reclamation and is idempotent.
#[test]
fn destroy_is_deferred_and_idempotent() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();

    assert!(fx.heap.destroy(a), "first destroy must queue");
    assert!(!fx.heap.destroy(a), "second destroy must be a no-op");

    // Queued but not reclaimed: the slot is occupied, access fails.
    assert_eq!(fx.drop_count(), 0);
    assert_eq!(fx.heap.live_count(), 0);
    assert_eq!(fx.heap.pending_count(), 1);
    assert!(matches!(
        fx.heap.get::<Node>(a),
        Err(HeapError::PendingDestruction(_))
    ));
}

/// The drain nulls references to the destroyed object, then frees it.
///
/// **Bug this finds:** dangling handles observable after the frame boundary
#[test]
fn end_frame_nulls_refs_and_frees() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    let b = fx.spawn();
    fx.heap.add_root(a).unwrap();
    fx.link_next(a, Some(b));

    fx.heap.destroy(b);
    fx.heap.end_frame();

    assert!(fx.heap.get::<Node>(a).unwrap().next.is_null());
    assert!(matches!(
        fx.heap.get::<Node>(b),
        Err(HeapError::UnknownHandle(_))
    ));
    assert_eq!(fx.drop_count(), 1);
    assert_eq!(fx.heap.stats().drained, 1);
}

/// One frame's destructions are nulled as a single batch: every live
/// reference to any member is cleared.
#[test]
fn batch_nulls_all_members() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    let b = fx.spawn();
    let c = fx.spawn();
    fx.heap.add_root(a).unwrap();
    fx.link_next(a, Some(b));
    fx.link_other(a, Some(c));

    fx.heap.destroy(b);
    fx.heap.destroy(c);
    fx.heap.end_frame();

    let a_ref = fx.heap.get::<Node>(a).unwrap();
    assert!(a_ref.next.is_null());
    assert!(a_ref.other.is_null());
    assert_eq!(fx.drop_count(), 2);
}

/// Destroying every member of a reference cycle terminates and reclaims
/// all of them.
///
/// **Bug this finds:** drain looping on intra-batch references
#[test]
fn destroying_entire_cycle_terminates() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    let b = fx.spawn();
    let c = fx.spawn();
    fx.link_next(a, Some(b));
    fx.link_next(b, Some(c));
    fx.link_next(c, Some(a));

    fx.heap.destroy(a);
    fx.heap.destroy(b);
    fx.heap.destroy(c);
    fx.heap.end_frame();

    assert_eq!(fx.drop_count(), 3);
    assert_eq!(fx.heap.pending_count(), 0);
    for h in [a, b, c] {
        assert!(fx.heap.get::<Node>(h).is_err());
    }
}

/// A finalizer may destroy further objects; they drain in the same frame.
#[test]
fn finalizer_destroys_child_same_frame() {
    let mut fx = HeapFixture::with_defaults();
    let child = fx.spawn();
    let spawner = fx.spawn_spawner(Some(child));

    fx.heap.destroy(spawner);
    fx.heap.end_frame();

    assert_eq!(
        fx.drop_count(),
        2,
        "finalizer-queued child must drain in the same frame"
    );
    assert_eq!(fx.heap.pending_count(), 0);
    assert!(fx.heap.get::<Node>(child).is_err());
}

/// `remove_now` reclaims without waiting for the frame boundary, still
/// nulling references first.
#[test]
fn remove_now_frees_immediately() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    let b = fx.spawn();
    fx.heap.add_root(a).unwrap();
    fx.link_next(a, Some(b));

    assert!(fx.heap.remove_now(b));
    assert!(!fx.heap.remove_now(b), "second removal must be a no-op");

    assert!(fx.heap.get::<Node>(a).unwrap().next.is_null());
    assert!(matches!(
        fx.heap.get::<Node>(b),
        Err(HeapError::UnknownHandle(_))
    ));
    assert_eq!(fx.drop_count(), 1);
}

/// The fix-up callback observes each drained batch.
#[test]
fn fixup_callback_sees_batch() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    let b = fx.spawn();
    fx.heap.destroy(a);
    fx.heap.destroy(b);

    let mut seen: Vec<Handle> = Vec::new();
    fx.heap.end_frame_with(|batch| {
        assert!(batch.contains(a));
        assert!(batch.contains(b));
        seen.extend_from_slice(batch.handles());
    });

    assert_eq!(seen.len(), 2);
    assert_eq!(seen, vec![a, b], "batch preserves destruction order");
}

/// Destroying a rooted object unroots it; the root set cannot keep a
/// pending object alive.
#[test]
fn destroy_removes_root() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    fx.heap.add_root(a).unwrap();

    fx.heap.destroy(a);
    assert!(fx.heap.roots().is_empty());

    fx.heap.end_frame();
    assert_eq!(fx.drop_count(), 1);
}

/// Pending objects cannot be rooted or stored into reference fields.
#[test]
fn pending_objects_reject_rooting_and_stores() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    let b = fx.spawn();
    fx.heap.destroy(b);

    assert!(matches!(
        fx.heap.add_root(b),
        Err(HeapError::PendingDestruction(_))
    ));
    assert!(matches!(
        fx.heap.store_ref(a, |n: &mut Node| &mut n.next, Some(b)),
        Err(HeapError::PendingDestruction(_))
    ));
}

/// The spawn-frame bit is set at insertion and cleared by the first drain.
#[test]
fn spawn_flag_clears_at_frame_end() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();

    assert!(fx.heap.directory().just_spawned(a));
    fx.heap.end_frame();
    assert!(!fx.heap.directory().just_spawned(a));
}

/// Shutdown finalizes every remaining object, pending or live.
#[test]
fn shutdown_finalizes_everything() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    let _b = fx.spawn();
    let c = fx.spawn();
    fx.heap.add_root(a).unwrap();
    fx.heap.destroy(c);

    fx.heap.shutdown();

    assert_eq!(fx.drop_count(), 3);
    assert_eq!(fx.heap.live_count(), 0);
    assert_eq!(fx.heap.pending_count(), 0);
    assert!(fx.heap.roots().is_empty());
}
