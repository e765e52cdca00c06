//! Collection Cycle Tests
//!
//! These tests verify that the incremental collector:
//! - Reclaims unreachable objects (including cycles)
//! - Preserves everything reachable from the root set
//! - Keeps mid-cycle mutation safe through the write barrier
//! - Nulls references to pending-destruction objects instead of marking them

mod common;

use common::{HeapFixture, Node};
use egc::{Color, GcPhase, Handle};
use quickcheck_macros::quickcheck;

/// Unreachable objects are reclaimed by a full cycle.
///
/// **Bug this finds:** sweep skipping dead objects, white bookkeeping bugs
#[test]
fn unreachable_nodes_are_collected() {
    let mut fx = HeapFixture::eager();
    let a = fx.spawn();
    let b = fx.spawn();
    let c = fx.spawn();

    fx.heap.full_gc();

    assert_eq!(fx.drop_count(), 3, "all unrooted nodes must be reclaimed");
    for h in [a, b, c] {
        assert!(fx.heap.get::<Node>(h).is_err());
    }
    assert_eq!(fx.heap.live_count(), 0);
}

/// Rooted objects survive a full cycle.
///
/// **Bug this finds:** root set not seeding the gray list
#[test]
fn rooted_nodes_survive() {
    let mut fx = HeapFixture::eager();
    let a = fx.spawn();
    fx.heap.add_root(a).unwrap();

    fx.heap.full_gc();

    assert_eq!(fx.drop_count(), 0, "rooted node was collected");
    assert!(fx.heap.get::<Node>(a).is_ok());
}

/// Everything reachable through reference fields survives.
///
/// **Bug this finds:** reference thunks not traversed, flat-thunk bugs
#[test]
fn chain_reachable_from_root_survives() {
    let mut fx = HeapFixture::eager();
    let a = fx.spawn();
    let b = fx.spawn();
    let c = fx.spawn();
    fx.heap.add_root(a).unwrap();
    fx.link_next(a, Some(b));
    fx.link_next(b, Some(c));

    fx.heap.full_gc();

    assert_eq!(fx.drop_count(), 0);
    for h in [a, b, c] {
        assert!(fx.heap.get::<Node>(h).is_ok());
    }
}

/// An unreachable reference cycle is still garbage.
///
/// **Bug this finds:** tracing collector degraded to reference counting
#[test]
fn unreachable_cycle_is_collected() {
    let mut fx = HeapFixture::eager();
    let keep = fx.spawn();
    fx.heap.add_root(keep).unwrap();

    let a = fx.spawn();
    let b = fx.spawn();
    fx.link_next(a, Some(b));
    fx.link_next(b, Some(a));

    fx.heap.full_gc();

    assert_eq!(fx.drop_count(), 2, "cyclic garbage must be reclaimed");
    assert!(fx.heap.get::<Node>(keep).is_ok());
    assert!(fx.heap.get::<Node>(a).is_err());
    assert!(fx.heap.get::<Node>(b).is_err());
}

/// A store into an already-blackened object mid-Propagate must not lose
/// the new target.
///
/// **Bug this finds:** missing or mis-ordered write barrier
#[test]
fn write_barrier_preserves_mid_cycle_store() {
    let mut fx = HeapFixture::incremental();

    // A chain long enough that Propagate spans many steps.
    let root = fx.spawn();
    fx.heap.add_root(root).unwrap();
    let mut prev = root;
    for _ in 0..64 {
        let n = fx.spawn();
        fx.link_next(prev, Some(n));
        prev = n;
    }

    // Step until the root has been scanned but the cycle is still marking.
    while !(fx.heap.phase() == GcPhase::Propagate
        && fx.heap.directory().color(root) == Some(Color::Black))
    {
        assert!(fx.heap.gc_step(), "cycle stalled before root was scanned");
        assert_ne!(
            fx.heap.phase(),
            GcPhase::Sweep,
            "propagation finished before the test could mutate"
        );
    }

    // Black root gains a white child; only the barrier can save it.
    let late = fx.spawn();
    fx.link_other(root, Some(late));
    assert!(fx.heap.stats().barrier_grays >= 1, "barrier did not fire");

    fx.heap.full_gc();

    assert!(
        fx.heap.get::<Node>(late).is_ok(),
        "barrier lost a store into a black object"
    );
}

/// Marking nulls references whose target is queued for destruction,
/// instead of keeping the target alive.
///
/// **Bug this finds:** pending objects resurrected by the marker
#[test]
fn marking_nulls_refs_to_pending_objects() {
    let mut fx = HeapFixture::eager();
    let a = fx.spawn();
    let b = fx.spawn();
    fx.heap.add_root(a).unwrap();
    fx.link_next(a, Some(b));

    assert!(fx.heap.destroy(b));
    fx.heap.full_gc();

    assert!(
        fx.heap.get::<Node>(a).unwrap().next.is_null(),
        "marker must null references to pending objects"
    );
    assert!(fx.heap.stats().euthanized_refs >= 1);

    // The object itself is drained at the frame boundary, not swept.
    assert_eq!(fx.drop_count(), 0);
    fx.heap.end_frame();
    assert_eq!(fx.drop_count(), 1);
}

/// Below the trigger threshold the collector does nothing.
#[test]
fn collector_idle_under_threshold() {
    let mut fx = HeapFixture::with_defaults();
    fx.spawn();

    assert!(!fx.heap.gc_step(), "step did work below the threshold");
    assert_eq!(fx.heap.phase(), GcPhase::Pause);
    assert_eq!(fx.heap.stats().steps, 0);
}

/// Crossing the threshold starts a cycle on the next step.
#[test]
fn allocation_pressure_starts_cycle() {
    let mut fx = HeapFixture::eager();
    fx.spawn();

    assert!(fx.heap.gc_step());
    assert_eq!(fx.heap.phase(), GcPhase::Propagate);
}

/// A full cycle runs to completion and is counted exactly once.
#[test]
fn full_gc_completes_one_cycle() {
    let mut fx = HeapFixture::eager();
    let a = fx.spawn();
    fx.heap.add_root(a).unwrap();

    fx.heap.full_gc();

    assert_eq!(fx.heap.phase(), GcPhase::Pause);
    assert_eq!(fx.heap.stats().cycles, 1);
}

/// Property: after a full cycle, an object is accessible if and only if it
/// was reachable from the root set through reference fields.
#[quickcheck]
fn survival_equals_reachability(edges: Vec<(u8, u8)>, root_picks: Vec<u8>) -> bool {
    const N: usize = 12;
    let mut fx = HeapFixture::eager();
    let nodes: Vec<Handle> = (0..N).map(|_| fx.spawn()).collect();

    // Mirror the graph as plain indices to compute expected reachability.
    let mut mirror = vec![(None::<usize>, None::<usize>); N];
    for (i, &(a, b)) in edges.iter().enumerate() {
        let from = a as usize % N;
        let to = b as usize % N;
        if i % 2 == 0 {
            fx.link_next(nodes[from], Some(nodes[to]));
            mirror[from].0 = Some(to);
        } else {
            fx.link_other(nodes[from], Some(nodes[to]));
            mirror[from].1 = Some(to);
        }
    }

    let mut rooted = vec![false; N];
    for &r in &root_picks {
        let r = r as usize % N;
        rooted[r] = true;
        fx.heap.add_root(nodes[r]).unwrap();
    }

    fx.heap.full_gc();

    let mut reachable = rooted.clone();
    let mut stack: Vec<usize> = (0..N).filter(|&i| rooted[i]).collect();
    while let Some(i) = stack.pop() {
        for t in [mirror[i].0, mirror[i].1].into_iter().flatten() {
            if !reachable[t] {
                reachable[t] = true;
                stack.push(t);
            }
        }
    }

    (0..N).all(|i| fx.heap.get::<Node>(nodes[i]).is_ok() == reachable[i])
}
