//! Heap Facade Tests
//!
//! API-boundary behavior: typed access, error variants, registry queries
//! through the heap, and the diagnostics snapshot.

mod common;

use common::{HeapFixture, Node, Spawner};
use egc::{EngineObject, HeapError, ObjectHeap};

struct Stray;

impl EngineObject for Stray {
    fn class_name(&self) -> &'static str {
        "Stray"
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[test]
fn insert_requires_registered_class() {
    let mut heap = ObjectHeap::new();
    let err = heap.insert(Stray).unwrap_err();
    assert!(matches!(err, HeapError::UnregisteredClass(name) if name == "Stray"));
}

#[test]
fn typed_access_checks_class() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();

    assert!(fx.heap.get::<Node>(a).is_ok());
    let err = fx.heap.get::<Spawner>(a).unwrap_err();
    assert!(matches!(err, HeapError::ClassMismatch { actual: "Node", .. }));
}

#[test]
fn get_mut_mutates_payload() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();

    fx.heap.get_mut::<Node>(a).unwrap().hp = 7;
    assert_eq!(fx.heap.get::<Node>(a).unwrap().hp, 7);
}

#[test]
fn freed_handle_is_unknown() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    fx.heap.destroy(a);
    fx.heap.end_frame();

    assert!(matches!(
        fx.heap.get::<Node>(a),
        Err(HeapError::UnknownHandle(_))
    ));
    assert!(matches!(
        fx.heap.add_root(a),
        Err(HeapError::UnknownHandle(_))
    ));
}

#[test]
fn store_ref_accepts_null() {
    let mut fx = HeapFixture::with_defaults();
    let a = fx.spawn();
    let b = fx.spawn();
    fx.link_next(a, Some(b));

    fx.heap
        .store_ref(a, |n: &mut Node| &mut n.next, None)
        .unwrap();
    assert!(fx.heap.get::<Node>(a).unwrap().next.is_null());
}

#[test]
fn registry_queries_through_heap() {
    let fx = HeapFixture::with_defaults();
    let reg = fx.heap.registry();

    let object = reg.find("Object").unwrap();
    let node = reg.find("Node").unwrap();
    assert!(reg.is_descendant_of(node, object));
    assert!(reg.find("node").is_none());
    assert_eq!(reg.ifind("nOdE"), Some(node));

    let listing = reg.dump(None, true);
    assert_eq!(listing.len(), 3);
}

#[test]
fn diagnostics_reports_counts() {
    let mut fx = HeapFixture::with_defaults();
    fx.spawn();
    fx.spawn();

    let diag = fx.heap.diagnostics();
    assert_eq!(diag.get("live").map(String::as_str), Some("2"));
    assert_eq!(diag.get("phase").map(String::as_str), Some("Pause"));
    assert_eq!(diag.get("classes").map(String::as_str), Some("3"));
}
