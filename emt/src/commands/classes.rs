//! Class registry commands - `dump-classes` over the demo registry
//!
//! The tool carries a small built-in class tree so registry queries can be
//! exercised without an engine attached.

use egc::{ClassDecl, ClassRegistry};

use crate::error::{EmtError, Result};

/// A representative engine class tree
pub fn demo_registry() -> ClassRegistry {
    let mut reg = ClassRegistry::new();
    let classes: [(&str, Option<&str>, usize); 8] = [
        ("Object", None, 0),
        ("Thinker", Some("Object"), 48),
        ("Actor", Some("Thinker"), 424),
        ("PlayerPawn", Some("Actor"), 512),
        ("Inventory", Some("Actor"), 456),
        ("Weapon", Some("Inventory"), 480),
        ("Ammo", Some("Inventory"), 456),
        ("Key", Some("Inventory"), 456),
    ];
    for (name, parent, size) in classes {
        reg.register(ClassDecl {
            name,
            parent,
            size,
            refs: None,
            factory: None,
        });
    }
    reg.link();
    reg
}

/// `emt dump-classes [filter] [--all]`
pub fn run_dump_classes(filter: Option<&str>, all: bool) -> Result<()> {
    let reg = demo_registry();
    let root = match filter {
        Some(name) => Some(
            reg.ifind(name)
                .ok_or_else(|| EmtError::UnknownClass(name.to_string()))?,
        ),
        None => None,
    };
    let lines = reg.dump(root, all);
    let count = lines.len();
    for line in lines {
        println!("{line}");
    }
    println!("{count} classes");
    Ok(())
}
