//! RTTI Module - Class Registry
//!
//! Assigns stable identity to every native class and answers the queries
//! the collector needs once per pass over every live object:
//!
//! - name lookup (exact via hashed buckets, case-insensitive via linear
//!   scan for diagnostic paths)
//! - ancestor / descendant tests along the single-inheritance chain
//! - the flat reference-thunk list: the root-to-leaf concatenation of every
//!   ancestor's declared reference fields, memoized on first use
//!
//! Registration order across modules is not defined, so a declaration may
//! name a parent that has not been registered yet. [`ClassRegistry::link`]
//! resolves those forward references once all declarations are in; lookups
//! that depend on the parent chain panic before `link()` because that is a
//! startup-ordering bug, not a runtime condition.

use crate::object::{EngineObject, ObjRef};

/// Number of name-hash buckets. Fixed; chains stay short at the class
/// counts an engine registers (hundreds).
const HASH_BUCKETS: usize = 256;

/// Registration-assigned class identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reference-field accessor for one class.
///
/// Invoked by the collector with an object of exactly the declaring class
/// (or a descendant); reports each `ObjRef` field the class itself
/// declares. Built with [`crate::ref_fields!`].
pub type RefThunk = fn(&mut dyn EngineObject, &mut dyn FnMut(&mut ObjRef));

/// Factory producing a blank instance, used by diagnostic spawning and by
/// thunk validation at link time.
pub type ClassFactory = fn() -> Box<dyn EngineObject>;

/// A class declaration handed to [`ClassRegistry::register`]
///
/// # Examples
///
/// ```rust
/// use egc::rtti::{ClassDecl, ClassRegistry};
/// use egc::object::{EngineObject, ObjRef};
/// use egc::ref_fields;
///
/// struct Actor { target: ObjRef }
/// # impl EngineObject for Actor {
/// #     fn class_name(&self) -> &'static str { "Actor" }
/// #     fn as_any(&self) -> &dyn std::any::Any { self }
/// #     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
/// # }
///
/// let mut registry = ClassRegistry::new();
/// registry.register(ClassDecl {
///     name: "Object",
///     parent: None,
///     size: 0,
///     refs: None,
///     factory: None,
/// });
/// registry.register(ClassDecl {
///     name: "Actor",
///     parent: Some("Object"),
///     size: std::mem::size_of::<Actor>(),
///     refs: Some(ref_fields!(Actor: target)),
///     factory: None,
/// });
/// registry.link();
/// assert!(registry.find("Actor").is_some());
/// ```
#[derive(Clone, Copy)]
pub struct ClassDecl {
    /// Class name; registering the same name twice is fatal
    pub name: &'static str,
    /// Parent class name; `None` only for the root of the class tree.
    /// May name a class registered later (resolved by `link()`).
    pub parent: Option<&'static str>,
    /// Instance size in bytes (`std::mem::size_of::<T>()`); feeds the
    /// collector's allocation-pressure estimate
    pub size: usize,
    /// Accessor for the reference fields this class itself declares
    pub refs: Option<RefThunk>,
    /// Optional blank-instance factory
    pub factory: Option<ClassFactory>,
}

/// A registered class descriptor
pub struct ClassDesc {
    name: &'static str,
    parent_name: Option<&'static str>,
    parent: Option<ClassId>,
    size: usize,
    own_refs: Option<RefThunk>,
    factory: Option<ClassFactory>,
    /// Root-to-leaf concatenation of ancestor thunks; built lazily
    flat: Option<Vec<RefThunk>>,
}

impl ClassDesc {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }
}

/// Process-wide class table (owned by the heap context, not a global)
pub struct ClassRegistry {
    descs: Vec<ClassDesc>,
    /// Name-hash buckets; each chain holds descriptor indices sorted
    /// lexicographically by name so lookups can stop early and duplicate
    /// registration is caught during insertion
    buckets: Vec<Vec<u32>>,
    linked: bool,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            descs: Vec::with_capacity(32),
            buckets: vec![Vec::new(); HASH_BUCKETS],
            linked: false,
        }
    }

    /// Register a class declaration
    ///
    /// # Panics
    /// Panics if a class of the same name is already registered. That is a
    /// programmer error; there is nothing to recover.
    pub fn register(&mut self, decl: ClassDecl) -> ClassId {
        let id = ClassId(self.descs.len() as u32);
        let bucket = &mut self.buckets[name_hash(decl.name)];

        let mut at = bucket.len();
        for (i, &idx) in bucket.iter().enumerate() {
            match self.descs[idx as usize].name.cmp(decl.name) {
                std::cmp::Ordering::Equal => {
                    panic!("attempt to register class '{}' twice", decl.name)
                }
                std::cmp::Ordering::Greater => {
                    at = i;
                    break;
                }
                std::cmp::Ordering::Less => {}
            }
        }
        bucket.insert(at, id.0);

        self.descs.push(ClassDesc {
            name: decl.name,
            parent_name: decl.parent,
            parent: None,
            size: decl.size,
            own_refs: decl.refs,
            factory: decl.factory,
            flat: None,
        });
        self.linked = false;
        id
    }

    /// Resolve parent links and validate reference thunks.
    ///
    /// Call once after the registration phase. Safe to call again after
    /// late registrations.
    ///
    /// # Panics
    /// Panics if a declaration names a parent that was never registered.
    pub fn link(&mut self) {
        for i in 0..self.descs.len() {
            if let Some(pname) = self.descs[i].parent_name {
                let pid = self.find(pname).unwrap_or_else(|| {
                    panic!(
                        "class '{}' names unregistered parent '{}'",
                        self.descs[i].name, pname
                    )
                });
                self.descs[i].parent = Some(pid);
            }
        }
        self.linked = true;
        self.validate_thunks();
    }

    /// Run each class's own thunk against a factory-built blank instance.
    ///
    /// Catches a thunk pasted onto the wrong class at startup instead of
    /// mid-collection. Classes without a factory are skipped.
    fn validate_thunks(&mut self) {
        for i in 0..self.descs.len() {
            let (Some(factory), Some(thunk)) = (self.descs[i].factory, self.descs[i].own_refs)
            else {
                continue;
            };
            let mut blank = factory();
            let mut count = 0usize;
            thunk(blank.as_mut(), &mut |_r| count += 1);
            let bytes = count * std::mem::size_of::<ObjRef>();
            if bytes > self.descs[i].size {
                panic!(
                    "class '{}' declares {} reference fields but is only {} bytes",
                    self.descs[i].name, count, self.descs[i].size
                );
            }
        }
    }

    /// Exact, case-sensitive lookup
    ///
    /// Walks the sorted bucket chain and stops as soon as the ordering
    /// rules out a match. Unknown names return `None`, never panic.
    pub fn find(&self, name: &str) -> Option<ClassId> {
        let bucket = &self.buckets[name_hash(name)];
        for &idx in bucket {
            match self.descs[idx as usize].name.cmp(name) {
                std::cmp::Ordering::Equal => return Some(ClassId(idx)),
                std::cmp::Ordering::Greater => return None,
                std::cmp::Ordering::Less => {}
            }
        }
        None
    }

    /// Case-insensitive lookup.
    ///
    /// Linear over all classes; this is a console/diagnostic path and is
    /// deliberately unindexed.
    pub fn ifind(&self, name: &str) -> Option<ClassId> {
        self.descs
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name))
            .map(|i| ClassId(i as u32))
    }

    #[inline]
    pub fn desc(&self, id: ClassId) -> &ClassDesc {
        &self.descs[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// Is `ancestor` on `class`'s parent chain (inclusive)?
    ///
    /// `is_ancestor_of(a, b) == is_descendant_of(b, a)` and every class is
    /// its own ancestor and descendant.
    pub fn is_ancestor_of(&self, ancestor: ClassId, class: ClassId) -> bool {
        self.is_descendant_of(class, ancestor)
    }

    /// Is `class` equal to or derived from `ancestor`?
    pub fn is_descendant_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        assert!(self.linked, "class registry used before link()");
        let mut cur = Some(class);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.descs[id.index()].parent;
        }
        false
    }

    /// The flat reference-thunk list for `id`: every ancestor's own thunk,
    /// root first, then the class's own. Memoized; the chain never changes
    /// after registration.
    pub fn flat_refs(&mut self, id: ClassId) -> &[RefThunk] {
        assert!(self.linked, "class registry used before link()");
        if self.descs[id.index()].flat.is_none() {
            let mut chain = Vec::new();
            let mut cur = Some(id);
            while let Some(c) = cur {
                chain.push(c);
                cur = self.descs[c.index()].parent;
            }
            chain.reverse();
            let flat: Vec<RefThunk> = chain
                .into_iter()
                .filter_map(|c| self.descs[c.index()].own_refs)
                .collect();
            self.descs[id.index()].flat = Some(flat);
        }
        self.descs[id.index()].flat.as_deref().unwrap()
    }

    /// Construct a blank instance if the class declared a factory
    pub fn create(&self, id: ClassId) -> Option<Box<dyn EngineObject>> {
        self.descs[id.index()].factory.map(|f| f())
    }

    /// All classes equal to or derived from `root`, in registration order
    pub fn descendants_of(&self, root: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.descs.len() as u32)
            .map(ClassId)
            .filter(move |&id| self.is_descendant_of(id, root))
    }

    /// Human-readable class listing, one line per class; the primitive
    /// behind the `dumpclasses` console command.
    ///
    /// With a `filter`, lists that class and its subtree; `all = false`
    /// limits the subtree to direct children of the filter.
    pub fn dump(&self, filter: Option<ClassId>, all: bool) -> Vec<String> {
        let mut lines = Vec::new();
        for i in 0..self.descs.len() as u32 {
            let id = ClassId(i);
            let d = &self.descs[id.index()];
            let include = match filter {
                None => true,
                Some(root) if all => self.is_descendant_of(id, root),
                Some(root) => id == root || d.parent == Some(root),
            };
            if !include {
                continue;
            }
            let parent = d
                .parent
                .map(|p| self.descs[p.index()].name)
                .unwrap_or("(root)");
            lines.push(format!("{} ({} bytes) <- {}", d.name, d.size, parent));
        }
        lines
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling hash over the class name, folded into the bucket range
fn name_hash(name: &str) -> usize {
    let mut h: u32 = 0;
    for b in name.bytes() {
        h = h.rotate_left(4) ^ u32::from(b);
    }
    (h as usize) % HASH_BUCKETS
}
