//! String interner for identifier deduplication.
//!
//! Names are interned once by the parse layer and passed around as `u32`
//! handles (`Atom`). The resolution core only reads from the interner; every
//! name it needs to synthesize (convention operators, implicit parameters,
//! built-in class names) is pre-interned by [`Interner::intern_common`].

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// An interned string identifier.
///
/// Atoms are cheap to copy and compare in O(1). Use [`Interner::resolve`]
/// to get the text back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// Sentinel for "no name" / the empty string.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Names the resolution core looks up without owning a mutable interner.
const COMMON_STRINGS: &[&str] = &[
    // Implicit names
    "it",
    "this",
    "invoke",
    "builtins",
    // Convention operators
    "plus",
    "minus",
    "times",
    "div",
    "rem",
    "compareTo",
    "equals",
    "not",
    "unaryMinus",
    "iterator",
    "hasNext",
    "next",
    // Built-in catalogue
    "Any",
    "Nothing",
    "Unit",
    "Boolean",
    "Int",
    "Long",
    "Double",
    "Char",
    "String",
    "Number",
    "Comparable",
    "Iterator",
    "Iterable",
    "Collection",
    "List",
    "MutableList",
    "Array",
    "Pair",
];

/// String interner that deduplicates strings and returns [`Atom`] handles.
///
/// ```
/// use sema_common::interner::Interner;
/// let mut interner = Interner::new();
/// let a1 = interner.intern("hello");
/// let a2 = interner.intern("hello");
/// assert_eq!(a1, a2);
/// assert_eq!(interner.resolve(a1), "hello");
/// ```
#[derive(Default)]
pub struct Interner {
    map: FxHashMap<Arc<str>, Atom>,
    /// Index 0 is the empty string.
    strings: Vec<Arc<str>>,
}

impl Interner {
    /// Create an interner with the empty string at index 0 and the common
    /// names pre-interned.
    pub fn new() -> Self {
        let mut interner = Interner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        let empty: Arc<str> = Arc::from("");
        interner.strings.push(empty.clone());
        interner.map.insert(empty, Atom::NONE);
        interner.intern_common();
        interner
    }

    /// Intern a string, returning the existing atom when already present.
    #[inline]
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(&atom) = self.map.get(s) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        self.strings.push(owned.clone());
        self.map.insert(owned, atom);
        atom
    }

    /// Look up a string without interning it.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Atom> {
        self.map.get(s).copied()
    }

    /// Like [`get`](Self::get) for names that [`intern_common`](Self::intern_common)
    /// guarantees to be present. Unknown names map to [`Atom::NONE`].
    #[inline]
    pub fn known(&self, s: &str) -> Atom {
        debug_assert!(self.map.contains_key(s), "`{s}` is not pre-interned");
        self.get(s).unwrap_or(Atom::NONE)
    }

    /// Resolve an atom back to its text. Out-of-range atoms resolve to "".
    #[inline]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.strings
            .get(atom.0 as usize)
            .map(|s| s.as_ref())
            .unwrap_or("")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }

    /// Join a dotted path such as a package name or a qualified type mention.
    pub fn join(&self, path: &[Atom]) -> String {
        let mut out = String::new();
        for (i, atom) in path.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(self.resolve(*atom));
        }
        out
    }

    fn intern_common(&mut self) {
        for s in COMMON_STRINGS {
            self.intern(s);
        }
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod interner_tests;
