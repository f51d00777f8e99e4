use super::*;

#[test]
fn test_intern_deduplicates() {
    let mut interner = Interner::new();
    let a = interner.intern("Foo");
    let b = interner.intern("Foo");
    let c = interner.intern("Bar");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.resolve(c), "Bar");
}

#[test]
fn test_empty_string_is_none_atom() {
    let mut interner = Interner::new();
    assert!(interner.intern("").is_none());
    assert_eq!(interner.resolve(Atom::NONE), "");
}

#[test]
fn test_common_names_are_preinterned() {
    let interner = Interner::new();
    let plus = interner.get("plus").expect("plus is pre-interned");
    assert_eq!(interner.resolve(plus), "plus");
    assert_eq!(interner.known("iterator"), interner.get("iterator").unwrap());
    assert!(interner.get("definitelyNotInterned").is_none());
}

#[test]
fn test_join_path() {
    let mut interner = Interner::new();
    let path = [interner.intern("a"), interner.intern("b"), interner.intern("C")];
    assert_eq!(interner.join(&path), "a.b.C");
    assert_eq!(interner.join(&[]), "");
}
