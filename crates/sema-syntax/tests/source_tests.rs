//! Tests for source.rs

use super::*;

#[test]
fn test_builtins_catalogue_parses() {
    let set = SourceSet::with_builtins().expect("builtins parse");
    let id = set.builtins_file().expect("builtins file");
    let file = set.file(id).expect("file");
    assert_eq!(set.interner().join(&file.package), "builtins");

    let classes: Vec<_> = set
        .classes(file.root)
        .into_iter()
        .map(|c| set.interner().resolve(set.arena().declaration_name(c)).to_string())
        .collect();
    for expected in ["Any", "Nothing", "Int", "String", "List", "MutableList", "Pair"] {
        assert!(classes.iter().any(|c| c == expected), "missing {expected}");
    }
    let list_of = set.find_declaration("builtins.sema", "listOf").expect("listOf");
    assert!(set.is_builtin(list_of));
    assert_eq!(set.package_files(&file.package), vec![file.root]);
}

#[test]
fn test_duplicate_file_is_rejected() {
    let mut set = SourceSet::new();
    set.add_file("a.sema", "val x = 1", Origin::Source).expect("first");
    let err = set
        .add_file("a.sema", "val y = 2", Origin::Source)
        .expect_err("duplicate");
    assert_eq!(err, ParseError::DuplicateFile("a.sema".to_string()));
}

#[test]
fn test_origin_and_text_of() {
    let mut set = SourceSet::new();
    set.add_file("java.sema", "package ext\nfun name(): String", Origin::Platform)
        .expect("platform file");
    set.add_file("main.sema", "package app\nval n = name()", Origin::Source)
        .expect("source file");

    let name = set.find_declaration("java.sema", "name").expect("name");
    assert_eq!(set.origin_of(name), Origin::Platform);
    assert_eq!(set.text_of(name), "fun name(): String");

    let n = set.find_declaration("main.sema", "n").expect("n");
    assert_eq!(set.origin_of(n), Origin::Source);
    let call = set.find_by_text("main.sema", "name()").expect("call");
    let file = set.file_of(call).expect("file");
    let pos = file.position(set.arena().span(call).start);
    assert_eq!((pos.line, pos.column), (2, 9));
}

#[test]
fn test_packages_group_files() {
    let mut set = SourceSet::new();
    set.add_file("a.sema", "package p\nval a = 1", Origin::Source).expect("a");
    set.add_file("b.sema", "package p\nval b = 2", Origin::Source).expect("b");
    set.add_file("c.sema", "val c = 3", Origin::Source).expect("c");
    let p = set.package_of(set.files()[0].root);
    assert_eq!(set.package_files(&p).len(), 2);
    assert_eq!(set.package_files(&[]).len(), 1);
    assert_eq!(set.file_roots().len(), 3);
}

#[test]
fn test_find_declaration_missing_segment() {
    let mut set = SourceSet::new();
    set.add_file("a.sema", "class A { fun f() {} }", Origin::Source)
        .expect("a");
    assert!(set.find_declaration("a.sema", "A.f").is_some());
    assert!(set.find_declaration("a.sema", "A.g").is_none());
    assert!(set.find_declaration("a.sema", "B").is_none());
    assert!(set.find_declaration("missing.sema", "A").is_none());
}
