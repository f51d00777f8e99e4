//! Tests for scope.rs

use super::*;
use crate::cancel::CancellationToken;
use crate::for_loop::ForLoopConventionChecker;
use crate::options::ResolveOptions;
use sema_syntax::{Origin, SourceSet};

fn context(files: &[(&str, &str)]) -> ResolveContext {
    let mut set = SourceSet::with_builtins().expect("builtins parse");
    for &(name, text) in files {
        set.add_file(name, text, Origin::Source).expect("fixture parses");
    }
    ResolveContext::new(
        Rc::new(set),
        ResolveOptions::default(),
        Vec::new(),
        ForLoopConventionChecker,
        CancellationToken::new(),
    )
}

fn atom(ctx: &ResolveContext, text: &str) -> Atom {
    ctx.sources.interner().get(text).expect("name is interned")
}

fn value_at(ctx: &ResolveContext, node: NodeIndex, name: &str) -> Option<NodeIndex> {
    let scope = ctx.scope_at(node).expect("scope");
    let at = ctx.span(node).start;
    match ctx.lookup_value(&scope, atom(ctx, name), at).expect("lookup") {
        Some(ValueHit::Declaration(node)) => Some(node),
        Some(ValueHit::Member(_)) => panic!("expected a declaration"),
        None => None,
    }
}

#[test]
fn test_file_chain_layers() {
    let ctx = context(&[("main.sema", "package app\nval x = 1\n")]);
    let root = ctx.sources.file_by_name("main.sema").expect("file").root;
    let scope = ctx.scope_at(root).expect("file scope");
    assert_eq!(
        scope.kinds(),
        vec![
            ScopeKind::File,
            ScopeKind::ExplicitImports,
            ScopeKind::SamePackage,
            ScopeKind::StarImports,
            ScopeKind::DefaultImports,
        ]
    );
    let depths: Vec<u32> = scope.links().map(|link| link.depth).collect();
    assert_eq!(depths, vec![4, 3, 2, 1, 0]);
}

#[test]
fn test_block_local_shadows_import() {
    let ctx = context(&[
        ("lib.sema", "package lib\nval n: Int = 1\n"),
        (
            "main.sema",
            "package app\nimport lib.n\nfun f() {\n    val n = \"s\"\n    n\n}\nval m = n\n",
        ),
    ]);
    let sources = ctx.sources.clone();
    let imported = sources.find_declaration("lib.sema", "n").expect("lib n");
    let local = sources
        .find_by_text("main.sema", "val n = \"s\"")
        .expect("local n");

    let inner = sources.find_by_text("main.sema", "n").expect("inner use");
    assert_eq!(value_at(&ctx, inner, "n"), Some(local));

    let m = sources.find_declaration("main.sema", "m").expect("m");
    let NodeKind::Property(data) = ctx.kind(m).expect("kind") else {
        panic!("expected property");
    };
    assert_eq!(value_at(&ctx, data.initializer, "n"), Some(imported));
}

#[test]
fn test_block_declarations_are_sequential() {
    let ctx = context(&[(
        "main.sema",
        "val b = \"top\"\nfun g() {\n    val a = b\n    val b = 1\n}\n",
    )]);
    let sources = ctx.sources.clone();
    let top = sources.find_declaration("main.sema", "b").expect("top b");
    let a = sources.find_by_text("main.sema", "val a = b").expect("a");
    let NodeKind::Property(data) = ctx.kind(a).expect("kind") else {
        panic!("expected property");
    };
    assert_eq!(value_at(&ctx, data.initializer, "b"), Some(top));
}

#[test]
fn test_explicit_import_shadows_star_import() {
    let ctx = context(&[
        ("a.sema", "package a\nclass Box\nclass Only\n"),
        ("b.sema", "package b\nclass Box\n"),
        (
            "main.sema",
            "package app\nimport a.*\nimport b.Box\nimport b.Box as Crate\nval v: Box? = null\n",
        ),
    ]);
    let sources = ctx.sources.clone();
    let root = sources.file_by_name("main.sema").expect("file").root;
    let scope = ctx.scope_at(root).expect("file scope");
    let end = ctx.span(root).end;

    let b_box = sources.find_declaration("b.sema", "Box").expect("b.Box");
    let only = sources.find_declaration("a.sema", "Only").expect("a.Only");
    let classifier = |name: &str| {
        ctx.lookup_classifier(&scope, atom(&ctx, name), end)
            .expect("lookup")
    };
    assert_eq!(classifier("Box"), Some(b_box));
    assert_eq!(classifier("Crate"), Some(b_box));
    assert_eq!(classifier("Only"), Some(only));
    assert!(ctx.trace.borrow().diagnostics().is_empty());
}

#[test]
fn test_unresolved_import_is_reported() {
    let ctx = context(&[("main.sema", "package app\nimport lib.Missing\n")]);
    let root = ctx.sources.file_by_name("main.sema").expect("file").root;
    ctx.scope_at(root).expect("file scope");
    let diagnostics = ctx.trace.borrow().diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedReference);
    assert!(diagnostics[0].message_text.contains("lib.Missing"));
}

#[test]
fn test_class_body_has_implicit_receiver() {
    let ctx = context(&[("main.sema", "class C {\n    val p = 1\n    fun f() = p\n}\n")]);
    let sources = ctx.sources.clone();
    let use_site = sources.find_by_text("main.sema", "p").expect("p");
    let scope = ctx.scope_at(use_site).expect("scope");

    assert!(scope.kinds().contains(&ScopeKind::ClassMembers));
    assert!(scope.innermost_receiver().is_some());

    let hit = ctx
        .lookup_value(&scope, atom(&ctx, "p"), ctx.span(use_site).start)
        .expect("lookup");
    let Some(ValueHit::Member(member)) = hit else {
        panic!("expected a member property");
    };
    let p = sources.find_declaration("main.sema", "C.p").expect("C.p");
    assert_eq!(member.descriptor.node, p);
}

#[test]
fn test_scopes_are_memoized_per_owner() {
    let ctx = context(&[("main.sema", "fun f(x: Int) {\n    x\n    x\n}\n")]);
    let sources = ctx.sources.clone();
    let f = sources.find_declaration("main.sema", "f").expect("f");
    let NodeKind::Function(data) = ctx.kind(f).expect("kind") else {
        panic!("expected function");
    };
    let NodeKind::Block(block) = ctx.kind(data.body).expect("kind") else {
        panic!("expected block");
    };
    let first = ctx.scope_at(block.statements[0]).expect("scope");
    let second = ctx.scope_at(block.statements[1]).expect("scope");
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.kind, ScopeKind::Local);
    assert_eq!(
        first.parent.as_ref().map(|p| p.kind),
        Some(ScopeKind::FunctionParameters)
    );
}

#[test]
fn test_lookup_functions_keeps_every_overload() {
    let ctx = context(&[
        ("lib.sema", "package lib\nfun f(x: Long) = x\n"),
        (
            "main.sema",
            "package app\nimport lib.f\nfun f(x: Int) = x\nfun f(x: String) = x\nval r = f(1)\n",
        ),
    ]);
    let sources = ctx.sources.clone();
    let r = sources.find_declaration("main.sema", "r").expect("r");
    let NodeKind::Property(data) = ctx.kind(r).expect("kind") else {
        panic!("expected property");
    };
    let scope = ctx.scope_at(data.initializer).expect("scope");
    let found = ctx
        .lookup_functions(&scope, atom(&ctx, "f"), ctx.span(data.initializer).start)
        .expect("lookup");

    let lib_f = sources.find_declaration("lib.sema", "f").expect("lib f");
    let depths: Vec<u32> = found.iter().map(|(depth, _)| *depth).collect();
    assert_eq!(depths, vec![4, 4, 3]);
    assert_eq!(found[2].1, lib_f);
}
