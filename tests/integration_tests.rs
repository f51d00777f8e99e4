//! Integration tests for the resolution pipeline
//!
//! These tests drive the public façade end to end:
//! - Parsing several files into one source set
//! - Lazy resolution of single elements
//! - Whole-program resolution and diagnostics

use sema::{
    CallRole, DiagnosticKind, NodeKind, Origin, ResolveOptions, ResolveSession, SourceSet,
};

/// Helper to build a session over `(name, text)` source files
fn session(files: &[(&str, &str)]) -> ResolveSession {
    let mut sources = SourceSet::with_builtins().expect("built-ins parse");
    for &(name, text) in files {
        sources
            .add_file(name, text, Origin::Source)
            .expect("fixture parses");
    }
    ResolveSession::builder(sources).build()
}

#[test]
fn test_clean_program_has_no_diagnostics() {
    let session = session(&[(
        "main.sema",
        "package app\n\nclass Stack<T>(val items: MutableList<T>) {\n    fun push(item: T): Boolean = items.add(item)\n    fun peek(): T = items.last()\n}\n\nfun sum(xs: List<Int>): Int {\n    var total = 0\n    for (x in xs) {\n        total = total + x\n    }\n    return total\n}\n\nval stack = Stack(mutableListOf(1, 2))\nval top = stack.peek()\nval total = sum(listOf(1, 2, 3))\n",
    )]);
    session.resolve_all().expect("resolves");
    assert!(session.diagnostics().is_empty(), "{:?}", session.diagnostics());

    let top = session
        .sources()
        .find_declaration("main.sema", "top")
        .expect("top");
    let property = session.property_descriptor(top).expect("property");
    let ty = session.property_type(&property).expect("type");
    assert_eq!(session.render_type(ty), "Int");
}

#[test]
fn test_cross_file_resolution() {
    let session = session(&[
        (
            "shapes.sema",
            "package shapes\n\nopen class Shape(val name: String)\n\nclass Square(val side: Int) : Shape(\"square\") {\n    fun area(): Int = side * side\n}\n",
        ),
        (
            "main.sema",
            "package app\n\nimport shapes.Square\n\nval area = Square(3).area()\nval name: String = Square(2).name\n",
        ),
    ]);
    session.resolve_all().expect("resolves");
    assert!(session.diagnostics().is_empty(), "{:?}", session.diagnostics());

    let area = session
        .sources()
        .find_declaration("main.sema", "area")
        .expect("area");
    let Some(NodeKind::Property(data)) = session.sources().arena().kind(area) else {
        panic!("expected property");
    };
    let slice = session.resolve_to_element(data.initializer).expect("slice");
    let call = slice.call(data.initializer).expect("area() call");
    assert_eq!(session.name_of(call.callee).as_deref(), Some("area"));
    assert!(
        session
            .binding_context()
            .get_call(data.initializer, CallRole::Direct)
            .is_some()
    );
}

#[test]
fn test_diagnostics_serialize_to_json() {
    let session = session(&[("main.sema", "val s: String = 1\n")]);
    session.resolve_all().expect("resolves");
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::TypeMismatch);

    let json = serde_json::to_value(&diagnostics[0]).expect("serializes");
    assert_eq!(json["file"], "main.sema");
    assert_eq!(json["code"], diagnostics[0].code);
}

#[test]
fn test_options_from_json_drive_session() {
    let options = ResolveOptions::from_json(r#"{"dynamic_types": true}"#).expect("valid");
    let mut sources = SourceSet::with_builtins().expect("built-ins parse");
    sources
        .add_file("main.sema", "val d: dynamic = 1\nval e = d.whatever()\n", Origin::Source)
        .expect("fixture parses");
    let session = ResolveSession::builder(sources).options(options).build();
    session.resolve_all().expect("resolves");
    assert!(session.diagnostics().is_empty(), "{:?}", session.diagnostics());
}
