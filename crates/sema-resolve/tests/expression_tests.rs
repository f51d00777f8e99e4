//! Expression and statement typing through the session.

use sema_common::DiagnosticKind;
use sema_resolve::{CallRole, ResolveOptions, ResolveSession};
use sema_syntax::{NodeIndex, NodeKind, Origin, SourceSet};

fn session_with(text: &str, options: ResolveOptions) -> ResolveSession {
    let mut set = SourceSet::with_builtins().expect("builtins parse");
    set.add_file("main.sema", text, Origin::Source)
        .expect("fixture parses");
    let session = ResolveSession::builder(set).options(options).build();
    session.resolve_all().expect("resolves");
    session
}

fn session(text: &str) -> ResolveSession {
    session_with(text, ResolveOptions::default())
}

fn find(session: &ResolveSession, snippet: &str) -> NodeIndex {
    session
        .sources()
        .find_by_text("main.sema", snippet)
        .unwrap_or_else(|| panic!("no node for {snippet:?}"))
}

fn type_of_init(session: &ResolveSession, name: &str) -> String {
    let property = session
        .sources()
        .find_declaration("main.sema", name)
        .unwrap_or_else(|| panic!("no property {name}"));
    let Some(NodeKind::Property(data)) = session.sources().arena().kind(property) else {
        panic!("{name} is not a property");
    };
    let ty = session
        .type_of(data.initializer)
        .expect("resolves")
        .unwrap_or_else(|| panic!("{name} has no type"));
    session.render_type(ty)
}

fn kinds(session: &ResolveSession) -> Vec<DiagnosticKind> {
    session.diagnostics().iter().map(|d| d.kind).collect()
}

// =============================================================================
// Lambdas
// =============================================================================

#[test]
fn implicit_parameter_takes_expected_type() {
    let session = session(
        "fun apply(f: (Int) -> Int): Int = f(1)\nval r = apply { it * 2 }\n",
    );
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of_init(&session, "r"), "Int");

    let lambda = find(&session, "{ it * 2 }");
    let it = session
        .binding_context()
        .get_variable_type(lambda)
        .expect("`it` is typed");
    assert_eq!(session.render_type(it), "Int");
}

#[test]
fn declared_lambda_parameters() {
    let session = session("val inc = { x: Int -> x + 1 }\n");
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of_init(&session, "inc"), "(Int) -> Int");
}

#[test]
fn lambda_parameter_without_context_is_reported() {
    let session = session("val g = { x -> x }\n");
    assert_eq!(kinds(&session), vec![DiagnosticKind::CannotInferParameterType]);
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn initializer_must_fit_declared_type() {
    let session = session("val s: String = 1\n");
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::TypeMismatch);
    assert!(diagnostics[0].is_error());
}

#[test]
fn only_var_can_be_reassigned() {
    let session = session(
        "fun m() {\n    val a = 1\n    var b = 2\n    a = 3\n    b = 4\n}\n",
    );
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].kind, DiagnosticKind::ValReassignment);
    assert!(diagnostics[0].message_text.contains('a'));
}

#[test]
fn return_is_checked_against_declared_type() {
    let session = session("fun r(): Int {\n    return \"s\"\n}\n");
    assert_eq!(kinds(&session), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn return_inside_lambda_is_rejected() {
    let session = session(
        "fun h() {\n    val l = { x: Int -> return x }\n}\n",
    );
    assert_eq!(kinds(&session), vec![DiagnosticKind::ReturnNotAllowed]);
}

#[test]
fn if_expression_joins_branches() {
    let session = session("val i = if (true) 1 else 2\n");
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of_init(&session, "i"), "Int");
}

// =============================================================================
// For loops
// =============================================================================

#[test]
fn for_loop_over_list_records_conventions() {
    let session = session(
        "fun loop(xs: List<Int>) {\n    for (x in xs) {\n        println(x)\n    }\n}\n",
    );
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());

    let for_node = find(&session, "for (x in xs) {\n        println(x)\n    }");
    let bindings = session.binding_context();
    for role in [CallRole::Iterator, CallRole::HasNext, CallRole::Next] {
        assert!(bindings.get_call(for_node, role).is_some(), "{role:?}");
    }
    let next = bindings
        .get_call(for_node, CallRole::Next)
        .expect("next call");
    assert_eq!(session.render_type(next.return_type), "Int");
}

#[test]
fn for_loop_over_non_iterable() {
    let session = session("fun bad(n: Int) {\n    for (i in n) {\n    }\n}\n");
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].kind, DiagnosticKind::IteratorMissing);
    assert_eq!(diagnostics[0].start, session.sources().arena().span(find(&session, "n")).start);
}

#[test]
fn for_loop_iterator_without_has_next() {
    let session = session(
        "class Cursor {\n    fun next(): Int = 1\n}\nclass Bag {\n    fun iterator(): Cursor = Cursor()\n}\nfun walk(bag: Bag) {\n    for (item in bag) {\n    }\n}\n",
    );
    let diagnostics = session.diagnostics();
    assert_eq!(kinds(&session), vec![DiagnosticKind::HasNextMissing]);
    assert!(diagnostics[0].message_text.contains("Cursor"));
    assert_eq!(diagnostics[0].start, session.sources().arena().span(find(&session, "bag")).start);
}

#[test]
fn for_loop_iterator_without_next() {
    let session = session(
        "class Cursor {\n    fun hasNext(): Boolean = false\n}\nclass Bag {\n    fun iterator(): Cursor = Cursor()\n}\nfun walk(bag: Bag) {\n    for (item in bag) {\n    }\n}\n",
    );
    assert_eq!(kinds(&session), vec![DiagnosticKind::NextMissing]);
}

// =============================================================================
// Call checkers and special types
// =============================================================================

#[test]
fn abstract_types_cannot_be_instantiated() {
    let session = session(
        "abstract class Shape\ninterface Named\nclass Circle : Shape()\nval s = Shape()\nval n = Named()\nval c = Circle()\n",
    );
    assert_eq!(
        kinds(&session),
        vec![
            DiagnosticKind::AbstractInstantiation,
            DiagnosticKind::AbstractInstantiation,
        ]
    );
    assert_eq!(type_of_init(&session, "c"), "Circle");
}

#[test]
fn dynamic_receiver_accepts_any_member() {
    let text = "val d: dynamic = 1\nval e = d.anything(1)\n";
    let enabled = session_with(
        text,
        ResolveOptions {
            dynamic_types: true,
            ..ResolveOptions::default()
        },
    );
    assert!(kinds(&enabled).is_empty(), "{:?}", enabled.diagnostics());
    assert_eq!(type_of_init(&enabled, "e"), "dynamic");

    let disabled = session(text);
    assert_eq!(kinds(&disabled), vec![DiagnosticKind::UnsupportedDynamic]);
}

#[test]
fn deep_expressions_are_cut_off() {
    let chain = vec!["1"; 12].join(" + ");
    let session = session_with(
        &format!("val deep = {chain}\n"),
        ResolveOptions {
            max_expression_depth: 4,
            ..ResolveOptions::default()
        },
    );
    let too_deep = session
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::ExpressionTooDeep)
        .count();
    assert_eq!(too_deep, 1);
}

/// `fun f0() = f1()`, `fun f1() = f2()`, ... ending in `fun f{length}() = 1`.
fn call_chain(length: usize) -> String {
    let mut text = String::new();
    for i in 0..length {
        text.push_str(&format!("fun f{i}() = f{}()\n", i + 1));
    }
    text.push_str(&format!("fun f{length}() = 1\n"));
    text
}

fn unresolved_session(text: &str, options: ResolveOptions) -> ResolveSession {
    let mut set = SourceSet::with_builtins().expect("builtins parse");
    set.add_file("main.sema", text, Origin::Source)
        .expect("fixture parses");
    ResolveSession::builder(set).options(options).build()
}

fn return_type_of(session: &ResolveSession, name: &str) -> String {
    let node = session
        .sources()
        .find_declaration("main.sema", name)
        .unwrap_or_else(|| panic!("no function {name}"));
    let function = session.function_descriptor(node).expect("function");
    let ty = session.return_type(&function).expect("resolves");
    session.render_type(ty)
}

#[test]
fn nesting_limit_applies_per_declaration() {
    let text = call_chain(50);
    let options = || ResolveOptions {
        max_expression_depth: 4,
        ..ResolveOptions::default()
    };

    let from_root = unresolved_session(&text, options());
    from_root.resolve_all().expect("resolves");
    assert!(kinds(&from_root).is_empty(), "{:?}", from_root.diagnostics());
    assert_eq!(return_type_of(&from_root, "f0"), "Int");

    let from_middle = unresolved_session(&text, options());
    assert_eq!(return_type_of(&from_middle, "f25"), "Int");
    from_middle.resolve_all().expect("resolves");
    assert_eq!(from_middle.diagnostics(), from_root.diagnostics());
}

#[test]
fn long_declaration_chain_resolves() {
    let session = session(&call_chain(600));
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(return_type_of(&session, "f0"), "Int");
}
