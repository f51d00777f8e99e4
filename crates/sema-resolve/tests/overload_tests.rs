//! Overload resolution through the session: tiers, specificity, coercion,
//! inference and the failure diagnostics.

use sema_common::DiagnosticKind;
use sema_resolve::{CallStatus, ResolveOptions, ResolveSession, TieBreakPolicy};
use sema_syntax::{NodeIndex, NodeKind, Origin, SourceSet};

fn session_with(files: &[(&str, &str)], options: ResolveOptions) -> ResolveSession {
    let mut set = SourceSet::with_builtins().expect("builtins parse");
    for &(name, text) in files {
        set.add_file(name, text, Origin::Source).expect("fixture parses");
    }
    let session = ResolveSession::builder(set).options(options).build();
    session.resolve_all().expect("resolves");
    session
}

fn session(text: &str) -> ResolveSession {
    session_with(&[("main.sema", text)], ResolveOptions::default())
}

/// Initializer of the top-level property `name` in main.sema.
fn init(session: &ResolveSession, name: &str) -> NodeIndex {
    let property = session
        .sources()
        .find_declaration("main.sema", name)
        .unwrap_or_else(|| panic!("no property {name}"));
    match session.sources().arena().kind(property) {
        Some(NodeKind::Property(data)) => data.initializer,
        _ => panic!("{name} is not a property"),
    }
}

fn type_of(session: &ResolveSession, name: &str) -> String {
    let node = init(session, name);
    let ty = session
        .type_of(node)
        .expect("resolves")
        .unwrap_or_else(|| panic!("{name} has no type"));
    session.render_type(ty)
}

fn kinds(session: &ResolveSession) -> Vec<DiagnosticKind> {
    session.diagnostics().iter().map(|d| d.kind).collect()
}

// =============================================================================
// Specificity and tiers
// =============================================================================

#[test]
fn most_specific_overload_wins() {
    let session = session(
        "fun f(x: Int): Int = x\nfun f(x: Any): String = \"any\"\nval a = f(1)\nval b = f(\"s\")\n",
    );
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of(&session, "a"), "Int");
    assert_eq!(type_of(&session, "b"), "String");
}

#[test]
fn equally_specific_imports_are_ambiguous() {
    let session = session_with(
        &[
            ("a.sema", "package a\nfun f(x: Int): Int = x\n"),
            ("b.sema", "package b\nfun f(x: Int): Int = x\n"),
            (
                "main.sema",
                "package app\nimport a.*\nimport b.*\nval r = f(1)\n",
            ),
        ],
        ResolveOptions::default(),
    );
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].kind, DiagnosticKind::AmbiguousCall);
    assert_eq!(diagnostics[0].related_information.len(), 2);

    let node = init(&session, "r");
    let ty = session.type_of(node).expect("resolves").expect("typed");
    assert!(ty.is_error());
}

#[test]
fn member_beats_extension() {
    let session = session(
        "class Counter {\n    fun size(): Int = 1\n}\nfun Counter.size(): String = \"ext\"\nval n = Counter().size()\n",
    );
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of(&session, "n"), "Int");
}

#[test]
fn nullable_receiver_needs_safe_call() {
    let session = session(
        "class Counter {\n    fun size(): Int = 1\n}\nval c: Counter? = null\nval safe = c?.size()\nval unsafe = c.size()\n",
    );
    assert_eq!(kinds(&session), vec![DiagnosticKind::UnsafeCall]);
    assert_eq!(type_of(&session, "safe"), "Int?");
}

// =============================================================================
// Coercion and inference
// =============================================================================

#[test]
fn int_literal_widens_to_long() {
    let session = session("fun take(x: Long): Long = x\nval t = take(1)\n");
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of(&session, "t"), "Long");
}

#[test]
fn exact_literal_match_beats_widening() {
    let session = session(
        "fun w(x: Int): String = \"int\"\nfun w(x: Long): Int = 0\nval v = w(1)\n",
    );
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of(&session, "v"), "String");
}

#[test]
fn type_arguments_are_inferred() {
    let session = session(
        "val xs = listOf(1, 2, 3)\nval s = maxOf(\"a\", \"b\")\nval i = maxOf(1, 2)\n",
    );
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of(&session, "xs"), "List<Int>");
    assert_eq!(type_of(&session, "s"), "String");
    assert_eq!(type_of(&session, "i"), "Int");

    let call = session
        .binding_context()
        .get_call(init(&session, "xs"), sema_resolve::CallRole::Direct)
        .expect("listOf call");
    assert_eq!(call.status, CallStatus::Success);
    assert_eq!(call.type_arguments.len(), 1);
    assert_eq!(call.argument_map, vec![0, 0, 0]);
}

#[test]
fn function_typed_value_is_invoked() {
    let session = session("val inc = { x: Int -> x + 1 }\nval r = inc(2)\n");
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of(&session, "r"), "Int");
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn argument_count_errors() {
    let session = session("fun one(x: Int): Int = x\nval a = one(1, 2)\nval b = one()\n");
    assert_eq!(
        kinds(&session),
        vec![
            DiagnosticKind::TooManyArguments,
            DiagnosticKind::NoValueForParameter,
        ]
    );
    let call = session
        .binding_context()
        .get_call(init(&session, "a"), sema_resolve::CallRole::Direct)
        .expect("committed as incomplete");
    assert_eq!(call.status, CallStatus::Incomplete);
    assert_eq!(type_of(&session, "a"), "Int");
}

#[test]
fn unknown_callee_is_unresolved() {
    let session = session("val a = nothingHere(1)\n");
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedReference);
    assert!(diagnostics[0].message_text.contains("nothingHere"));
}

#[test]
fn no_applicable_overload_is_reported() {
    let session = session(
        "fun f(x: Int): Int = x\nfun f(x: String): String = x\nval r = f(true)\n",
    );
    let diagnostics = session.diagnostics();
    assert_eq!(kinds(&session), vec![DiagnosticKind::NoApplicableCall]);
    assert!(diagnostics[0].message_text.contains("Boolean"), "{diagnostics:?}");
    assert_eq!(type_of(&session, "r"), "[ERROR]");
}

#[test]
fn bound_violation_fails_inference() {
    let session = session("fun <T: Int> g(x: T): T = x\nval r = g(\"s\")\n");
    assert_eq!(kinds(&session), vec![DiagnosticKind::InferenceFailure]);
}

#[test]
fn explicit_type_arguments() {
    let session = session(
        "val e = emptyList<String>()\nval bad = emptyList<String, Int>()\n",
    );
    assert_eq!(type_of(&session, "e"), "List<String>");
    assert_eq!(kinds(&session), vec![DiagnosticKind::WrongTypeArgumentCount]);
}

#[test]
fn explicit_type_argument_must_satisfy_bound() {
    let session = session("fun <T : Number> num(x: T): T = x\nval n = num<String>(\"s\")\n");
    assert!(
        kinds(&session).contains(&DiagnosticKind::UpperBoundViolated),
        "{:?}",
        session.diagnostics()
    );
}

#[test]
fn default_arguments_break_ties() {
    let text = "fun d(x: Int, y: Int = 0): String = \"default\"\nfun d(x: Int): Int = x\nval r = d(1)\n";
    let session = session(text);
    assert!(kinds(&session).is_empty(), "{:?}", session.diagnostics());
    assert_eq!(type_of(&session, "r"), "Int");

    let strict = session_with(
        &[("main.sema", text)],
        ResolveOptions {
            tie_break: TieBreakPolicy {
                prefer_non_default: false,
                ..TieBreakPolicy::default()
            },
            ..ResolveOptions::default()
        },
    );
    assert_eq!(kinds(&strict), vec![DiagnosticKind::AmbiguousCall]);
}
