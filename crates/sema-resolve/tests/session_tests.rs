//! End-to-end tests of the resolve session: laziness, memoization, cycles,
//! scopes, platform types and cancellation.

use sema_common::DiagnosticKind;
use sema_resolve::{
    CallChecker, CallCheckerContext, CancellationToken, ResolveError, ResolveOptions,
    ResolveSession, ResolvedCall, SlotState,
};
use sema_syntax::{NodeIndex, NodeKind, Origin, SourceSet};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn sources(files: &[(&str, &str, Origin)]) -> SourceSet {
    let mut set = SourceSet::with_builtins().expect("builtins parse");
    for &(name, text, origin) in files {
        set.add_file(name, text, origin).expect("fixture parses");
    }
    set
}

fn session(text: &str) -> ResolveSession {
    ResolveSession::builder(sources(&[("main.sema", text, Origin::Source)])).build()
}

fn find(session: &ResolveSession, snippet: &str) -> NodeIndex {
    session
        .sources()
        .find_by_text("main.sema", snippet)
        .unwrap_or_else(|| panic!("no node for {snippet:?}"))
}

fn declaration(session: &ResolveSession, file: &str, path: &str) -> NodeIndex {
    session
        .sources()
        .find_declaration(file, path)
        .unwrap_or_else(|| panic!("no declaration {path}"))
}

fn initializer(session: &ResolveSession, property: NodeIndex) -> NodeIndex {
    match session.sources().arena().kind(property) {
        Some(NodeKind::Property(data)) => data.initializer,
        _ => panic!("expected a property"),
    }
}

fn rendered_type(session: &ResolveSession, node: NodeIndex) -> String {
    let ty = session
        .type_of(node)
        .expect("resolves")
        .expect("expression has a type");
    session.render_type(ty)
}

fn kinds(session: &ResolveSession) -> Vec<DiagnosticKind> {
    session.diagnostics().iter().map(|d| d.kind).collect()
}

#[test]
fn descriptors_are_created_once() {
    let session = session("class A {\n    fun f(): Int = 1\n}\nfun g(a: A) = a.f()\n");
    let a = declaration(&session, "main.sema", "A");
    let f = declaration(&session, "main.sema", "A.f");
    assert_eq!(session.resolution_state(a), SlotState::Unstarted);

    let first = session.descriptor(a).expect("descriptor");
    let second = session.descriptor(a).expect("descriptor");
    assert!(first.ptr_eq(&second));
    assert_eq!(session.resolution_state(a), SlotState::Resolved);
    assert_eq!(session.resolution_state(f), SlotState::Unstarted);

    let class = session.class_descriptor(a).expect("class");
    assert!(Rc::ptr_eq(&class, &session.class_descriptor(a).expect("class")));
    assert_eq!(session.name_of(class.def).as_deref(), Some("A"));

    let function = session.function_descriptor(f).expect("function");
    assert_eq!(function.dispatch_receiver, Some(class.def));
    let ret = session.return_type(&function).expect("return type");
    assert_eq!(session.render_type(ret), "Int");
}

#[test]
fn resolve_all_is_idempotent() {
    let session = session("val s: String = 1\nfun f() = missing()\n");
    session.resolve_all().expect("resolves");
    let first = session.diagnostics();
    session.resolve_all().expect("resolves");
    assert_eq!(session.diagnostics(), first);
    assert_eq!(
        kinds(&session),
        vec![DiagnosticKind::TypeMismatch, DiagnosticKind::UnresolvedReference]
    );
    assert_eq!(session.binding_context().contradictions(), 0);
}

#[test]
fn self_referential_property_is_cyclic() {
    let session = session("val x = x + 1\n");
    let x = declaration(&session, "main.sema", "x");
    let property = session.property_descriptor(x).expect("property");
    let ty = session.property_type(&property).expect("property type");
    assert!(ty.is_error());

    session.resolve_all().expect("resolves");
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].kind, DiagnosticKind::CyclicDependency);
    assert!(diagnostics[0].message_text.contains("'x'"));
    assert_eq!(
        diagnostics[0].start,
        session.sources().arena().name_span(x).start
    );
}

#[test]
fn alias_expansion_cycle_is_reported_once() {
    let session = session("typealias A = B\ntypealias B = A\n");
    session.resolve_all().expect("resolves");
    let diagnostics = session.diagnostics();
    assert_eq!(kinds(&session), vec![DiagnosticKind::CyclicDependency]);
    assert!(diagnostics[0].message_text.contains("'A'"), "{diagnostics:?}");

    let b = declaration(&session, "main.sema", "B");
    let alias = session.type_alias_descriptor(b).expect("alias");
    assert!(session.alias_expansion(&alias).expect("expansion").is_error());
}

#[test]
fn cyclic_inheritance_is_reported_once() {
    let session = session("open class A : B()\nopen class B : A()\n");
    session.resolve_all().expect("resolves");
    let cycles: Vec<_> = session
        .diagnostics()
        .into_iter()
        .filter(|d| d.kind == DiagnosticKind::CyclicDependency)
        .collect();
    assert_eq!(cycles.len(), 1, "{cycles:?}");
    assert!(cycles[0].message_text.contains("'A'"));
}

#[test]
fn type_mentions_check_argument_count() {
    let session = session("fun g(a: List<Int, Int>, b: Int<String>) {\n}\n");
    session.resolve_all().expect("resolves");
    assert_eq!(
        kinds(&session),
        vec![
            DiagnosticKind::WrongTypeArgumentCount,
            DiagnosticKind::WrongTypeArgumentCount
        ]
    );
}

#[test]
fn mutually_recursive_functions_report_one_cycle() {
    let session = session("fun a() = b()\nfun b() = a()\n");
    session.resolve_all().expect("resolves");
    let a = declaration(&session, "main.sema", "a");
    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].kind, DiagnosticKind::CyclicDependency);
    assert_eq!(
        diagnostics[0].start,
        session.sources().arena().name_span(a).start
    );
}

#[test]
fn block_local_shadows_imported_name() {
    let session = ResolveSession::builder(sources(&[
        ("lib.sema", "package lib\nval n: Int = 1\n", Origin::Source),
        (
            "main.sema",
            "package app\nimport lib.n\nfun f() {\n    val n = \"s\"\n    n\n}\nval m = n\n",
            Origin::Source,
        ),
    ]))
    .build();
    session.resolve_all().expect("resolves");
    assert!(session.diagnostics().is_empty(), "{:?}", session.diagnostics());

    let bindings = session.binding_context();
    let local = find(&session, "val n = \"s\"");
    let local_def = session.property_descriptor(local).expect("local").def;
    let inner_use = find(&session, "n");
    assert_eq!(bindings.get_reference(inner_use), Some(local_def));
    assert_eq!(rendered_type(&session, inner_use), "String");

    let imported = declaration(&session, "lib.sema", "n");
    let imported_def = session.property_descriptor(imported).expect("lib n").def;
    let m = declaration(&session, "main.sema", "m");
    let outer_use = initializer(&session, m);
    assert_eq!(bindings.get_reference(outer_use), Some(imported_def));
    assert_eq!(rendered_type(&session, outer_use), "Int");
    assert!(
        bindings
            .get_descriptor(outer_use)
            .is_some_and(|d| d.as_property().is_some())
    );
}

#[test]
fn resolve_to_element_returns_subtree_bindings() {
    let session = session("fun f(): Int {\n    val a = 1\n    return a + 2\n}\n");
    let sum = find(&session, "a + 2");
    let slice = session.resolve_to_element(sum).expect("resolves");

    assert_eq!(slice.node, sum);
    let ty = slice.type_of(sum).expect("sum is typed");
    assert_eq!(session.render_type(ty), "Int");
    let call = slice.call(sum).expect("operator call");
    assert_eq!(call.argument_map, vec![0]);
    assert!(session.descriptor_by_def(call.callee).is_some_and(|d| d.as_function().is_some()));

    let a = find(&session, "val a = 1");
    let a_def = session.property_descriptor(a).expect("a").def;
    let a_use = slice
        .references
        .iter()
        .find(|(_, def)| *def == a_def)
        .map(|(node, _)| *node);
    assert!(a_use.is_some());
    assert!(slice.diagnostics.is_empty());

    let again = session.resolve_to_element(sum).expect("resolves");
    assert_eq!(again.types, slice.types);
    assert_eq!(again.references, slice.references);
}

#[test]
fn resolve_to_element_keeps_diagnostics_in_range() {
    let session = session("fun f() {\n    val a: String = 1\n}\nval b: Int = \"b\"\n");
    let f = declaration(&session, "main.sema", "f");
    let slice = session.resolve_to_element(f).expect("resolves");
    assert_eq!(slice.diagnostics.len(), 1);
    assert_eq!(slice.diagnostics[0].kind, DiagnosticKind::TypeMismatch);

    let root = session.sources().file_by_name("main.sema").expect("file").root;
    let whole = session.resolve_to_element(root).expect("resolves");
    assert_eq!(whole.diagnostics.len(), 2);
}

#[test]
fn platform_types_are_flexible() {
    let files = [
        ("ext.sema", "package ext\nfun name(): String\n", Origin::Platform),
        (
            "main.sema",
            "package app\nimport ext.name\nval a: String? = name()\nval b: String = name()\n",
            Origin::Source,
        ),
    ];
    let session = ResolveSession::builder(sources(&files)).build();
    session.resolve_all().expect("resolves");

    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].kind, DiagnosticKind::PlatformNullability);
    assert!(!diagnostics[0].is_error());

    let b = declaration(&session, "main.sema", "b");
    assert_eq!(rendered_type(&session, initializer(&session, b)), "String!");

    let quiet = ResolveSession::builder(sources(&files))
        .options(ResolveOptions {
            report_platform_nullability: false,
            ..ResolveOptions::default()
        })
        .build();
    quiet.resolve_all().expect("resolves");
    assert!(quiet.diagnostics().is_empty());
}

#[test]
fn platform_receiver_warning() {
    let files = [
        (
            "ext.sema",
            "package ext\nclass Text {\n    fun size(): Int\n}\nfun load(): Text\n",
            Origin::Platform,
        ),
        (
            "main.sema",
            "package app\nimport ext.load\nval n = load().size()\nval m = load()?.size()\n",
            Origin::Source,
        ),
    ];
    let session = ResolveSession::builder(sources(&files)).build();
    session.resolve_all().expect("resolves");
    assert_eq!(kinds(&session), vec![DiagnosticKind::PlatformReceiver]);

    let bare = ResolveSession::builder(sources(&files))
        .without_default_checkers()
        .build();
    bare.resolve_all().expect("resolves");
    assert!(bare.diagnostics().is_empty());
}

#[test]
fn alias_expansion_matches_direct_type() {
    let session = session(
        "typealias Pair2<T> = Pair<T, T>\nval p: Pair2<String> = Pair(\"a\", \"b\")\nval q: Pair<String, String> = p\nval r = Pair2(1, 2)\n",
    );
    let via_alias = session.resolve_type(find(&session, "Pair2<String>")).expect("alias");
    let direct = session
        .resolve_type(find(&session, "Pair<String, String>"))
        .expect("direct");
    assert_eq!(via_alias, direct);
    assert_eq!(session.render_type(direct), "Pair<String, String>");

    session.resolve_all().expect("resolves");
    assert!(session.diagnostics().is_empty(), "{:?}", session.diagnostics());
    let r = declaration(&session, "main.sema", "r");
    assert_eq!(rendered_type(&session, initializer(&session, r)), "Pair<Int, Int>");
}

#[test]
fn cancellation_rolls_back_in_flight_declarations() {
    let text = "class Box<T>(val item: T) {\n    fun get(): T = item\n}\nfun f(xs: List<Int>): Int {\n    var total = 0\n    for (x in xs) {\n        total = total + x\n    }\n    return total\n}\nval b = Box(\"s\").get()\nval s: Int = b\nfun g() = missing(1)\n";
    let baseline = session(text);
    baseline.resolve_all().expect("resolves");
    let mut expected = baseline.diagnostics();
    expected.sort_by_key(|d| (d.start, d.code));
    assert_eq!(expected.len(), 2, "{expected:?}");

    let mut cancelled_runs = 0;
    for polls in 0..400 {
        let token = CancellationToken::after_polls(polls);
        let session = ResolveSession::builder(sources(&[("main.sema", text, Origin::Source)]))
            .cancellation_token(token.clone())
            .build();
        let result = session.resolve_all();
        if !token.is_cancelled() {
            result.expect("resolves");
            break;
        }
        cancelled_runs += 1;
        assert_eq!(result, Err(ResolveError::Cancelled));

        let root = session.sources().file_by_name("main.sema").expect("file").root;
        for node in session.sources().declarations_of(root) {
            assert_ne!(session.resolution_state(node), SlotState::InProgress);
        }

        session.set_cancellation_token(CancellationToken::new());
        session.resolve_all().expect("resumes");
        let mut actual = session.diagnostics();
        actual.sort_by_key(|d| (d.start, d.code));
        assert_eq!(actual, expected, "after cancelling at poll {polls}");
    }
    assert!(cancelled_runs > 0);
}

#[test]
fn owned_declarations_follow_their_owner() {
    let text = "fun <T> pick(a: T, b: List<T>): T = a\n";
    let mut rolled_back = 0;
    for polls in 0..100 {
        let token = CancellationToken::after_polls(polls);
        let session = ResolveSession::builder(sources(&[("main.sema", text, Origin::Source)]))
            .cancellation_token(token.clone())
            .build();
        let pick = declaration(&session, "main.sema", "pick");
        let Some(NodeKind::Function(data)) = session.sources().arena().kind(pick) else {
            panic!("pick is not a function");
        };
        let owned = [data.type_params[0], data.params[0], data.params[1]];

        let result = session.function_descriptor(pick);
        if !token.is_cancelled() {
            result.expect("created");
            for node in owned {
                assert_eq!(session.resolution_state(node), SlotState::Resolved);
            }
            break;
        }
        rolled_back += 1;
        assert_eq!(session.resolution_state(pick), SlotState::Unstarted);
        for node in owned {
            assert_eq!(
                session.resolution_state(node),
                SlotState::Unstarted,
                "after cancelling at poll {polls}"
            );
        }
    }
    assert!(rolled_back > 0);
}

/// Cancels the session token the first time it sees a call.
struct CancelOnCall {
    token: CancellationToken,
    calls: Rc<Cell<u32>>,
}

impl CallChecker for CancelOnCall {
    fn name(&self) -> &'static str {
        "cancel-on-call"
    }

    fn check(&self, _call: &ResolvedCall, _ctx: &CallCheckerContext<'_>) {
        self.calls.set(self.calls.get() + 1);
        self.token.cancel();
    }
}

#[test]
fn cancelled_property_type_is_recomputed() {
    let token = CancellationToken::new();
    let calls = Rc::new(Cell::new(0));
    let session = ResolveSession::builder(sources(&[(
        "main.sema",
        "fun make(): Int = 1\nval x = make()\n",
        Origin::Source,
    )]))
    .cancellation_token(token.clone())
    .call_checker(CancelOnCall {
        token: token.clone(),
        calls: calls.clone(),
    })
    .build();

    let x = declaration(&session, "main.sema", "x");
    let property = session.property_descriptor(x).expect("property");
    assert_eq!(session.property_type(&property), Err(ResolveError::Cancelled));
    assert_eq!(calls.get(), 1);
    assert!(token.is_cancelled());

    session.set_cancellation_token(CancellationToken::new());
    let ty = session.property_type(&property).expect("recomputed");
    assert_eq!(session.render_type(ty), "Int");
    assert_eq!(calls.get(), 2);
    assert_eq!(session.property_type(&property).expect("cached"), ty);
    assert_eq!(calls.get(), 2);
}

/// Records, per call to `countdown`, whether its return type was in flight.
struct InFlightReturnTypes {
    seen: Rc<RefCell<Vec<bool>>>,
}

impl CallChecker for InFlightReturnTypes {
    fn name(&self) -> &'static str {
        "in-flight-return-types"
    }

    fn check(&self, call: &ResolvedCall, ctx: &CallCheckerContext<'_>) {
        if ctx.callee_name() == "countdown" {
            self.seen
                .borrow_mut()
                .push(ctx.is_computing_return_type(call.callee));
        }
    }
}

#[test]
fn checkers_see_return_types_in_flight() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let session = ResolveSession::builder(sources(&[(
        "main.sema",
        "fun countdown(n: Int) = if (n > 0) countdown(n - 1) else 0\nval start = countdown(3)\n",
        Origin::Source,
    )]))
    .call_checker(InFlightReturnTypes { seen: seen.clone() })
    .build();

    session.resolve_all().expect("resolves");
    assert_eq!(*seen.borrow(), vec![true, false]);
    assert!(kinds(&session).contains(&DiagnosticKind::CyclicDependency));
}
