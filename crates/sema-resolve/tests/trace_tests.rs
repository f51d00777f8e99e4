use super::*;
use sema_common::DiagnosticKind;

fn diag(start: u32) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::UnresolvedReference,
        "a.sema".to_string(),
        start,
        1,
        &["x"],
    )
}

#[test]
fn writes_are_write_once() {
    let mut trace = BindingTrace::new();
    let node = NodeIndex(3);
    trace.record_type(node, TypeId(10));
    trace.record_type(node, TypeId(10));
    assert_eq!(trace.contradictions(), 0);

    trace.record_type(node, TypeId(11));
    assert_eq!(trace.type_of(node), Some(TypeId(10)));
    assert_eq!(trace.contradictions(), 1);
}

#[test]
fn diagnostics_are_deduplicated() {
    let mut trace = BindingTrace::new();
    trace.report(diag(4));
    trace.report(diag(4));
    trace.report(diag(9));
    assert_eq!(trace.diagnostics().len(), 2);
}

#[test]
fn discarded_layer_leaves_nothing() {
    let mut trace = BindingTrace::new();
    trace.push_layer();
    trace.record_type(NodeIndex(1), TypeId(5));
    trace.report(diag(0));
    assert_eq!(trace.type_of(NodeIndex(1)), Some(TypeId(5)));
    drop(trace.take_layer());

    assert_eq!(trace.type_of(NodeIndex(1)), None);
    assert!(trace.diagnostics().is_empty());
}

#[test]
fn merged_layer_commits_to_root() {
    let mut trace = BindingTrace::new();
    trace.push_layer();
    trace.push_layer();
    trace.record_reference(NodeIndex(2), DefId(7));
    let inner = trace.take_layer();
    trace.merge_layer(inner);
    assert_eq!(trace.reference(NodeIndex(2)), Some(DefId(7)));

    let outer = trace.take_layer();
    assert!(!outer.is_empty());
    trace.merge_layer(outer);
    assert!(!trace.is_speculating());
    assert_eq!(trace.reference(NodeIndex(2)), Some(DefId(7)));
    assert_eq!(trace.committed_references().count(), 1);
}

#[test]
fn suspension_routes_writes_to_root() {
    let mut trace = BindingTrace::new();
    trace.push_layer();
    trace.record_variable(NodeIndex(1), TypeId(3));

    trace.suspend_speculation();
    assert!(!trace.is_speculating());
    assert_eq!(trace.variable_type(NodeIndex(1)), None);
    trace.record_type(NodeIndex(2), TypeId(4));
    trace.resume_speculation();

    drop(trace.take_layer());
    assert_eq!(trace.type_of(NodeIndex(2)), Some(TypeId(4)));
    assert_eq!(trace.variable_type(NodeIndex(1)), None);
}
