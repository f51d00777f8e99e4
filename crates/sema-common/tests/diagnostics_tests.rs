use super::*;

#[test]
fn test_every_kind_has_a_message() {
    let kinds = [
        DiagnosticKind::CyclicDependency,
        DiagnosticKind::UnresolvedReference,
        DiagnosticKind::TypeMismatch,
        DiagnosticKind::AmbiguousCall,
        DiagnosticKind::NoApplicableCall,
        DiagnosticKind::InferenceFailure,
        DiagnosticKind::WrongTypeArgumentCount,
        DiagnosticKind::NoValueForParameter,
        DiagnosticKind::TooManyArguments,
        DiagnosticKind::UpperBoundViolated,
        DiagnosticKind::UnsafeCall,
        DiagnosticKind::ValReassignment,
        DiagnosticKind::IteratorMissing,
        DiagnosticKind::HasNextMissing,
        DiagnosticKind::NextMissing,
        DiagnosticKind::AbstractInstantiation,
        DiagnosticKind::UnsupportedDynamic,
        DiagnosticKind::CannotInferParameterType,
        DiagnosticKind::ExpressionTooDeep,
        DiagnosticKind::ReturnNotAllowed,
        DiagnosticKind::PlatformNullability,
        DiagnosticKind::PlatformReceiver,
    ];
    for kind in kinds {
        assert_eq!(kind.message().code, kind.code(), "{kind:?}");
    }
}

#[test]
fn test_platform_kinds_are_warnings() {
    assert_eq!(
        DiagnosticKind::PlatformNullability.category(),
        DiagnosticCategory::Warning
    );
    assert_eq!(
        DiagnosticKind::TypeMismatch.category(),
        DiagnosticCategory::Error
    );
}

#[test]
fn test_new_fills_template() {
    let diag = Diagnostic::new(
        DiagnosticKind::TypeMismatch,
        "a.kt".to_string(),
        3,
        5,
        &["String", "Int"],
    );
    assert_eq!(
        diag.message_text,
        "Type mismatch: inferred type is String but Int was expected."
    );
    assert_eq!(diag.code, diagnostic_codes::TYPE_MISMATCH);
    assert!(diag.is_error());
}

#[test]
fn test_with_related_records_descriptor() {
    let diag = Diagnostic::new(
        DiagnosticKind::AmbiguousCall,
        "a.kt".to_string(),
        0,
        1,
        &["f(Int), f(Int)"],
    )
    .with_related(DefId(7), "b.kt".to_string(), 10, 3, "f(Int)".to_string());
    assert_eq!(diag.related_descriptors, vec![DefId(7)]);
    assert_eq!(diag.related_information[0].file, "b.kt");
}
