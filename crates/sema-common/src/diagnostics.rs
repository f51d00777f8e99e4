//! Diagnostic records produced by the resolution core.
//!
//! The core never renders diagnostics for humans beyond filling a message
//! template; rendering, sorting and persistence belong to the consumer.
//! Each [`DiagnosticKind`] has a stable numeric code and a message template
//! with `{0}`, `{1}`, ... placeholders filled by [`format_message`].

use crate::def::DefId;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
}

/// Every semantic outcome the core can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    CyclicDependency,
    UnresolvedReference,
    TypeMismatch,
    AmbiguousCall,
    NoApplicableCall,
    InferenceFailure,
    WrongTypeArgumentCount,
    NoValueForParameter,
    TooManyArguments,
    UpperBoundViolated,
    UnsafeCall,
    ValReassignment,
    IteratorMissing,
    HasNextMissing,
    NextMissing,
    AbstractInstantiation,
    UnsupportedDynamic,
    CannotInferParameterType,
    ExpressionTooDeep,
    ReturnNotAllowed,
    PlatformNullability,
    PlatformReceiver,
}

pub mod diagnostic_codes {
    pub const CYCLIC_DEPENDENCY: u32 = 1001;
    pub const UNRESOLVED_REFERENCE: u32 = 2001;
    pub const TYPE_MISMATCH: u32 = 2002;
    pub const AMBIGUOUS_CALL: u32 = 2003;
    pub const NO_APPLICABLE_CALL: u32 = 2004;
    pub const INFERENCE_FAILURE: u32 = 2005;
    pub const WRONG_TYPE_ARGUMENT_COUNT: u32 = 2006;
    pub const NO_VALUE_FOR_PARAMETER: u32 = 2007;
    pub const TOO_MANY_ARGUMENTS: u32 = 2008;
    pub const UPPER_BOUND_VIOLATED: u32 = 2009;
    pub const UNSAFE_CALL: u32 = 2010;
    pub const VAL_REASSIGNMENT: u32 = 2011;
    pub const ITERATOR_MISSING: u32 = 2012;
    pub const HAS_NEXT_MISSING: u32 = 2013;
    pub const NEXT_MISSING: u32 = 2014;
    pub const ABSTRACT_INSTANTIATION: u32 = 2015;
    pub const UNSUPPORTED_DYNAMIC: u32 = 2016;
    pub const CANNOT_INFER_PARAMETER_TYPE: u32 = 2017;
    pub const EXPRESSION_TOO_DEEP: u32 = 2018;
    pub const RETURN_NOT_ALLOWED: u32 = 2019;
    pub const PLATFORM_NULLABILITY: u32 = 3001;
    pub const PLATFORM_RECEIVER: u32 = 3002;
}

/// A diagnostic message definition: code, category and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

const fn error(code: u32, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category: DiagnosticCategory::Error,
        message,
    }
}

const fn warning(code: u32, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category: DiagnosticCategory::Warning,
        message,
    }
}

use diagnostic_codes as codes;

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    error(
        codes::CYCLIC_DEPENDENCY,
        "Type checking has run into a recursive problem: '{0}' depends on itself.",
    ),
    error(codes::UNRESOLVED_REFERENCE, "Unresolved reference: {0}."),
    error(
        codes::TYPE_MISMATCH,
        "Type mismatch: inferred type is {0} but {1} was expected.",
    ),
    error(
        codes::AMBIGUOUS_CALL,
        "Overload resolution ambiguity between candidates: {0}.",
    ),
    error(
        codes::NO_APPLICABLE_CALL,
        "None of the following candidates is applicable: {0}. Closest candidate fails because: {1}",
    ),
    error(codes::INFERENCE_FAILURE, "Type inference failed: {0}."),
    error(
        codes::WRONG_TYPE_ARGUMENT_COUNT,
        "{0} type arguments expected for {1}, but {2} were given.",
    ),
    error(
        codes::NO_VALUE_FOR_PARAMETER,
        "No value passed for parameter '{0}'.",
    ),
    error(codes::TOO_MANY_ARGUMENTS, "Too many arguments for {0}."),
    error(
        codes::UPPER_BOUND_VIOLATED,
        "Type argument {0} is not within its bounds: should be subtype of {1}.",
    ),
    error(
        codes::UNSAFE_CALL,
        "Only safe (?.) calls are allowed on a nullable receiver of type {0}.",
    ),
    error(codes::VAL_REASSIGNMENT, "Val cannot be reassigned: {0}."),
    error(
        codes::ITERATOR_MISSING,
        "For-loop range must have an 'iterator()' method; {0} has none.",
    ),
    error(
        codes::HAS_NEXT_MISSING,
        "'hasNext()' on {0} is missing or does not return Boolean.",
    ),
    error(codes::NEXT_MISSING, "'next()' on {0} is missing."),
    error(
        codes::ABSTRACT_INSTANTIATION,
        "Cannot create an instance of an abstract class or interface '{0}'.",
    ),
    error(
        codes::UNSUPPORTED_DYNAMIC,
        "Dynamic types are not enabled for this compilation.",
    ),
    error(
        codes::CANNOT_INFER_PARAMETER_TYPE,
        "Cannot infer a type for parameter '{0}'. Specify it explicitly.",
    ),
    error(codes::EXPRESSION_TOO_DEEP, "Expression is nested too deeply."),
    error(codes::RETURN_NOT_ALLOWED, "'return' is not allowed here."),
    warning(
        codes::PLATFORM_NULLABILITY,
        "Expression of platform type {0} is used where {1} is expected and may be null at runtime.",
    ),
    warning(
        codes::PLATFORM_RECEIVER,
        "Call of '{0}' on a receiver of platform type {1}, which may be null at runtime.",
    ),
];

impl DiagnosticKind {
    pub const fn code(self) -> u32 {
        match self {
            Self::CyclicDependency => codes::CYCLIC_DEPENDENCY,
            Self::UnresolvedReference => codes::UNRESOLVED_REFERENCE,
            Self::TypeMismatch => codes::TYPE_MISMATCH,
            Self::AmbiguousCall => codes::AMBIGUOUS_CALL,
            Self::NoApplicableCall => codes::NO_APPLICABLE_CALL,
            Self::InferenceFailure => codes::INFERENCE_FAILURE,
            Self::WrongTypeArgumentCount => codes::WRONG_TYPE_ARGUMENT_COUNT,
            Self::NoValueForParameter => codes::NO_VALUE_FOR_PARAMETER,
            Self::TooManyArguments => codes::TOO_MANY_ARGUMENTS,
            Self::UpperBoundViolated => codes::UPPER_BOUND_VIOLATED,
            Self::UnsafeCall => codes::UNSAFE_CALL,
            Self::ValReassignment => codes::VAL_REASSIGNMENT,
            Self::IteratorMissing => codes::ITERATOR_MISSING,
            Self::HasNextMissing => codes::HAS_NEXT_MISSING,
            Self::NextMissing => codes::NEXT_MISSING,
            Self::AbstractInstantiation => codes::ABSTRACT_INSTANTIATION,
            Self::UnsupportedDynamic => codes::UNSUPPORTED_DYNAMIC,
            Self::CannotInferParameterType => codes::CANNOT_INFER_PARAMETER_TYPE,
            Self::ExpressionTooDeep => codes::EXPRESSION_TOO_DEEP,
            Self::ReturnNotAllowed => codes::RETURN_NOT_ALLOWED,
            Self::PlatformNullability => codes::PLATFORM_NULLABILITY,
            Self::PlatformReceiver => codes::PLATFORM_RECEIVER,
        }
    }

    pub fn message(self) -> &'static DiagnosticMessage {
        let code = self.code();
        get_diagnostic_message(code)
            .unwrap_or_else(|| unreachable!("diagnostic {code} has no message"))
    }

    pub fn category(self) -> DiagnosticCategory {
        self.message().category
    }
}

/// Related source location, e.g. the declaration of a competing candidate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_descriptors: Vec<DefId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Build a diagnostic of `kind`, filling its template with `args`.
    #[must_use]
    pub fn new(kind: DiagnosticKind, file: String, start: u32, length: u32, args: &[&str]) -> Self {
        let message = kind.message();
        Self {
            kind,
            category: message.category,
            code: message.code,
            file,
            start,
            length,
            message_text: format_message(message.message, args),
            related_descriptors: Vec::new(),
            related_information: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_related(mut self, descriptor: DefId, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_descriptors.push(descriptor);
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Replace `{0}`, `{1}`, ... in `template` with `args`.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod diagnostics_tests;
