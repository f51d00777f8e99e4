//! Call completion: commit the chosen candidate, or report why none fits.

use super::arguments::ArgumentTypes;
use super::candidates::{Applicability, Evaluation};
use super::checkers::CallCheckerContext;
use super::{CallReceiver, CallSite, Callee};
use crate::context::ResolveContext;
use crate::error::ResolveResult;
use crate::trace::{CallRole, CallStatus, ResolvedCall};
use sema_common::{DefId, DiagnosticKind};
use sema_syntax::NodeIndex;
use sema_types::{Compatibility, TypeId};
use tracing::debug;

impl ResolveContext {
    /// Complete the winning candidate: refine inference with the expected
    /// type, check every argument against its final parameter type and
    /// commit the call.
    pub(crate) fn complete_call(
        &self,
        site: &CallSite<'_>,
        evaluation: Evaluation,
        args: &mut ArgumentTypes,
        explicit: &[TypeId],
        expected: Option<TypeId>,
    ) -> ResolveResult<TypeId> {
        let evaluation = match expected {
            Some(expected)
                if explicit.is_empty() && !evaluation.signature.type_parameters.is_empty() =>
            {
                let refined = self.evaluate_candidate(
                    evaluation.candidate.clone(),
                    site,
                    args,
                    explicit,
                    Some(expected),
                )?;
                if refined.is_applicable() { refined } else { evaluation }
            }
            _ => evaluation,
        };

        let candidate = &evaluation.candidate;
        let declared = self.candidate_return_type(candidate)?;
        let return_type = evaluation.solution.apply(&self.types, declared);
        debug!(
            callee = self.text(site.callee),
            return_type = %self.render_type(return_type),
            type_arguments = evaluation.type_arguments.len(),
            "completed call"
        );

        self.check_explicit_bounds(site, &evaluation, explicit)?;
        self.check_call_arguments(site, &evaluation, args)?;

        let call = ResolvedCall {
            callee: candidate.callee.def(),
            status: CallStatus::Success,
            type_arguments: evaluation.type_arguments.clone(),
            receiver_type: candidate.receiver_type(),
            return_type,
            argument_map: evaluation
                .mapping
                .as_ref()
                .map(|m| m.parameter_of.clone())
                .unwrap_or_default(),
            safe: site.safe,
        };
        self.commit_call(site, &call)?;

        if candidate.unsafe_receiver
            && let CallReceiver::Value(receiver) = site.receiver
        {
            self.report_at(
                DiagnosticKind::UnsafeCall,
                site.node,
                site.callee_span,
                &[&self.render_type(receiver)],
            );
        }
        Ok(self.safe_call_result(site, return_type))
    }

    fn safe_call_result(&self, site: &CallSite<'_>, ty: TypeId) -> TypeId {
        if site.safe {
            self.types.make_nullable(ty)
        } else {
            ty
        }
    }

    fn check_explicit_bounds(
        &self,
        site: &CallSite<'_>,
        evaluation: &Evaluation,
        explicit: &[TypeId],
    ) -> ResolveResult<()> {
        let mut checker = self.checker();
        for ((&param, &arg), &node) in evaluation
            .signature
            .type_parameters
            .iter()
            .zip(explicit)
            .zip(site.type_args)
        {
            let bound = evaluation
                .solution
                .apply(&self.types, self.type_parameter_bound(param)?);
            if !arg.is_error() && !checker.is_subtype(arg, bound) {
                self.report(
                    DiagnosticKind::UpperBoundViolated,
                    node,
                    &[&self.render_type(arg), &self.render_type(bound)],
                );
            }
        }
        Ok(())
    }

    /// Re-check arguments against their final parameter types. Preliminary
    /// facts are kept when they fit; widened literals and lambdas are typed
    /// again with the parameter type as expectation.
    fn check_call_arguments(
        &self,
        site: &CallSite<'_>,
        evaluation: &Evaluation,
        args: &mut ArgumentTypes,
    ) -> ResolveResult<()> {
        let Some(mapping) = &evaluation.mapping else {
            return Ok(());
        };
        for (index, &arg) in site.args.iter().enumerate() {
            let expected = evaluation.parameter_type(self, mapping.parameter_of[index]);
            let Some(actual) = args.prelim.get(index).copied().flatten() else {
                self.check_expression(arg, expected)?;
                continue;
            };
            let layer = args.take_layer(index);
            let fits = self.checker().assignability(actual, expected) != Compatibility::Incompatible;
            if fits || !evaluation.coerced {
                if let Some(layer) = layer {
                    self.merge_layer(layer);
                }
                self.check_assignable(arg, actual, expected);
            } else {
                self.check_expression(arg, expected)?;
            }
        }
        Ok(())
    }

    fn commit_call(&self, site: &CallSite<'_>, call: &ResolvedCall) -> ResolveResult<()> {
        self.record_call(site.node, site.role, call.clone());
        if site.role == CallRole::Direct && !site.delegating && call.callee.is_valid() {
            self.record_reference(site.node, call.callee);
        }
        if self.call_checkers.is_empty() || call.status != CallStatus::Success {
            return Ok(());
        }
        let scope = self.scope_at(site.node)?;
        let context = CallCheckerContext::new(self, site, scope);
        for checker in &self.call_checkers {
            checker.check(call, &context);
        }
        Ok(())
    }

    /// Calls on a `dynamic` receiver are not resolved.
    pub(crate) fn complete_dynamic_call(
        &self,
        site: &CallSite<'_>,
        receiver: TypeId,
        args: &mut ArgumentTypes,
    ) -> ResolveResult<TypeId> {
        self.type_arguments_without_candidate(site, args)?;
        let dynamic = self.builtins().dynamic_type()?;
        let call = ResolvedCall {
            callee: DefId::INVALID,
            status: CallStatus::Dynamic,
            type_arguments: Vec::new(),
            receiver_type: Some(receiver),
            return_type: dynamic,
            argument_map: (0..site.args.len()).collect(),
            safe: site.safe,
        };
        self.record_call(site.node, site.role, call);
        Ok(dynamic)
    }

    // =========================================================================
    // Failures
    // =========================================================================

    pub(crate) fn report_ambiguity(
        &self,
        site: &CallSite<'_>,
        evaluations: &[Evaluation],
        tied: &[usize],
        args: &mut ArgumentTypes,
    ) -> ResolveResult<TypeId> {
        let signatures: Vec<String> = tied
            .iter()
            .map(|&i| self.render_signature(site, &evaluations[i]))
            .collect();
        debug!(callee = self.text(site.callee), candidates = ?signatures, "ambiguous call");
        let mut diagnostic = self.diagnostic(
            DiagnosticKind::AmbiguousCall,
            site.node,
            site.callee_span,
            &[&signatures.join(", ")],
        );
        for (&i, signature) in tied.iter().zip(signatures) {
            let candidate = &evaluations[i].candidate;
            let Some(node) = self.callee_declaration(&candidate.callee) else {
                continue;
            };
            let file = self
                .sources
                .file_of(node)
                .map(|f| f.name.clone())
                .unwrap_or_default();
            let span = self.sources.arena().name_span(node);
            diagnostic = diagnostic.with_related(
                candidate.callee.def(),
                file,
                span.start,
                span.len(),
                signature,
            );
        }
        self.emit(diagnostic);
        self.commit_preliminary(args);
        Ok(TypeId::ERROR)
    }

    pub(crate) fn report_inapplicable(
        &self,
        site: &CallSite<'_>,
        mut evaluated: Vec<Evaluation>,
        args: &mut ArgumentTypes,
    ) -> ResolveResult<TypeId> {
        let name = self.text(site.callee).to_string();
        if evaluated.len() > 1 {
            let signatures: Vec<String> = evaluated
                .iter()
                .map(|e| self.render_signature(site, e))
                .collect();
            let closest = evaluated
                .iter()
                .min_by_key(|e| {
                    (
                        e.mapping.is_none(),
                        e.signature.params.len().abs_diff(site.args.len()),
                    )
                })
                .map(|e| self.describe_failure(site, e))
                .unwrap_or_default();
            self.report_at(
                DiagnosticKind::NoApplicableCall,
                site.node,
                site.callee_span,
                &[&signatures.join(", "), &closest],
            );
            self.commit_preliminary(args);
            return Ok(TypeId::ERROR);
        }
        let Some(evaluation) = evaluated.pop() else {
            self.report_at(
                DiagnosticKind::UnresolvedReference,
                site.node,
                site.callee_span,
                &[&name],
            );
            self.commit_preliminary(args);
            return Ok(TypeId::ERROR);
        };
        self.report_candidate_failure(site, &evaluation, &name);
        self.commit_incomplete(site, &evaluation, args)
    }

    fn report_candidate_failure(
        &self,
        site: &CallSite<'_>,
        evaluation: &Evaluation,
        name: &str,
    ) {
        match &evaluation.applicability {
            Applicability::Applicable => {}
            Applicability::ArgumentMismatch {
                index,
                actual,
                expected,
            } => {
                let node = site.args.get(*index).copied().unwrap_or(site.node);
                self.report(
                    DiagnosticKind::TypeMismatch,
                    node,
                    &[&self.render_type(*actual), &self.render_type(*expected)],
                );
            }
            Applicability::TooManyArguments { first_extra } => {
                let node = site.args.get(*first_extra).copied().unwrap_or(site.node);
                self.report(
                    DiagnosticKind::TooManyArguments,
                    node,
                    &[&self.render_signature(site, evaluation)],
                );
            }
            Applicability::NoValueFor(param) => {
                let name = self.parameter_name(evaluation, *param);
                self.report(DiagnosticKind::NoValueForParameter, site.node, &[&name]);
            }
            Applicability::WrongTypeArgumentCount { expected, given } => {
                let node = site.type_args.first().copied().unwrap_or(site.node);
                self.report(
                    DiagnosticKind::WrongTypeArgumentCount,
                    node,
                    &[&expected.to_string(), name, &given.to_string()],
                );
            }
            Applicability::InferenceFailed(message) => {
                self.report_at(
                    DiagnosticKind::InferenceFailure,
                    site.node,
                    site.callee_span,
                    &[message],
                );
            }
            Applicability::ReceiverMismatch { actual, expected } => {
                self.report_at(
                    DiagnosticKind::TypeMismatch,
                    site.node,
                    site.callee_span,
                    &[&self.render_type(*actual), &self.render_type(*expected)],
                );
            }
        }
    }

    /// Resolve to the only candidate despite its errors so references and
    /// the return type survive.
    fn commit_incomplete(
        &self,
        site: &CallSite<'_>,
        evaluation: &Evaluation,
        args: &mut ArgumentTypes,
    ) -> ResolveResult<TypeId> {
        self.commit_preliminary(args);
        let candidate = &evaluation.candidate;
        let return_type = if evaluation.signature.type_parameters.is_empty() {
            self.candidate_return_type(candidate)?
        } else {
            TypeId::ERROR
        };
        let call = ResolvedCall {
            callee: candidate.callee.def(),
            status: CallStatus::Incomplete,
            type_arguments: Vec::new(),
            receiver_type: candidate.receiver_type(),
            return_type,
            argument_map: evaluation
                .mapping
                .as_ref()
                .map(|m| m.parameter_of.clone())
                .unwrap_or_default(),
            safe: site.safe,
        };
        self.commit_call(site, &call)?;
        Ok(self.safe_call_result(site, return_type))
    }

    fn describe_failure(&self, site: &CallSite<'_>, evaluation: &Evaluation) -> String {
        match &evaluation.applicability {
            Applicability::Applicable => "it is applicable".to_string(),
            Applicability::ArgumentMismatch {
                index,
                actual,
                expected,
            } => format!(
                "argument {} has type {} but {} was expected",
                index + 1,
                self.render_type(*actual),
                self.render_type(*expected)
            ),
            Applicability::TooManyArguments { .. } => format!(
                "too many arguments, {} given",
                site.args.len()
            ),
            Applicability::NoValueFor(param) => format!(
                "no value passed for parameter '{}'",
                self.parameter_name(evaluation, *param)
            ),
            Applicability::WrongTypeArgumentCount { expected, given } => {
                format!("{expected} type arguments expected, but {given} were given")
            }
            Applicability::InferenceFailed(message) => format!("type inference failed: {message}"),
            Applicability::ReceiverMismatch { actual, expected } => format!(
                "receiver of type {} does not match {}",
                self.render_type(*actual),
                self.render_type(*expected)
            ),
        }
    }

    fn parameter_name(&self, evaluation: &Evaluation, param: usize) -> String {
        match evaluation.signature.params.get(param).and_then(|p| p.name) {
            Some(name) => self.text(name).to_string(),
            None => format!("p{}", param + 1),
        }
    }

    /// `name(T1, T2)` with class type arguments substituted.
    pub(crate) fn render_signature(&self, site: &CallSite<'_>, evaluation: &Evaluation) -> String {
        let params: Vec<String> = evaluation
            .signature
            .params
            .iter()
            .map(|p| {
                let ty = self.render_type(p.ty);
                if p.vararg { format!("vararg {ty}") } else { ty }
            })
            .collect();
        format!("{}({})", self.text(site.callee), params.join(", "))
    }

    fn callee_declaration(&self, callee: &Callee) -> Option<NodeIndex> {
        match callee {
            Callee::Function(function) => Some(function.node),
            Callee::AliasConstructor { alias, .. } => Some(alias.node),
            Callee::Invoke { value, .. } => self.descriptor_by_def(*value).map(|d| d.node()),
        }
    }
}
